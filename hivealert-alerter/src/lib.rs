//! TheHive alerter: turns rule matches into TheHive alerts.

pub mod alerter;
pub mod document;
pub mod error;
pub mod request;
pub mod text;

pub use alerter::{AlerterInfo, HiveAlerter};
pub use document::{AlertDocument, Artifact, CustomField, MatchRecord};
pub use error::AlertError;
pub use request::{HiveRequest, TransportOptions};
