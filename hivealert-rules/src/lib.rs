//! Rule configuration for the TheHive alerter.
//!
//! Rules are YAML/JSON documents describing how a matched event turns into a
//! TheHive alert: the connection to use, the alert template and the mapping
//! from match fields to observables. Field references inside a rule are plain
//! dot-paths resolved with [`FieldPath`].

mod error;
mod field_path;
mod loader;
mod rule;

pub use error::RuleError;
pub use field_path::{stringify, FieldPath};
pub use loader::{load_rule, parse_rule};
pub use rule::{
    AlertTextType, CustomFieldConfig, HiveAlertConfig, HiveConnection, HiveProxies,
    ObservableMapping, RuleConfig,
};
