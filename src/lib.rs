//! hivealert: TheHive alert dispatch for rule matches.
//!
//! The workspace is split the same way the data flows:
//!
//! * `hivealert-rules`: typed rule configuration and dot-path field lookup
//! * `hivealert-alerter`: alert document construction and HTTP submission
//! * `hivealert-core`: shared error and logging setup
//!
//! This crate re-exports the pieces most callers need.

pub use hivealert_alerter::{
    AlertDocument, AlertError, AlerterInfo, Artifact, CustomField, HiveAlerter, HiveRequest,
    MatchRecord, TransportOptions,
};
pub use hivealert_core::{init_tracing, CoreError};
pub use hivealert_rules::{
    load_rule, parse_rule, AlertTextType, CustomFieldConfig, FieldPath,
    HiveAlertConfig, HiveConnection, HiveProxies, ObservableMapping, RuleConfig, RuleError,
};
