use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::field_path::FieldPath;

/// A rule as far as the TheHive alerter is concerned. Keys the alerter does
/// not use (`type`, `alert`, `filter`, ...) are ignored on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleConfig {
    /// Rule name, used as the alert title when no subject is configured.
    pub name: String,
    /// Body template.
    #[serde(default)]
    pub alert_text: Option<String>,
    #[serde(default)]
    pub alert_text_type: AlertTextType,
    /// Values for positional `{}` / `{0}` placeholders in `alert_text`.
    #[serde(default)]
    pub alert_text_args: Vec<FieldPath>,
    /// Field path to placeholder name for `{name}` placeholders.
    #[serde(default)]
    pub alert_text_kw: BTreeMap<FieldPath, String>,
    #[serde(default)]
    pub alert_subject: Option<String>,
    #[serde(default)]
    pub alert_subject_args: Vec<FieldPath>,
    /// Titles longer than this are truncated.
    #[serde(default)]
    pub alert_subject_max_len: Option<usize>,
    /// Placeholder text for template arguments that do not resolve.
    #[serde(default)]
    pub alert_missing_value: Option<String>,
    pub hive_connection: HiveConnection,
    pub hive_alert_config: HiveAlertConfig,
    #[serde(default)]
    pub hive_observable_data_mapping: Vec<ObservableMapping>,
}

impl RuleConfig {
    pub const DEFAULT_MISSING_VALUE: &'static str = "<MISSING VALUE>";

    pub fn missing_value(&self) -> &str {
        self.alert_missing_value
            .as_deref()
            .unwrap_or(Self::DEFAULT_MISSING_VALUE)
    }
}

/// Controls which sections the alert body includes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertTextType {
    AlertTextOnly,
    ExcludeFields,
    AggregationSummaryOnly,
    /// Custom text followed by every field of the match. Also used for
    /// text types this alerter does not know.
    #[default]
    #[serde(other)]
    Full,
}

impl AlertTextType {
    pub fn includes_match_fields(self) -> bool {
        matches!(self, AlertTextType::Full)
    }
}

/// Where and how to reach TheHive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HiveConnection {
    #[serde(default = "HiveConnection::default_host")]
    pub hive_host: String,
    #[serde(default = "HiveConnection::default_port")]
    pub hive_port: u16,
    #[serde(default)]
    pub hive_apikey: String,
    #[serde(default)]
    pub hive_proxies: HiveProxies,
    /// Verify the server certificate. Off unless explicitly enabled.
    #[serde(default)]
    pub hive_verify: bool,
}

impl HiveConnection {
    pub fn default_host() -> String {
        "http://localhost".to_string()
    }

    pub fn default_port() -> u16 {
        9000
    }

    /// `{host}:{port}/api/alert`, formatted verbatim.
    pub fn alert_url(&self) -> String {
        format!("{}:{}/api/alert", self.hive_host, self.hive_port)
    }
}

impl Default for HiveConnection {
    fn default() -> Self {
        Self {
            hive_host: Self::default_host(),
            hive_port: Self::default_port(),
            hive_apikey: String::new(),
            hive_proxies: HiveProxies::default(),
            hive_verify: false,
        }
    }
}

/// Proxy URLs per scheme. Empty strings mean "connect directly", which also
/// overrides any proxy configured in the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HiveProxies {
    #[serde(default)]
    pub http: String,
    #[serde(default)]
    pub https: String,
}

impl HiveProxies {
    pub fn is_empty(&self) -> bool {
        self.http.is_empty() && self.https.is_empty()
    }
}

/// Template for the alert document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HiveAlertConfig {
    #[serde(default = "HiveAlertConfig::default_severity")]
    pub severity: u8,
    #[serde(default = "HiveAlertConfig::default_tlp")]
    pub tlp: i64,
    #[serde(default = "HiveAlertConfig::default_status")]
    pub status: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default = "HiveAlertConfig::default_follow")]
    pub follow: bool,
    /// Literal tags or field paths into the match.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "customFields")]
    pub custom_fields: Vec<CustomFieldConfig>,
    /// Any other keys are copied onto the alert document as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HiveAlertConfig {
    pub fn default_severity() -> u8 {
        2
    }

    pub fn default_tlp() -> i64 {
        2
    }

    pub fn default_status() -> String {
        "New".to_string()
    }

    pub fn default_follow() -> bool {
        true
    }
}

impl Default for HiveAlertConfig {
    fn default() -> Self {
        Self {
            severity: Self::default_severity(),
            tlp: Self::default_tlp(),
            status: Self::default_status(),
            source: None,
            kind: None,
            follow: Self::default_follow(),
            tags: Vec::new(),
            custom_fields: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// One TheHive custom field. A string `value` is a field path into the match;
/// any other JSON value is used literally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomFieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Value,
}

/// Observable type to field path, e.g. `{ip: src.ip}`. Usually a single entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ObservableMapping(BTreeMap<String, FieldPath>);

impl ObservableMapping {
    pub fn entries(&self) -> impl Iterator<Item = (&str, &FieldPath)> {
        self.0.iter().map(|(data_type, path)| (data_type.as_str(), path))
    }
}
