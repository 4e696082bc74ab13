use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use hivealert_rules::{stringify, CustomFieldConfig, FieldPath, RuleConfig};
use serde::Serialize;
use serde_json::{Number, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::document::{AlertDocument, Artifact, CustomField, MatchRecord};
use crate::error::AlertError;
use crate::request::{HiveRequest, TransportOptions};
use crate::text::{create_alert_body, create_title};

/// Alerter that posts matches to TheHive as alerts.
///
/// The rule is read-only after construction and the HTTP client is built once
/// from the connection settings, so a single instance can serve concurrent
/// callers.
#[derive(Clone)]
pub struct HiveAlerter {
    rule: RuleConfig,
    transport: TransportOptions,
    http: reqwest::Client,
}

/// Summary returned by [`HiveAlerter::get_info`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlerterInfo {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub hive_host: String,
}

impl HiveAlerter {
    pub const TYPE: &'static str = "hivealerter";

    pub fn new(rule: RuleConfig) -> Result<Self, AlertError> {
        let transport = TransportOptions::from_connection(&rule.hive_connection);
        let http = transport.build_client()?;
        Ok(Self {
            rule,
            transport,
            http,
        })
    }

    pub fn rule(&self) -> &RuleConfig {
        &self.rule
    }

    pub fn get_info(&self) -> AlerterInfo {
        AlerterInfo {
            kind: Self::TYPE,
            hive_host: self.rule.hive_connection.hive_host.clone(),
        }
    }

    /// Builds the alert document for `matches`. The first match drives the
    /// title, description and custom fields; every match contributes tags
    /// and artifacts.
    pub fn build_document(&self, matches: &[MatchRecord]) -> Result<AlertDocument, AlertError> {
        let first = matches.first().ok_or(AlertError::NoMatches)?;
        let config = &self.rule.hive_alert_config;

        let mut tags = Vec::new();
        let mut seen = HashSet::new();
        let mut artifacts = Vec::new();
        for record in matches {
            for tag in self.load_tags(record) {
                if seen.insert(tag.clone()) {
                    tags.push(tag);
                }
            }
            artifacts.extend(self.load_observable_artifacts(record));
        }

        Ok(AlertDocument {
            title: create_title(&self.rule, first),
            description: create_alert_body(&self.rule, first),
            severity: config.severity,
            tags,
            tlp: config.tlp,
            status: config.status.clone(),
            source: config.source.clone(),
            kind: config.kind.clone(),
            follow: config.follow,
            date: Utc::now().timestamp() * 1000,
            source_ref: Uuid::new_v4().to_string()[..6].to_string(),
            custom_fields: self.load_custom_fields(first),
            artifacts,
            extra: config.extra.clone(),
        })
    }

    /// Computes the outbound request without sending it.
    pub fn prepare(&self, matches: &[MatchRecord]) -> Result<HiveRequest, AlertError> {
        let body = self.build_document(matches)?.to_json()?;
        let connection = &self.rule.hive_connection;

        Ok(HiveRequest {
            url: connection.alert_url(),
            headers: HiveRequest::headers_for(&connection.hive_apikey),
            transport: self.transport.clone(),
            body,
        })
    }

    /// Builds the alert for `matches` and posts it to TheHive. Transport
    /// failures come back as [`AlertError::Transport`] carrying the
    /// `reqwest::Error` as-is; nothing is retried.
    pub async fn alert(&self, matches: &[MatchRecord]) -> Result<(), AlertError> {
        let request = self.prepare(matches)?;
        self.send(&request).await
    }

    pub async fn send(&self, request: &HiveRequest) -> Result<(), AlertError> {
        let mut builder = self.http.post(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }

        builder
            .body(request.body.clone())
            .send()
            .await?
            .error_for_status()?;

        info!(rule = %self.rule.name, url = %request.url, "alert sent to TheHive");
        Ok(())
    }

    fn load_tags(&self, record: &MatchRecord) -> Vec<String> {
        let mut values = Vec::new();
        for tag in &self.rule.hive_alert_config.tags {
            match FieldPath::from(tag.as_str()).resolve(record) {
                Some(Value::Array(items)) => values.extend(items.iter().map(stringify)),
                Some(value) => values.push(stringify(value)),
                None => values.push(tag.clone()),
            }
        }
        values
    }

    fn load_observable_artifacts(&self, record: &MatchRecord) -> Vec<Artifact> {
        let tlp = self.rule.hive_alert_config.tlp - 1;
        let mut artifacts = Vec::new();
        for mapping in &self.rule.hive_observable_data_mapping {
            for (data_type, path) in mapping.entries() {
                let Some(data) = path.resolve(record) else {
                    debug!(data_type, path = %path, "observable path not present in match");
                    continue;
                };
                artifacts.push(Artifact {
                    data: stringify(data),
                    data_type: data_type.to_string(),
                    message: None,
                    tags: Vec::new(),
                    tlp,
                });
            }
        }
        artifacts
    }

    fn load_custom_fields(&self, record: &MatchRecord) -> BTreeMap<String, CustomField> {
        let mut fields = BTreeMap::new();
        for (order, field) in self.rule.hive_alert_config.custom_fields.iter().enumerate() {
            let Some(raw) = custom_field_value(field, record) else {
                debug!(field = %field.name, "custom field value not present in match");
                continue;
            };
            let Some(value) = coerce(&field.kind, raw) else {
                warn!(field = %field.name, kind = %field.kind, "custom field value does not fit its type");
                continue;
            };
            fields.insert(
                field.name.clone(),
                CustomField {
                    kind: field.kind.clone(),
                    value,
                    order,
                },
            );
        }
        fields
    }
}

fn custom_field_value<'a>(field: &'a CustomFieldConfig, record: &'a Value) -> Option<&'a Value> {
    match &field.value {
        Value::String(path) => FieldPath::from(path.as_str()).resolve(record),
        Value::Null => None,
        literal => Some(literal),
    }
}

/// Converts a resolved value into the representation TheHive expects for the
/// custom field type. `None` when it cannot be represented.
fn coerce(kind: &str, value: &Value) -> Option<Value> {
    match kind {
        "string" => Some(Value::String(stringify(value))),
        "integer" | "date" => as_i64(value).map(Value::from),
        "float" | "number" => as_f64(value)
            .and_then(Number::from_f64)
            .map(Value::Number),
        "boolean" => match value {
            Value::Bool(flag) => Some(Value::Bool(*flag)),
            Value::String(text) => text.trim().to_ascii_lowercase().parse().ok().map(Value::Bool),
            _ => None,
        },
        _ => Some(value.clone()),
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Value::String(text) => text.trim().parse().ok(),
        Value::Bool(flag) => Some(i64::from(*flag)),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hivealert_rules::parse_rule;
    use serde_json::json;

    const RULE: &str = r#"
name: test-thehive
alert_text: ''
alert_text_type: alert_text_only
hive_connection:
  hive_apikey: ''
  hive_host: https://localhost
  hive_port: 9000
hive_alert_config:
  customFields:
    - {name: test, type: string, value: test.ip}
  follow: true
  severity: 2
  source: elastalert
  status: New
  tags: ['test.port']
  tlp: 3
  type: external
hive_observable_data_mapping:
  - ip: test.ip
"#;

    fn alerter() -> HiveAlerter {
        HiveAlerter::new(parse_rule(RULE, "test.yaml").expect("rule")).expect("alerter")
    }

    fn without_generated(mut value: Value) -> Value {
        let map = value.as_object_mut().expect("object");
        assert!(map.remove("date").and_then(|d| d.as_i64()).is_some());
        assert_eq!(
            map.remove("sourceRef").and_then(|s| s.as_str().map(str::len)),
            Some(6)
        );
        value
    }

    #[test]
    fn builds_expected_document() {
        let record = json!({
            "test": {"ip": "127.0.0.1", "port": 9876},
            "@timestamp": "2021-05-09T14:43:30",
        });
        let document = alerter().build_document(&[record]).expect("document");
        let actual = without_generated(document.to_value().expect("value"));

        assert_eq!(
            actual,
            json!({
                "artifacts": [
                    {"data": "127.0.0.1", "dataType": "ip", "message": null, "tags": [], "tlp": 2}
                ],
                "customFields": {"test": {"order": 0, "string": "127.0.0.1"}},
                "description": "\n\n",
                "follow": true,
                "severity": 2,
                "source": "elastalert",
                "status": "New",
                "tags": ["9876"],
                "title": "test-thehive",
                "tlp": 3,
                "type": "external"
            })
        );
    }

    #[test]
    fn unresolved_paths_are_skipped_or_passed_through() {
        let record = json!({"@timestamp": "2021-01-01T00:00:00", "somefield": "foobarbaz"});
        let document = alerter().build_document(&[record]).expect("document");

        assert!(document.artifacts.is_empty());
        assert!(document.custom_fields.is_empty());
        assert_eq!(document.tags, vec!["test.port".to_string()]);
    }

    #[test]
    fn empty_match_list_is_rejected() {
        assert!(matches!(
            alerter().build_document(&[]),
            Err(AlertError::NoMatches)
        ));
    }

    #[test]
    fn every_match_contributes_tags_and_artifacts() {
        let mut rule = parse_rule(RULE, "test.yaml").expect("rule");
        rule.hive_alert_config.tags = vec!["test.port".into(), "labels".into(), "static".into()];
        let alerter = HiveAlerter::new(rule).expect("alerter");

        let matches = vec![
            json!({"test": {"ip": "10.0.0.1", "port": 22}, "labels": ["a", "b"]}),
            json!({"test": {"ip": "10.0.0.2", "port": 22}, "labels": ["b", "c"]}),
            json!({"other": true}),
        ];
        let document = alerter.build_document(&matches).expect("document");

        assert_eq!(document.tags, vec!["22", "a", "b", "static", "c", "test.port", "labels"]);
        let data: Vec<_> = document.artifacts.iter().map(|a| a.data.as_str()).collect();
        assert_eq!(data, vec!["10.0.0.1", "10.0.0.2"]);
        assert!(document.artifacts.iter().all(|a| a.tlp == 2));
        assert_eq!(document.custom_fields["test"].value, json!("10.0.0.1"));
    }

    #[test]
    fn artifact_tlp_is_not_floored() {
        let mut rule = parse_rule(RULE, "test.yaml").expect("rule");
        rule.hive_alert_config.tlp = 0;
        let alerter = HiveAlerter::new(rule).expect("alerter");

        let document = alerter
            .build_document(&[json!({"test": {"ip": "127.0.0.1"}})])
            .expect("document");

        assert_eq!(document.tlp, 0);
        assert_eq!(document.artifacts.len(), 1);
        assert_eq!(document.artifacts[0].tlp, -1);
    }

    #[test]
    fn custom_field_order_follows_configuration() {
        let mut rule = parse_rule(RULE, "test.yaml").expect("rule");
        rule.hive_alert_config.custom_fields = serde_yaml::from_str(
            r#"
- {name: missing, type: string, value: nope}
- {name: port, type: integer, value: test.port}
- {name: score, type: float, value: test.score}
- {name: seen, type: boolean, value: "test.seen"}
- {name: team, type: string, value: 42}
- {name: bad, type: integer, value: test.ip}
"#,
        )
        .expect("custom fields");
        let alerter = HiveAlerter::new(rule).expect("alerter");

        let record = json!({"test": {"ip": "127.0.0.1", "port": "9876", "score": 1.5, "seen": "TRUE"}});
        let fields = alerter.build_document(&[record]).expect("document").custom_fields;

        assert!(!fields.contains_key("missing"));
        assert!(!fields.contains_key("bad"));
        assert_eq!(fields["port"].value, json!(9876));
        assert_eq!(fields["port"].order, 1);
        assert_eq!(fields["score"].value, json!(1.5));
        assert_eq!(fields["score"].order, 2);
        assert_eq!(fields["seen"].value, json!(true));
        assert_eq!(fields["team"].value, json!("42"));
        assert_eq!(fields["team"].order, 4);
    }

    #[test]
    fn prepare_targets_alert_endpoint_without_verification() {
        let request = alerter()
            .prepare(&[json!({"test": {"ip": "127.0.0.1"}})])
            .expect("request");

        assert_eq!(request.url, "https://localhost:9000/api/alert");
        assert_eq!(request.headers["Authorization"], "Bearer ");
        assert_eq!(request.headers["Content-Type"], "application/json");
        assert!(!request.transport.verify_tls);
        assert!(request.transport.proxies.http.is_empty());
        assert!(request.transport.proxies.https.is_empty());

        let body: Value = serde_json::from_str(&request.body).expect("json body");
        assert_eq!(body["title"], json!("test-thehive"));
    }

    #[test]
    fn get_info_reports_configured_host() {
        for host in ["https://localhost", ""] {
            let mut rule = parse_rule(RULE, "test.yaml").expect("rule");
            rule.hive_connection.hive_host = host.to_string();
            let info = HiveAlerter::new(rule).expect("alerter").get_info();
            assert_eq!(
                serde_json::to_value(&info).expect("info"),
                json!({"type": "hivealerter", "hive_host": host})
            );
        }
    }
}
