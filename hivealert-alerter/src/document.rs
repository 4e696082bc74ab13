use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

/// One matched event: an arbitrary JSON object.
pub type MatchRecord = Value;

/// Keys computed from the matches. Passthrough config keys never replace them.
const COMPUTED_KEYS: [&str; 3] = ["artifacts", "customFields", "tags"];

/// Alert body accepted by TheHive's `POST /api/alert`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AlertDocument {
    pub title: String,
    pub description: String,
    pub severity: u8,
    pub tags: Vec<String>,
    pub tlp: i64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub follow: bool,
    /// Epoch milliseconds.
    pub date: i64,
    #[serde(rename = "sourceRef")]
    pub source_ref: String,
    #[serde(rename = "customFields")]
    pub custom_fields: BTreeMap<String, CustomField>,
    pub artifacts: Vec<Artifact>,
    /// Extra keys from `hive_alert_config`, merged in by [`AlertDocument::to_value`].
    #[serde(skip)]
    pub extra: Map<String, Value>,
}

impl AlertDocument {
    /// The document as a JSON object with passthrough keys applied.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            for (key, extra) in &self.extra {
                if COMPUTED_KEYS.contains(&key.as_str()) {
                    continue;
                }
                map.insert(key.clone(), extra.clone());
            }
        }
        Ok(value)
    }

    /// Request body: keys sorted, four space indentation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        to_pretty_json(&self.to_value()?)
    }
}

/// Pretty prints `value` with sorted keys and four space indentation.
pub(crate) fn to_pretty_json(value: &Value) -> Result<String, serde_json::Error> {
    let value = sort_keys(value.clone());
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only emits valid UTF-8.
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(key, value)| (key, sort_keys(value)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Custom field entry, serialized as `{"<type>": value, "order": n}`.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomField {
    pub kind: String,
    pub value: Value,
    pub order: usize,
}

impl Serialize for CustomField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(&self.kind, &self.value)?;
        map.serialize_entry("order", &self.order)?;
        map.end()
    }
}

/// Observable attached to the alert.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Artifact {
    pub data: String,
    #[serde(rename = "dataType")]
    pub data_type: String,
    pub message: Option<String>,
    pub tags: Vec<String>,
    pub tlp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> AlertDocument {
        let mut custom_fields = BTreeMap::new();
        custom_fields.insert(
            "test".to_string(),
            CustomField {
                kind: "string".into(),
                value: json!("127.0.0.1"),
                order: 0,
            },
        );
        AlertDocument {
            title: "rule".into(),
            description: "\n\n".into(),
            severity: 2,
            tags: vec!["9876".into()],
            tlp: 3,
            status: "New".into(),
            source: Some("elastalert".into()),
            kind: None,
            follow: true,
            date: 1_620_571_410_000,
            source_ref: "abcdef".into(),
            custom_fields,
            artifacts: vec![Artifact {
                data: "127.0.0.1".into(),
                data_type: "ip".into(),
                message: None,
                tags: vec![],
                tlp: 2,
            }],
            extra: Map::new(),
        }
    }

    #[test]
    fn serializes_wire_field_names() {
        let value = document().to_value().expect("serializes");
        assert_eq!(value["customFields"], json!({"test": {"string": "127.0.0.1", "order": 0}}));
        assert_eq!(value["sourceRef"], json!("abcdef"));
        assert_eq!(
            value["artifacts"][0],
            json!({"data": "127.0.0.1", "dataType": "ip", "message": null, "tags": [], "tlp": 2})
        );
        assert!(value.get("type").is_none());
        assert!(value.get("extra").is_none());
    }

    #[test]
    fn passthrough_keys_override_all_but_artifacts_custom_fields_and_tags() {
        let mut doc = document();
        doc.extra.insert("caseTemplate".into(), json!("phishing"));
        doc.extra.insert("title".into(), json!("override"));
        doc.extra.insert("artifacts".into(), json!([]));
        doc.extra.insert("customFields".into(), json!({}));
        doc.extra.insert("tags".into(), json!(["replaced"]));

        let value = doc.to_value().expect("serializes");
        assert_eq!(value["caseTemplate"], json!("phishing"));
        assert_eq!(value["title"], json!("override"));
        assert_eq!(value["artifacts"].as_array().map(Vec::len), Some(1));
        assert_eq!(value["customFields"]["test"]["order"], json!(0));
        assert_eq!(value["tags"], json!(["9876"]));
    }

    #[test]
    fn body_is_indented_with_sorted_keys() {
        let body = document().to_json().expect("serializes");
        assert!(body.starts_with("{\n    \"artifacts\""));
        let artifacts = body.find("\"artifacts\"").expect("artifacts key");
        let title = body.find("\"title\"").expect("title key");
        assert!(artifacts < title);
    }
}
