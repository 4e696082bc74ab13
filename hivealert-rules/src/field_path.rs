use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Dot separated path used to address a field inside a match record.
///
/// `"test.ip"` walks `record["test"]["ip"]`; numeric segments index into
/// arrays. A key that literally contains dots (`"source.ip"` stored flat) is
/// tried as a whole before the path is split.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|segment| !segment.is_empty())
    }

    /// Returns the value at this path, or `None` when any segment is missing
    /// or the value found is `null`. A literal key holding `null` does not
    /// shadow the nested path.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        if self.0.is_empty() {
            return None;
        }

        let literal = root.as_object().and_then(|map| map.get(&self.0));
        if let Some(value) = literal.and_then(non_null) {
            return Some(value);
        }

        let mut current = root;
        for segment in self.segments() {
            match current {
                Value::Object(map) => match map.get(segment) {
                    Some(value) => current = value,
                    None => return None,
                },
                Value::Array(items) => {
                    let index: usize = segment.parse().ok()?;
                    current = items.get(index)?;
                }
                _ => return None,
            }
        }
        non_null(current)
    }
}

fn non_null(value: &Value) -> Option<&Value> {
    if value.is_null() {
        None
    } else {
        Some(value)
    }
}

impl From<&str> for FieldPath {
    fn from(value: &str) -> Self {
        FieldPath::new(value)
    }
}

impl From<String> for FieldPath {
    fn from(value: String) -> Self {
        FieldPath::new(value)
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders a JSON value the way it should appear inside alert text and tags:
/// strings without quotes, everything else as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
