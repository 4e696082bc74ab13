//! Alert title and body rendering.

use std::collections::BTreeMap;

use hivealert_rules::{stringify, AlertTextType, FieldPath, RuleConfig};
use serde_json::Value;

use crate::document::to_pretty_json;

/// Title for the alert: the formatted `alert_subject`, or the rule name.
pub fn create_title(rule: &RuleConfig, first_match: &Value) -> String {
    let Some(subject) = &rule.alert_subject else {
        return rule.name.clone();
    };

    let args = resolve_args(rule, &rule.alert_subject_args, first_match);
    let mut title = format_template(subject, &args, &BTreeMap::new());
    if let Some(max_len) = rule.alert_subject_max_len {
        if let Some((cut, _)) = title.char_indices().nth(max_len) {
            title.truncate(cut);
        }
    }
    title
}

/// Body for the alert rendered against a single match.
pub fn create_alert_body(rule: &RuleConfig, first_match: &Value) -> String {
    if rule.alert_text_type == AlertTextType::AggregationSummaryOnly {
        return String::new();
    }

    let mut text = String::new();
    match &rule.alert_text {
        None => {
            text.push_str(&rule.name);
            text.push_str("\n\n");
        }
        Some(template) => {
            let args = resolve_args(rule, &rule.alert_text_args, first_match);
            let kwargs: BTreeMap<String, String> = rule
                .alert_text_kw
                .iter()
                .map(|(path, name)| (name.clone(), resolve_arg(rule, path, first_match)))
                .collect();
            text.push_str(&format_template(template, &args, &kwargs));
        }
    }
    ensure_blank_line(&mut text);

    if rule.alert_text_type.includes_match_fields() {
        push_match_items(&mut text, first_match);
    }

    text
}

fn resolve_args(rule: &RuleConfig, paths: &[FieldPath], record: &Value) -> Vec<String> {
    paths
        .iter()
        .map(|path| resolve_arg(rule, path, record))
        .collect()
}

fn resolve_arg(rule: &RuleConfig, path: &FieldPath, record: &Value) -> String {
    path.resolve(record)
        .map(stringify)
        .unwrap_or_else(|| rule.missing_value().to_string())
}

fn ensure_blank_line(text: &mut String) {
    while !text.ends_with("\n\n") {
        text.push('\n');
    }
}

fn push_match_items(text: &mut String, record: &Value) {
    let Some(fields) = record.as_object() else {
        return;
    };

    let sorted: BTreeMap<&String, &Value> = fields.iter().collect();
    for (key, value) in sorted {
        if key.starts_with("top_events_") {
            continue;
        }
        let rendered = match value {
            Value::Object(_) | Value::Array(_) => {
                to_pretty_json(value).unwrap_or_else(|_| value.to_string())
            }
            other => stringify(other),
        };
        text.push_str(key);
        text.push_str(": ");
        text.push_str(&rendered);
        text.push('\n');
    }
}

/// Fills `{}`, `{0}` and `{name}` placeholders. Anything after `:` or `!`
/// inside a placeholder is ignored, `{{`/`}}` are literal braces and an
/// unknown placeholder is left as written.
pub fn format_template(
    template: &str,
    args: &[String],
    kwargs: &BTreeMap<String, String>,
) -> String {
    let mut output = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut next_auto = 0usize;

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                output.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                output.push('}');
            }
            '{' => {
                let mut field = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    field.push(inner);
                }
                if !closed {
                    output.push('{');
                    output.push_str(&field);
                    break;
                }

                let name = field
                    .split(|c| c == ':' || c == '!')
                    .next()
                    .unwrap_or_default()
                    .trim();
                let replacement = if name.is_empty() {
                    let value = args.get(next_auto);
                    next_auto += 1;
                    value
                } else if let Ok(index) = name.parse::<usize>() {
                    args.get(index)
                } else {
                    kwargs.get(name)
                };

                match replacement {
                    Some(value) => output.push_str(value),
                    None => {
                        output.push('{');
                        output.push_str(&field);
                        output.push('}');
                    }
                }
            }
            other => output.push(other),
        }
    }

    output
}
