//! Rule-set JSON decoding.
//!
//! Supported inputs:
//! - A JSON array of rule objects: `[{"Column Name":"Email","Validation Type":"REQUIRED"}]`
//! - A stored data dictionary object: `{"name":"Customers","rules_json":[...]}`. The rule list may
//!   also be given as `rules`, and either key may hold the array itself or a string containing it.
//!
//! Object fields become [`RuleRecord`] entries; nested arrays/objects are kept as their JSON text.

use std::fs;
use std::path::Path;

use crate::error::{ValidationError, ValidationResult};
use crate::rules::{DataDictionary, RuleRecord};
use crate::types::Value;

const RULE_KEYS: [&str; 2] = ["rules_json", "rules"];
const HEADER_KEYS: [&str; 2] = ["source_headers_json", "sourceHeaders"];

/// Decode a data dictionary from a JSON file.
pub fn load_data_dictionary_from_path(path: impl AsRef<Path>) -> ValidationResult<DataDictionary> {
    let text = fs::read_to_string(path)?;
    parse_data_dictionary_json(&text)
}

/// Decode a bare JSON array of rule records.
pub fn parse_rule_records_json(input: &str) -> ValidationResult<Vec<RuleRecord>> {
    let v: serde_json::Value = serde_json::from_str(input.trim())?;
    rule_records_from_json(&v)
}

/// Decode either a stored data dictionary object or a bare rule array.
///
/// A bare array yields an unnamed dictionary with no source headers.
pub fn parse_data_dictionary_json(input: &str) -> ValidationResult<DataDictionary> {
    let v: serde_json::Value = serde_json::from_str(input.trim())?;
    match &v {
        serde_json::Value::Array(_) => Ok(DataDictionary {
            name: None,
            rules: rule_records_from_json(&v)?,
            source_headers: Vec::new(),
        }),
        serde_json::Value::Object(obj) => {
            let name = obj
                .get("name")
                .and_then(|n| n.as_str())
                .map(str::to_string);

            let rules_payload = first_present(obj, &RULE_KEYS).ok_or_else(|| {
                ValidationError::RuleSet {
                    message: "data dictionary has no `rules_json` or `rules` field".to_string(),
                }
            })?;
            let rules = rule_records_from_json(&unwrap_embedded(rules_payload)?)?;

            let source_headers = match first_present(obj, &HEADER_KEYS) {
                Some(h) => header_list(&unwrap_embedded(h)?),
                None => Vec::new(),
            };

            if rules.is_empty() {
                tracing::warn!(dictionary = ?name, "data dictionary contains no rules");
            }
            Ok(DataDictionary {
                name,
                rules,
                source_headers,
            })
        }
        _ => Err(ValidationError::RuleSet {
            message: "rule set json must be an array or a data dictionary object".to_string(),
        }),
    }
}

/// Convert a JSON array of objects into rule records.
pub fn rule_records_from_json(v: &serde_json::Value) -> ValidationResult<Vec<RuleRecord>> {
    let items = v.as_array().ok_or_else(|| ValidationError::RuleSet {
        message: "rule list is not a json array".to_string(),
    })?;

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let obj = item.as_object().ok_or_else(|| ValidationError::RuleSet {
                message: format!("rule {} is not a json object", idx + 1),
            })?;
            Ok(obj
                .iter()
                .map(|(k, jv)| (k.clone(), convert_json_value(jv)))
                .collect())
        })
        .collect()
}

fn first_present<'a>(
    obj: &'a serde_json::Map<String, serde_json::Value>,
    keys: &[&str],
) -> Option<&'a serde_json::Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Stored dictionaries sometimes keep their arrays as JSON text.
fn unwrap_embedded(v: &serde_json::Value) -> ValidationResult<serde_json::Value> {
    match v {
        serde_json::Value::String(s) => Ok(serde_json::from_str(s)?),
        other => Ok(other.clone()),
    }
}

fn header_list(v: &serde_json::Value) -> Vec<String> {
    v.as_array()
        .map(|items| {
            items
                .iter()
                .map(|h| convert_json_value(h).to_text().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

fn convert_json_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
        serde_json::Value::String(s) => Value::Utf8(s.clone()),
        other => Value::Utf8(other.to_string()),
    }
}
