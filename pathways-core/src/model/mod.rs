//! Content model
//!
//! Content files are parsed into a [`serde_yaml::Value`] regardless of their
//! on-disk format so the validator walks one document shape. JSON is a
//! subset of YAML's data model, so nothing is lost in the conversion.

pub mod block;
pub mod kind;
pub mod questionnaire;

pub use block::TreeStats;
pub use kind::{Classified, ContentKind, Format};
pub use questionnaire::QuestionType;

use serde_yaml::Value;

/// Parse a document, returning the parser's message on failure.
///
/// YAML mappings with duplicate keys are rejected by the parser.
pub fn parse_document(source: &str, format: Format) -> Result<Value, String> {
    match format {
        Format::Yaml => serde_yaml::from_str::<Value>(source).map_err(|e| e.to_string()),
        Format::Json => {
            let json: serde_json::Value = serde_json::from_str(source).map_err(|e| e.to_string())?;
            serde_yaml::to_value(json).map_err(|e| e.to_string())
        }
    }
}

/// Human-readable form of a mapping key.
pub fn key_label(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => "<complex key>".to_string(),
    }
}

/// Look up a field, treating an explicit `null` as absent.
pub fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    value.get(name).filter(|v| !v.is_null())
}
