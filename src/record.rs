use serde_json::Value;
use std::collections::BTreeMap;

use crate::sink::SinkError;

/// A single dynamically-typed value of a decoded record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i128),
    Float(f64),
    String(String),
    /// Anything else (bool, null, arrays, objects).
    Other(Value),
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => FieldValue::String(s),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Integer(i as i128)
                } else if let Some(u) = n.as_u64() {
                    FieldValue::Integer(u as i128)
                } else {
                    match n.as_f64() {
                        Some(f) => FieldValue::Float(f),
                        None => FieldValue::Other(Value::Number(n)),
                    }
                }
            }
            other => FieldValue::Other(other),
        }
    }
}

/// One decoded log record: every top-level key of the encoded JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogRecord {
    pub fields: BTreeMap<String, FieldValue>,
}

impl LogRecord {
    /// Decode a UTF-8 JSON object.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SinkError> {
        let object: serde_json::Map<String, Value> = serde_json::from_slice(bytes)?;
        Ok(object.into_iter().collect())
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(FieldValue::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for LogRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        LogRecord {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
