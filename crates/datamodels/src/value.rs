//! Typed attribute values
//!
//! Backing stores hold raw `serde_json::Value`s (the tree variant exposes
//! element text as raw strings). A resolved attribute is a [`Value`]: the
//! result of running the raw value through the attribute's cast strategy,
//! or a generic conversion when no cast is declared.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde_json::Value as Json;
use std::fmt;

/// A resolved attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Temporal value produced by the date-like casts
    DateTime(DateTime<FixedOffset>),
    /// Structured or otherwise unconverted raw value (arrays, maps, large numbers)
    Json(Json),
}

impl Value {
    /// Generic raw-to-typed conversion used when no cast is declared
    pub fn from_json(raw: &Json) -> Self {
        match raw {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if n.is_u64() {
                    Value::Json(raw.clone())
                } else {
                    n.as_f64().map(Value::Float).unwrap_or(Value::Json(raw.clone()))
                }
            }
            Json::String(s) => Value::String(s.clone()),
            other => Value::Json(other.clone()),
        }
    }

    /// Generic typed-to-raw conversion, the inverse of [`Value::from_json`]
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Integer(i) => Json::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.clone()),
            Value::DateTime(dt) => Json::String(dt.to_rfc3339_opts(SecondsFormat::Secs, false)),
            Value::Json(raw) => raw.clone(),
        }
    }

    /// Text form used for element content and node attributes
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Json(Json::String(s)) => s.clone(),
            Value::Json(raw) => raw.to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::Json(Json::Null))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Json> {
        match self {
            Value::Json(raw) => Some(raw),
            _ => None,
        }
    }

    /// Short name of the value's kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::Json(raw) => json_kind(raw),
        }
    }
}

/// Short name of a raw value's kind
pub fn json_kind(raw: &Json) -> &'static str {
    match raw {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(n) if n.is_f64() => "float",
        Json::Number(_) => "integer",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "map",
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => f.write_str(s),
            Value::DateTime(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, false)),
            Value::Json(raw) => write!(f, "{}", raw),
        }
    }
}

impl From<Json> for Value {
    fn from(raw: Json) -> Self {
        Value::from_json(&raw)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Value::DateTime(dt)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        self.as_i64() == Some(*other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generic_conversion_keeps_scalars() {
        assert_eq!(Value::from_json(&json!(1)), Value::Integer(1));
        assert_eq!(Value::from_json(&json!(1.5)), Value::Float(1.5));
        assert_eq!(Value::from_json(&json!("a")), Value::String("a".into()));
        assert_eq!(Value::from_json(&json!(null)), Value::Null);
        assert_eq!(Value::from_json(&json!([1, 2])), Value::Json(json!([1, 2])));
    }

    #[test]
    fn test_large_unsigned_numbers_stay_raw() {
        let raw = json!(u64::MAX);
        assert_eq!(Value::from_json(&raw).to_json(), raw);
    }

    #[test]
    fn test_text_form() {
        assert_eq!(Value::Null.to_text(), "");
        assert_eq!(Value::Integer(7).to_text(), "7");
        assert_eq!(Value::Bool(false).to_text(), "false");
        assert_eq!(Value::Json(json!({"a": 1})).to_text(), r#"{"a":1}"#);
    }
}
