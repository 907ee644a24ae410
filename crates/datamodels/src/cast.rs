//! Cast strategies - bidirectional conversion between raw and typed values
//!
//! `cast` runs when an attribute is first resolved from the backing store
//! (or from its default); `uncast` runs on export and must leave any value
//! that is not already in the strategy's typed form untouched.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use serde_json::Value as Json;
use std::fmt;
use std::sync::Arc;

use crate::error::{ModelError, ModelResult};
use crate::value::Value;

/// User-defined cast strategy
pub trait Caster: Send + Sync {
    /// Name used in error messages and debug output
    fn name(&self) -> &str {
        "custom"
    }

    /// Convert a raw value into its typed form
    fn cast(&self, raw: &Json) -> ModelResult<Value>;

    /// Convert a typed value back to its serializable form
    fn uncast(&self, value: &Value) -> Json {
        value.to_json()
    }
}

/// Cast strategy declared for an attribute
#[derive(Clone)]
pub enum Cast {
    Boolean,
    Integer,
    Float,
    String,
    /// Exported as `YYYY-MM-DD`
    Date,
    /// Exported as `YYYY-MM-DD HH:MM:SS`
    DateTime,
    /// Exported as `YYYY-MM-DDTHH:MM:SS+HH:MM`
    Iso8601,
    Custom(Arc<dyn Caster>),
}

impl Cast {
    /// Wrap a user-defined strategy
    pub fn custom<C: Caster + 'static>(caster: C) -> Self {
        Cast::Custom(Arc::new(caster))
    }

    pub fn name(&self) -> &str {
        match self {
            Cast::Boolean => "boolean",
            Cast::Integer => "integer",
            Cast::Float => "float",
            Cast::String => "string",
            Cast::Date => "date",
            Cast::DateTime => "datetime",
            Cast::Iso8601 => "iso8601",
            Cast::Custom(caster) => caster.name(),
        }
    }

    /// Raw to typed
    pub fn cast(&self, attribute: &str, raw: &Json) -> ModelResult<Value> {
        match self {
            Cast::Boolean => Ok(Value::Bool(to_bool(raw))),
            Cast::Integer => Ok(Value::Integer(to_i64(raw).unwrap_or(0))),
            Cast::Float => Ok(Value::Float(to_f64(raw).unwrap_or(0.0))),
            Cast::String => Ok(Value::String(to_string(raw))),
            Cast::Date | Cast::DateTime | Cast::Iso8601 => match raw {
                Json::Null => Ok(Value::Null),
                Json::String(s) => parse_time(s).map(Value::DateTime).ok_or_else(|| {
                    ModelError::Cast {
                        attribute: attribute.to_string(),
                        cast: self.name().to_string(),
                        value: s.clone(),
                    }
                }),
                other => Err(ModelError::Cast {
                    attribute: attribute.to_string(),
                    cast: self.name().to_string(),
                    value: other.to_string(),
                }),
            },
            Cast::Custom(caster) => caster.cast(raw),
        }
    }

    /// Typed to raw
    pub fn uncast(&self, value: &Value) -> Json {
        match (self, value) {
            (Cast::Date, Value::DateTime(dt)) => Json::String(dt.format("%Y-%m-%d").to_string()),
            (Cast::DateTime, Value::DateTime(dt)) => {
                Json::String(dt.format("%Y-%m-%d %H:%M:%S").to_string())
            }
            (Cast::Iso8601, Value::DateTime(dt)) => {
                Json::String(dt.to_rfc3339_opts(SecondsFormat::Secs, false))
            }
            (Cast::Custom(caster), value) => caster.uncast(value),
            (_, value) => value.to_json(),
        }
    }
}

impl fmt::Debug for Cast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cast({})", self.name())
    }
}

fn to_bool(raw: &Json) -> bool {
    match raw {
        Json::Bool(b) => *b,
        Json::Number(n) => n.as_f64() == Some(1.0),
        Json::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "on" | "yes"
        ),
        _ => false,
    }
}

fn to_i64(raw: &Json) -> Option<i64> {
    match raw {
        Json::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Json::String(s) => {
            let number = numeric_prefix(s)?;
            number
                .parse::<i64>()
                .ok()
                .or_else(|| number.parse::<f64>().ok().map(|f| f as i64))
        }
        Json::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn to_f64(raw: &Json) -> Option<f64> {
    match raw {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => numeric_prefix(s)?.parse::<f64>().ok(),
        Json::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Leading decimal number of `s`, so `"12abc"` reads as `12`
fn numeric_prefix(s: &str) -> Option<&str> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = if matches!(bytes.first(), Some(b'+' | b'-')) { 1 } else { 0 };
    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if frac_end > end + 1 || has_digits {
            has_digits |= frac_end > end + 1;
            end = frac_end;
        }
    }
    if !has_digits {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    Some(&s[..end])
}

fn to_string(raw: &Json) -> String {
    match raw {
        Json::Null => String::new(),
        Json::String(s) => s.clone(),
        Json::Bool(true) => "1".to_string(),
        Json::Bool(false) => String::new(),
        other => other.to_string(),
    }
}

/// Parse the time formats the date-like casts accept
///
/// Naive inputs are taken as UTC.
pub fn parse_time(input: &str) -> Option<DateTime<FixedOffset>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt);
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_boolean_cast() {
        let cast = Cast::Boolean;
        for raw in [json!("false"), json!(null), json!(false), json!(0)] {
            assert_eq!(cast.cast("flag", &raw).unwrap(), Value::Bool(false), "{}", raw);
        }
        for raw in [json!("true"), json!(true), json!(1), json!("on")] {
            assert_eq!(cast.cast("flag", &raw).unwrap(), Value::Bool(true), "{}", raw);
        }
    }

    #[test]
    fn test_integer_cast() {
        let cast = Cast::Integer;
        for raw in [json!(10), json!("10"), json!("10.0"), json!(10.0)] {
            assert_eq!(cast.cast("age", &raw).unwrap(), Value::Integer(10));
        }
        assert_eq!(cast.cast("age", &json!(null)).unwrap(), Value::Integer(0));
    }

    #[test]
    fn test_integer_cast_keeps_full_precision() {
        let cast = Cast::Integer;
        let big = 9_007_199_254_740_993_i64;
        assert_eq!(cast.cast("id", &json!(big)).unwrap(), Value::Integer(big));
        assert_eq!(cast.cast("id", &json!("9007199254740993")).unwrap(), Value::Integer(big));
    }

    #[test]
    fn test_numeric_prefix_of_strings() {
        assert_eq!(Cast::Integer.cast("n", &json!("12abc")).unwrap(), Value::Integer(12));
        assert_eq!(Cast::Integer.cast("n", &json!(" -7.9 apples")).unwrap(), Value::Integer(-7));
        assert_eq!(Cast::Integer.cast("n", &json!("abc")).unwrap(), Value::Integer(0));
        assert_eq!(Cast::Float.cast("n", &json!("1.5e2x")).unwrap(), Value::Float(150.0));
        assert_eq!(Cast::Float.cast("n", &json!(".5")).unwrap(), Value::Float(0.5));
        assert_eq!(Cast::Float.cast("n", &json!("-")).unwrap(), Value::Float(0.0));
    }

    #[test]
    fn test_float_cast() {
        let cast = Cast::Float;
        assert_eq!(cast.cast("rate", &json!(10)).unwrap(), Value::Float(10.0));
        assert_eq!(cast.cast("rate", &json!("10.1")).unwrap(), Value::Float(10.1));
        assert_eq!(cast.cast("rate", &json!(null)).unwrap(), Value::Float(0.0));
    }

    #[test]
    fn test_string_cast() {
        let cast = Cast::String;
        assert_eq!(cast.cast("n", &json!(1234)).unwrap(), Value::String("1234".into()));
        assert_eq!(cast.cast("n", &json!(null)).unwrap(), Value::String(String::new()));
    }

    #[test]
    fn test_date_casts_render_their_own_format() {
        let value = Cast::Date.cast("birth_date", &json!("1990-07-18")).unwrap();
        let dt = value.as_datetime().unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (1990, 7, 18));
        assert_eq!(Cast::Date.uncast(&value), json!("1990-07-18"));

        let value = Cast::DateTime.cast("created_at", &json!("2019-01-03 12:13:14")).unwrap();
        assert_eq!(value.as_datetime().unwrap().hour(), 12);
        assert_eq!(Cast::DateTime.uncast(&value), json!("2019-01-03 12:13:14"));

        let value = Cast::Iso8601.cast("updated_at", &json!("2018-11-11T12:58:27+09:00")).unwrap();
        assert_eq!(value.as_datetime().unwrap().offset().local_minus_utc(), 9 * 3600);
        assert_eq!(Cast::Iso8601.uncast(&value), json!("2018-11-11T12:58:27+09:00"));
    }

    #[test]
    fn test_uncast_is_noop_for_untyped_values() {
        let raw = Value::String("1990-07-18".into());
        assert_eq!(Cast::Date.uncast(&raw), json!("1990-07-18"));
        let once = Cast::Date.uncast(&Value::from_json(&json!("x")));
        assert_eq!(Cast::Date.uncast(&Value::from_json(&once)), once);
    }

    #[test]
    fn test_unparseable_date_is_a_cast_error() {
        let err = Cast::Date.cast("birth_date", &json!("not a date")).unwrap_err();
        assert!(matches!(err, ModelError::Cast { .. }));
    }

    #[test]
    fn test_custom_cast_defaults_to_generic_uncast() {
        struct Upper;
        impl Caster for Upper {
            fn cast(&self, raw: &Json) -> ModelResult<Value> {
                Ok(Value::String(raw.as_str().unwrap_or_default().to_uppercase()))
            }
        }

        let cast = Cast::custom(Upper);
        assert_eq!(cast.name(), "custom");
        let value = cast.cast("code", &json!("abc")).unwrap();
        assert_eq!(value, Value::String("ABC".into()));
        assert_eq!(cast.uncast(&value), json!("ABC"));
    }
}
