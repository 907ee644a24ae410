//! Values accepted by assignment and returned by generic reads

use chrono::{DateTime, FixedOffset};
use serde_json::Value as Json;

use super::{CollectionRef, ModelRef};
use crate::value::{json_kind, Value};

/// A value assigned to an attribute or relation
///
/// Attributes accept `Value` and `Plain`. A has-one accepts a plain map,
/// an existing instance of the target type or a raw store; a has-many
/// additionally accepts a collection (used as-is) or a sequence whose
/// elements are normalized one by one.
#[derive(Debug, Clone)]
pub enum Input<S> {
    Value(Value),
    Plain(Json),
    Model(ModelRef<S>),
    Collection(CollectionRef<S>),
    Sequence(Vec<Input<S>>),
    Store(S),
}

impl<S> Input<S> {
    /// Short name of the input's kind, used in error messages
    pub fn kind(&self) -> String {
        match self {
            Input::Value(value) => value.kind().to_string(),
            Input::Plain(raw) => json_kind(raw).to_string(),
            Input::Model(model) => match model.try_borrow() {
                Ok(model) => format!("model '{}'", model.schema().name()),
                Err(_) => "model".to_string(),
            },
            Input::Collection(_) => "collection".to_string(),
            Input::Sequence(_) => "sequence".to_string(),
            Input::Store(_) => "store".to_string(),
        }
    }
}

impl<S> From<Value> for Input<S> {
    fn from(value: Value) -> Self {
        Input::Value(value)
    }
}

impl<S> From<Json> for Input<S> {
    fn from(raw: Json) -> Self {
        Input::Plain(raw)
    }
}

impl<S> From<&str> for Input<S> {
    fn from(s: &str) -> Self {
        Input::Value(Value::from(s))
    }
}

impl<S> From<String> for Input<S> {
    fn from(s: String) -> Self {
        Input::Value(Value::from(s))
    }
}

impl<S> From<bool> for Input<S> {
    fn from(b: bool) -> Self {
        Input::Value(Value::from(b))
    }
}

impl<S> From<i64> for Input<S> {
    fn from(i: i64) -> Self {
        Input::Value(Value::from(i))
    }
}

impl<S> From<i32> for Input<S> {
    fn from(i: i32) -> Self {
        Input::Value(Value::from(i))
    }
}

impl<S> From<f64> for Input<S> {
    fn from(v: f64) -> Self {
        Input::Value(Value::from(v))
    }
}

impl<S> From<DateTime<FixedOffset>> for Input<S> {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Input::Value(Value::DateTime(dt))
    }
}

impl<S> From<ModelRef<S>> for Input<S> {
    fn from(model: ModelRef<S>) -> Self {
        Input::Model(model)
    }
}

impl<S> From<CollectionRef<S>> for Input<S> {
    fn from(collection: CollectionRef<S>) -> Self {
        Input::Collection(collection)
    }
}

impl<S> From<Vec<Input<S>>> for Input<S> {
    fn from(items: Vec<Input<S>>) -> Self {
        Input::Sequence(items)
    }
}

/// Result of a generic read by name
#[derive(Debug, Clone)]
pub enum Attribute<S> {
    Value(Value),
    One(Option<ModelRef<S>>),
    Many(CollectionRef<S>),
}

impl<S> Attribute<S> {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Attribute::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_one(self) -> Option<ModelRef<S>> {
        match self {
            Attribute::One(model) => model,
            _ => None,
        }
    }

    pub fn into_many(self) -> Option<CollectionRef<S>> {
        match self {
            Attribute::Many(collection) => Some(collection),
            _ => None,
        }
    }
}
