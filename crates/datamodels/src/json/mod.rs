//! JSON models - the model core over an insertion-ordered string-keyed map
//!
//! Lookups are direct map lookups and resolution deletes the map entry.
//! Export clones the remaining map and assigns every resolved relation and
//! attribute over it by key; a key is resolved at most once, so no key is
//! merged twice.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value as Json};
use std::fmt;

use crate::collection::ToArray;
use crate::config::SerializerConfig;
use crate::error::{ModelError, ModelResult};
use crate::model::{BackingStore, Model, ModelRef, Relation};
use crate::schema::Schema;
use crate::value::json_kind;

/// Model over a JSON object
pub type JsonModel = Model<FlatStore>;

/// Insertion-ordered map backing a [`JsonModel`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatStore {
    data: Map<String, Json>,
}

impl FlatStore {
    pub fn new(data: Map<String, Json>) -> Self {
        Self { data }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn data(&self) -> &Map<String, Json> {
        &self.data
    }

    pub fn into_inner(self) -> Map<String, Json> {
        self.data
    }
}

impl From<Map<String, Json>> for FlatStore {
    fn from(data: Map<String, Json>) -> Self {
        Self::new(data)
    }
}

impl BackingStore for FlatStore {
    fn empty(_schema: &Schema, _root: Option<&str>) -> Self {
        Self::default()
    }

    fn has_attribute(&self, _schema: &Schema, name: &str) -> bool {
        self.data.contains_key(name)
    }

    fn get_attribute(&self, _schema: &Schema, name: &str) -> Json {
        self.data.get(name).cloned().unwrap_or(Json::Null)
    }

    fn on_load_attribute(&mut self, _schema: &Schema, name: &str) {
        self.data.shift_remove(name);
    }

    fn take_one(&mut self, relation: &str) -> Option<Self> {
        if !matches!(self.data.get(relation), Some(Json::Object(_))) {
            return None;
        }
        match self.data.shift_remove(relation) {
            Some(Json::Object(map)) => Some(Self::new(map)),
            _ => None,
        }
    }

    fn take_many(&mut self, relation: &str) -> ModelResult<Vec<Self>> {
        if let Some(Json::Array(items)) = self.data.get(relation) {
            if let Some(item) = items.iter().find(|item| !item.is_object()) {
                return Err(ModelError::invalid_relation(relation, "map", json_kind(item)));
            }
        }

        let items = match self.data.shift_remove(relation) {
            Some(Json::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Json::Object(map) => Some(Self::new(map)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        Ok(items)
    }

    /// Relations stay raw until first access
    fn from_plain(
        schema: &'static Schema,
        plain: Map<String, Json>,
        _root: Option<&str>,
    ) -> ModelResult<Model<Self>> {
        Ok(Model::new(schema, Self::new(plain)))
    }
}

impl Model<FlatStore> {
    /// Wrap a parsed JSON object
    pub fn from_map(schema: &'static Schema, data: Map<String, Json>) -> Self {
        Model::new(schema, FlatStore::new(data))
    }

    /// Parse a JSON object
    pub fn from_json_str(schema: &'static Schema, json: &str) -> ModelResult<Self> {
        let data: Map<String, Json> = serde_json::from_str(json)?;
        Ok(Self::from_map(schema, data))
    }

    /// Plain nested form: the residual map with resolved relations and
    /// uncast attributes assigned over it
    pub fn to_array(&self) -> Json {
        let mut data = self.store().data().clone();

        for (key, relation) in self.resolved_relations() {
            match relation {
                Relation::One(Some(related)) => {
                    data.insert(key.name.clone(), related.borrow().to_array());
                }
                Relation::One(None) => {}
                Relation::Many(collection) => {
                    data.insert(key.name.clone(), collection.borrow().to_array());
                }
            }
        }

        for (name, value) in self.resolved_attributes() {
            data.insert(name.to_string(), self.uncast(name, value));
        }

        Json::Object(data)
    }

    /// Compact JSON text
    pub fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string(&self.to_array())?)
    }

    /// JSON text using the printer options in `config`
    pub fn to_json_with(&self, config: &SerializerConfig) -> ModelResult<String> {
        let array = self.to_array();
        let json = if config.json_pretty {
            serde_json::to_string_pretty(&array)?
        } else {
            serde_json::to_string(&array)?
        };
        Ok(json)
    }
}

impl ToArray for Model<FlatStore> {
    fn to_array(&self) -> Json {
        Model::to_array(self)
    }
}

impl ToArray for ModelRef<FlatStore> {
    fn to_array(&self) -> Json {
        self.borrow().to_array()
    }
}

impl Serialize for Model<FlatStore> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}

impl fmt::Display for Model<FlatStore> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attribute;
    use crate::value::Value;
    use once_cell::sync::Lazy;
    use serde_json::json;

    static POST: Lazy<Schema> = Lazy::new(|| Schema::new("post"));
    static USER: Lazy<Schema> = Lazy::new(|| {
        Schema::new("user")
            .with_has_many("posts", || &*POST)
            .with_has_one("profile", || &*POST)
    });

    fn map(value: Json) -> Map<String, Json> {
        match value {
            Json::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_untouched_model_round_trips() {
        let data = json!({"id": 1, "posts": [{"a": 1}], "profile": {"b": 2}, "z": null});
        let user = JsonModel::from_map(&USER, map(data.clone()));
        assert_eq!(user.to_array(), data);
    }

    #[test]
    fn test_resolution_evicts_raw_entry() {
        let mut user = JsonModel::from_map(&USER, map(json!({"id": 1, "posts": []})));
        assert_eq!(user.attribute("id").unwrap(), Value::Integer(1));
        user.has_many("posts").unwrap();
        assert!(!user.store().contains("id"));
        assert!(!user.store().contains("posts"));
        assert_eq!(user.to_array(), json!({"posts": [], "id": 1}));
    }

    #[test]
    fn test_non_map_has_one_stays_raw() {
        let mut user = JsonModel::from_map(&USER, map(json!({"profile": "none"})));
        assert!(user.has_one("profile").unwrap().is_none());
        assert!(user.store().contains("profile"));
        assert_eq!(user.to_array(), json!({"profile": "none"}));
    }

    #[test]
    fn test_non_map_has_many_item_is_rejected() {
        let mut user = JsonModel::from_map(&USER, map(json!({"posts": [{"a": 1}, 3]})));
        let err = user.has_many("posts").unwrap_err();
        assert!(matches!(err, ModelError::InvalidRelationValue { .. }));
    }

    #[test]
    fn test_generic_get_dispatches_on_declaration() {
        let mut user = JsonModel::from_map(&USER, map(json!({"posts": [{"a": 1}]})));
        assert!(matches!(user.get("posts").unwrap(), Attribute::Many(_)));
        assert!(matches!(user.get("profile").unwrap(), Attribute::One(None)));
        assert!(matches!(user.get("name").unwrap(), Attribute::Value(Value::Null)));
    }

    #[test]
    fn test_pretty_printing() {
        let post = JsonModel::from_map(&POST, map(json!({"id": 1})));
        let config = SerializerConfig::default().with_json_pretty(true);
        assert_eq!(post.to_json_with(&config).unwrap(), "{\n  \"id\": 1\n}");
        assert_eq!(post.to_string(), r#"{"id":1}"#);
    }
}
