//! Backing store capability set
//!
//! A backing store is the untyped document a model wraps. The model core
//! only talks to it through this trait: presence test, raw read, eviction
//! once a value is resolved, and detachment of relation sub-structures whose
//! ownership moves to a newly resolved related instance.

use serde_json::{Map, Value as Json};
use std::fmt::Debug;

use super::{Input, Model};
use crate::error::ModelResult;
use crate::schema::Schema;

pub trait BackingStore: Sized + Clone + Debug {
    /// Fresh store for an instance with no data; `root` only matters for
    /// stores that carry a tag name
    fn empty(schema: &Schema, root: Option<&str>) -> Self;

    /// Whether the store holds a raw entry for `name`
    fn has_attribute(&self, schema: &Schema, name: &str) -> bool;

    /// Raw entry for `name`, null when absent
    fn get_attribute(&self, schema: &Schema, name: &str) -> Json;

    /// Evict the raw entry for `name` (also used to purge relation data)
    fn on_load_attribute(&mut self, schema: &Schema, name: &str);

    /// Detach the has-one sub-structure stored under `relation`
    fn take_one(&mut self, relation: &str) -> Option<Self>;

    /// Detach the has-many container stored under `relation`, one store per item;
    /// a missing or non-sequence container yields no items
    fn take_many(&mut self, relation: &str) -> ModelResult<Vec<Self>>;

    /// Build an instance of `schema` from a plain map
    ///
    /// The default creates an empty store and assigns every key, so declared
    /// relations are constructed recursively.
    fn from_plain(
        schema: &'static Schema,
        plain: Map<String, Json>,
        root: Option<&str>,
    ) -> ModelResult<Model<Self>> {
        let mut model = Model::new(schema, Self::empty(schema, root));
        for (name, value) in plain {
            model.set(&name, Input::Plain(value))?;
        }
        Ok(model)
    }
}
