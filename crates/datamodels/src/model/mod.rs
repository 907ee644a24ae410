//! Model Core - Lazy attribute and relation engine shared by every backing store
//!
//! Every read first consults the per-instance caches. On a miss the backing
//! store is asked for the raw value, the value is cast, cached, and evicted
//! from the store, so each name lives in exactly one place: the resolved
//! cache, the raw store, the schema default, or nowhere. Export merges the
//! caches back over whatever the store still holds.
//!
//! Related instances and has-many collections are handed out as shared
//! handles (`Rc<RefCell<_>>`): mutating a handle obtained from a parent is
//! visible in the parent's export.

pub mod input;
pub mod store;

pub use input::{Attribute, Input};
pub use store::BackingStore;

use indexmap::IndexMap;
use serde_json::Value as Json;
use std::cell::RefCell;
use std::rc::Rc;

use crate::collection::Collection;
use crate::error::{ModelError, ModelResult};
use crate::schema::{RelationKind, Schema};
use crate::value::Value;

/// Shared handle to a model instance
pub type ModelRef<S> = Rc<RefCell<Model<S>>>;

/// Shared handle to a has-many collection
pub type CollectionRef<S> = Rc<RefCell<Collection<ModelRef<S>>>>;

/// Cache key of a resolved relation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationKey {
    pub kind: RelationKind,
    pub name: String,
}

impl RelationKey {
    pub fn new(kind: RelationKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// A resolved relation value
#[derive(Debug, Clone)]
pub enum Relation<S> {
    /// Has-one; `None` when the store held no sub-structure
    One(Option<ModelRef<S>>),
    Many(CollectionRef<S>),
}

/// A model instance over backing store `S`
#[derive(Debug)]
pub struct Model<S> {
    schema: &'static Schema,
    store: S,
    attributes: IndexMap<String, Value>,
    relations: IndexMap<RelationKey, Relation<S>>,
}

impl<S> Model<S> {
    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// Residual backing store: everything not yet resolved
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolved attributes in resolution order
    pub fn resolved_attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Resolved relations in resolution order
    pub fn resolved_relations(&self) -> impl Iterator<Item = (&RelationKey, &Relation<S>)> {
        self.relations.iter()
    }

    /// Serializable form of a resolved attribute value
    pub fn uncast(&self, name: &str, value: &Value) -> Json {
        match self.schema.cast(name) {
            Some(cast) => cast.uncast(value),
            None => value.to_json(),
        }
    }

    /// Move the instance behind a shared handle
    pub fn into_ref(self) -> ModelRef<S> {
        Rc::new(RefCell::new(self))
    }
}

impl<S: BackingStore> Model<S> {
    /// Wrap an already-parsed backing store
    pub fn new(schema: &'static Schema, store: S) -> Self {
        Self {
            schema,
            store,
            attributes: IndexMap::new(),
            relations: IndexMap::new(),
        }
    }

    /// Instance with an empty backing store
    pub fn empty(schema: &'static Schema) -> Self {
        Self::new(schema, S::empty(schema, None))
    }

    /// Build from a plain nested map, constructing declared relation targets
    pub fn from_plain(schema: &'static Schema, plain: serde_json::Map<String, Json>) -> ModelResult<Self> {
        S::from_plain(schema, plain, None)
    }

    /// Read an attribute or relation by name
    pub fn get(&mut self, name: &str) -> ModelResult<Attribute<S>> {
        match self.schema.relation_kind(name) {
            Some(RelationKind::HasMany) => self.resolve_has_many(name).map(Attribute::Many),
            Some(RelationKind::HasOne) => self.resolve_has_one(name).map(Attribute::One),
            None => self.resolve_attribute(name).map(Attribute::Value),
        }
    }

    /// Read a plain attribute
    pub fn attribute(&mut self, name: &str) -> ModelResult<Value> {
        if self.schema.relation_kind(name).is_some() {
            return Err(ModelError::NotAnAttribute {
                model: self.schema.name().to_string(),
                name: name.to_string(),
            });
        }
        self.resolve_attribute(name)
    }

    /// Read a has-one relation
    pub fn has_one(&mut self, name: &str) -> ModelResult<Option<ModelRef<S>>> {
        self.ensure_relation(RelationKind::HasOne, name)?;
        self.resolve_has_one(name)
    }

    /// Read a has-many relation
    pub fn has_many(&mut self, name: &str) -> ModelResult<CollectionRef<S>> {
        self.ensure_relation(RelationKind::HasMany, name)?;
        self.resolve_has_many(name)
    }

    /// Write an attribute or relation by name
    pub fn set(&mut self, name: &str, value: impl Into<Input<S>>) -> ModelResult<()> {
        match self.schema.relation_kind(name) {
            Some(RelationKind::HasMany) => self.set_has_many(name, value),
            Some(RelationKind::HasOne) => self.set_has_one(name, value),
            None => self.set_attribute(name, value.into()),
        }
    }

    /// Assign a has-one relation, replacing any previous value
    pub fn set_has_one(&mut self, name: &str, value: impl Into<Input<S>>) -> ModelResult<()> {
        self.ensure_relation(RelationKind::HasOne, name)?;
        let target = self.relation_target(RelationKind::HasOne, name)?;
        let related = self.normalize_one(name, target, value.into(), Some(name))?;

        tracing::debug!("Assigned has-one relation '{}' on model '{}'", name, self.schema.name());
        self.store.on_load_attribute(self.schema, name);
        self.relations.insert(
            RelationKey::new(RelationKind::HasOne, name),
            Relation::One(Some(related)),
        );
        Ok(())
    }

    /// Assign a has-many relation, discarding any cached collection first
    pub fn set_has_many(&mut self, name: &str, value: impl Into<Input<S>>) -> ModelResult<()> {
        self.ensure_relation(RelationKind::HasMany, name)?;
        let target = self.relation_target(RelationKind::HasMany, name)?;
        let collection = match value.into() {
            Input::Collection(collection) => collection,
            Input::Sequence(items) => self.normalize_many(name, target, items)?,
            Input::Plain(Json::Array(items)) => {
                self.normalize_many(name, target, items.into_iter().map(Input::Plain).collect())?
            }
            other => {
                return Err(ModelError::invalid_relation(
                    name,
                    format!("sequence or collection of '{}'", target.name()),
                    other.kind(),
                ))
            }
        };

        tracing::debug!(
            "Assigned has-many relation '{}' on model '{}' ({} items)",
            name,
            self.schema.name(),
            collection.borrow().len()
        );
        let key = RelationKey::new(RelationKind::HasMany, name);
        self.relations.shift_remove(&key);
        self.store.on_load_attribute(self.schema, name);
        self.relations.insert(key, Relation::Many(collection));
        Ok(())
    }

    /// Remove a name from the raw store and from every cache
    pub fn remove(&mut self, name: &str) -> ModelResult<()> {
        self.schema.check_attribute(name)?;
        self.store.on_load_attribute(self.schema, name);
        self.attributes.shift_remove(name);
        self.relations
            .shift_remove(&RelationKey::new(RelationKind::HasOne, name));
        self.relations
            .shift_remove(&RelationKey::new(RelationKind::HasMany, name));
        Ok(())
    }

    /// Whether a non-null value exists for `name`, without resolving it
    pub fn is_set(&self, name: &str) -> bool {
        if let Some(value) = self.attributes.get(name) {
            return !value.is_null();
        }

        for kind in [RelationKind::HasOne, RelationKind::HasMany] {
            match self.relations.get(&RelationKey::new(kind, name)) {
                Some(Relation::One(related)) => return related.is_some(),
                Some(Relation::Many(_)) => return true,
                None => {}
            }
        }

        self.store.has_attribute(self.schema, name)
            && !self.store.get_attribute(self.schema, name).is_null()
    }

    fn resolve_attribute(&mut self, name: &str) -> ModelResult<Value> {
        self.schema.check_attribute(name)?;

        if let Some(value) = self.attributes.get(name) {
            tracing::trace!("Attribute '{}' served from cache", name);
            return Ok(value.clone());
        }

        let value = if self.store.has_attribute(self.schema, name) {
            let raw = self.store.get_attribute(self.schema, name);
            tracing::debug!(
                "Resolved attribute '{}' on model '{}' from backing store",
                name,
                self.schema.name()
            );
            self.cast(name, &raw)?
        } else if let Some(default) = self.schema.default_value(name) {
            tracing::debug!(
                "Attribute '{}' missing on model '{}', using default",
                name,
                self.schema.name()
            );
            self.cast(name, default)?
        } else {
            Value::Null
        };

        self.load_attribute(name, value.clone());
        Ok(value)
    }

    fn set_attribute(&mut self, name: &str, value: Input<S>) -> ModelResult<()> {
        self.schema.check_attribute(name)?;
        let value = match value {
            Input::Value(value) => value,
            Input::Plain(raw) => Value::from_json(&raw),
            other => {
                return Err(ModelError::InvalidAttributeValue {
                    attribute: name.to_string(),
                    given: other.kind(),
                })
            }
        };
        self.load_attribute(name, value);
        Ok(())
    }

    /// Cache a value and evict its raw copy so export never sees it twice
    fn load_attribute(&mut self, name: &str, value: Value) {
        self.attributes.insert(name.to_string(), value);
        self.store.on_load_attribute(self.schema, name);
    }

    fn cast(&self, name: &str, raw: &Json) -> ModelResult<Value> {
        match self.schema.cast(name) {
            Some(cast) => cast.cast(name, raw),
            None => Ok(Value::from_json(raw)),
        }
    }

    fn resolve_has_one(&mut self, name: &str) -> ModelResult<Option<ModelRef<S>>> {
        let key = RelationKey::new(RelationKind::HasOne, name);
        if let Some(Relation::One(related)) = self.relations.get(&key) {
            tracing::trace!("Has-one relation '{}' served from cache", name);
            return Ok(related.clone());
        }

        let target = self.relation_target(RelationKind::HasOne, name)?;
        let related = self
            .store
            .take_one(name)
            .map(|store| Model::new(target, store).into_ref());

        tracing::debug!(
            "Resolved has-one relation '{}' on model '{}' (present: {})",
            name,
            self.schema.name(),
            related.is_some()
        );
        self.relations.insert(key, Relation::One(related.clone()));
        Ok(related)
    }

    fn resolve_has_many(&mut self, name: &str) -> ModelResult<CollectionRef<S>> {
        let key = RelationKey::new(RelationKind::HasMany, name);
        if let Some(Relation::Many(collection)) = self.relations.get(&key) {
            tracing::trace!("Has-many relation '{}' served from cache", name);
            return Ok(Rc::clone(collection));
        }

        let target = self.relation_target(RelationKind::HasMany, name)?;
        let items: Collection<ModelRef<S>> = self
            .store
            .take_many(name)?
            .into_iter()
            .map(|store| Model::new(target, store).into_ref())
            .collect();

        tracing::debug!(
            "Resolved has-many relation '{}' on model '{}' ({} items)",
            name,
            self.schema.name(),
            items.len()
        );
        let collection = Rc::new(RefCell::new(items));
        self.relations.insert(key, Relation::Many(Rc::clone(&collection)));
        Ok(collection)
    }

    fn normalize_many(
        &self,
        relation: &str,
        target: &'static Schema,
        items: Vec<Input<S>>,
    ) -> ModelResult<CollectionRef<S>> {
        let items = items
            .into_iter()
            .map(|item| self.normalize_one(relation, target, item, None))
            .collect::<ModelResult<Collection<_>>>()?;
        Ok(Rc::new(RefCell::new(items)))
    }

    /// Turn one assigned value into an instance of `target`
    ///
    /// Existing instances are kept as-is so later mutation through the
    /// caller's handle shows up in this model's export.
    fn normalize_one(
        &self,
        relation: &str,
        target: &'static Schema,
        input: Input<S>,
        root: Option<&str>,
    ) -> ModelResult<ModelRef<S>> {
        match input {
            Input::Model(model) => {
                let same_type = model
                    .try_borrow()
                    .map(|model| model.schema().same_type(target))
                    .unwrap_or(false);
                if same_type {
                    Ok(model)
                } else {
                    Err(ModelError::invalid_relation(
                        relation,
                        format!("map or '{}'", target.name()),
                        Input::Model(model).kind(),
                    ))
                }
            }
            Input::Plain(Json::Object(plain)) => {
                S::from_plain(target, plain, root).map(Model::into_ref)
            }
            Input::Store(store) => Ok(Model::new(target, store).into_ref()),
            other => Err(ModelError::invalid_relation(
                relation,
                format!("map or '{}'", target.name()),
                other.kind(),
            )),
        }
    }

    fn ensure_relation(&self, kind: RelationKind, name: &str) -> ModelResult<()> {
        let declared = match kind {
            RelationKind::HasOne => self.schema.is_has_one(name),
            RelationKind::HasMany => self.schema.is_has_many(name),
        };
        if declared {
            Ok(())
        } else {
            Err(ModelError::UnknownRelation {
                model: self.schema.name().to_string(),
                relation: name.to_string(),
                kind: kind.to_string(),
            })
        }
    }

    fn relation_target(&self, kind: RelationKind, name: &str) -> ModelResult<&'static Schema> {
        self.schema
            .relation_target(kind, name)
            .ok_or_else(|| ModelError::UnknownRelation {
                model: self.schema.name().to_string(),
                relation: name.to_string(),
                kind: kind.to_string(),
            })
    }
}
