//! Model Schema - Declarative metadata shared by every instance of a model type
//!
//! A schema is built once, usually inside a `once_cell::sync::Lazy` static,
//! and names the cast strategy and default of each attribute, the target
//! schema of each relation, and (tree models only) which attributes live on
//! the node itself and which tag a freshly created root gets.
//!
//! ```
//! use elif_datamodels::{Cast, Schema};
//! use once_cell::sync::Lazy;
//! use serde_json::json;
//!
//! static POST: Lazy<Schema> = Lazy::new(|| Schema::new("post"));
//! static USER: Lazy<Schema> = Lazy::new(|| {
//!     Schema::new("user")
//!         .with_cast("age", Cast::Integer)
//!         .with_default("name", json!("anonymous"))
//!         .with_has_many("posts", || &*POST)
//! });
//!
//! assert!(USER.is_has_many("posts"));
//! ```

use serde_json::Value as Json;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::cast::Cast;
use crate::error::{ModelError, ModelResult};

/// Relation targets are resolved lazily so schemas may refer to themselves
pub type SchemaRef = fn() -> &'static Schema;

/// Root tag used by tree models that declare none
pub const DEFAULT_ROOT: &str = "root";

/// Kind of a declared relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// One-to-one relationship (hasOne)
    HasOne,
    /// One-to-many relationship (hasMany)
    HasMany,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::HasOne => f.write_str("hasOne"),
            RelationKind::HasMany => f.write_str("hasMany"),
        }
    }
}

/// Declarative metadata for a model type
pub struct Schema {
    name: String,
    root: Option<String>,
    casts: HashMap<String, Cast>,
    defaults: HashMap<String, Json>,
    has_one: HashMap<String, SchemaRef>,
    has_many: HashMap<String, SchemaRef>,
    node_attributes: HashSet<String>,
    attributes: Option<HashSet<String>>,
}

impl Schema {
    /// Create a schema with no casts, defaults or relations
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: None,
            casts: HashMap::new(),
            defaults: HashMap::new(),
            has_one: HashMap::new(),
            has_many: HashMap::new(),
            node_attributes: HashSet::new(),
            attributes: None,
        }
    }

    /// Declare the cast strategy of an attribute
    pub fn with_cast(mut self, attribute: impl Into<String>, cast: Cast) -> Self {
        self.casts.insert(attribute.into(), cast);
        self
    }

    /// Declare the default of an attribute missing from the backing store
    pub fn with_default(mut self, attribute: impl Into<String>, value: Json) -> Self {
        self.defaults.insert(attribute.into(), value);
        self
    }

    /// Declare a one-to-one relation
    pub fn with_has_one(mut self, relation: impl Into<String>, target: SchemaRef) -> Self {
        self.has_one.insert(relation.into(), target);
        self
    }

    /// Declare a one-to-many relation
    pub fn with_has_many(mut self, relation: impl Into<String>, target: SchemaRef) -> Self {
        self.has_many.insert(relation.into(), target);
        self
    }

    /// Declare attributes stored on the tree node rather than as child elements
    pub fn with_node_attributes<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.node_attributes.extend(names.into_iter().map(Into::into));
        self
    }

    /// Tag used when a tree model of this type is created without one
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Close the attribute set: names outside it (and outside the declared
    /// casts, defaults and relations) are rejected
    pub fn with_attributes<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.attributes
            .get_or_insert_with(HashSet::new)
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root tag for fresh tree models
    pub fn root(&self) -> &str {
        self.root.as_deref().unwrap_or(DEFAULT_ROOT)
    }

    pub fn cast(&self, attribute: &str) -> Option<&Cast> {
        self.casts.get(attribute)
    }

    pub fn default_value(&self, attribute: &str) -> Option<&Json> {
        self.defaults.get(attribute)
    }

    pub fn is_has_one(&self, name: &str) -> bool {
        self.has_one.contains_key(name)
    }

    pub fn is_has_many(&self, name: &str) -> bool {
        self.has_many.contains_key(name)
    }

    /// Kind of the relation declared under `name`, has-many taking precedence
    pub fn relation_kind(&self, name: &str) -> Option<RelationKind> {
        if self.is_has_many(name) {
            Some(RelationKind::HasMany)
        } else if self.is_has_one(name) {
            Some(RelationKind::HasOne)
        } else {
            None
        }
    }

    /// Target schema of a relation
    pub fn relation_target(&self, kind: RelationKind, name: &str) -> Option<&'static Schema> {
        let targets = match kind {
            RelationKind::HasOne => &self.has_one,
            RelationKind::HasMany => &self.has_many,
        };
        targets.get(name).map(|target| target())
    }

    pub fn is_node_attribute(&self, name: &str) -> bool {
        self.node_attributes.contains(name)
    }

    /// Reject names outside a closed attribute set
    pub fn check_attribute(&self, name: &str) -> ModelResult<()> {
        let Some(attributes) = &self.attributes else {
            return Ok(());
        };

        let declared = attributes.contains(name)
            || self.casts.contains_key(name)
            || self.defaults.contains_key(name)
            || self.node_attributes.contains(name)
            || self.relation_kind(name).is_some();

        if declared {
            Ok(())
        } else {
            Err(ModelError::UnknownAttribute {
                model: self.name.clone(),
                attribute: name.to_string(),
            })
        }
    }

    /// Two schemas describe the same model type only when they are the same declaration
    pub fn same_type(&self, other: &Schema) -> bool {
        std::ptr::eq(self, other)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut has_one: Vec<_> = self.has_one.keys().collect();
        let mut has_many: Vec<_> = self.has_many.keys().collect();
        has_one.sort();
        has_many.sort();

        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("root", &self.root())
            .field("casts", &self.casts)
            .field("defaults", &self.defaults)
            .field("has_one", &has_one)
            .field("has_many", &has_many)
            .field("node_attributes", &self.node_attributes)
            .field("attributes", &self.attributes)
            .finish()
    }
}
