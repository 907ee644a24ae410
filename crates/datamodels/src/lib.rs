//! # elif-datamodels: Lazy Data Models for elif.rs
//!
//! Strongly-typed access to semi-structured documents. A model wraps a
//! backing store (a JSON object or an XML element tree), resolves attributes
//! and has-one/has-many relations on first access through a declarative
//! [`Schema`], and exports the possibly mutated object graph back to the
//! original document shape. Untouched fields pass through unchanged and
//! unresolved subtrees are never rebuilt.
//!
//! ```
//! use elif_datamodels::{JsonModel, Schema};
//! use once_cell::sync::Lazy;
//!
//! static POST: Lazy<Schema> = Lazy::new(|| Schema::new("post"));
//!
//! let mut post = JsonModel::from_json_str(&POST, r#"{"id":1}"#).unwrap();
//! post.set("title", "Foo").unwrap();
//! assert_eq!(post.to_json().unwrap(), r#"{"id":1,"title":"Foo"}"#);
//! ```

pub mod cast;
pub mod collection;
pub mod config;
pub mod error;
pub mod json;
pub mod model;
pub mod schema;
pub mod value;
pub mod xml;

// Re-export core traits and types
pub use cast::{Cast, Caster};
pub use collection::{Collection, ToArray};
pub use config::SerializerConfig;
pub use error::{ModelError, ModelResult};
pub use json::{FlatStore, JsonModel};
pub use model::{
    Attribute, BackingStore, CollectionRef, Input, Model, ModelRef, Relation, RelationKey,
};
pub use schema::{RelationKind, Schema, SchemaRef};
pub use value::Value;
pub use xml::{Element, TreeStore, XmlModel};
