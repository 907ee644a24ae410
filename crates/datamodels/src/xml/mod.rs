//! XML models - the model core over an element tree
//!
//! Attribute names declared as node attributes live on the element itself;
//! every other name maps to a child element whose text is the raw value.
//! A has-one is the child element named after the relation; a has-many is
//! the container child named after the relation, one instance per
//! grandchild.
//!
//! Export clones the residual element, sets or appends every resolved
//! attribute, then deep-copies every resolved relation into place.

pub mod element;

pub use element::Element;

use serde_json::Value as Json;
use std::fmt;

use crate::config::SerializerConfig;
use crate::error::ModelResult;
use crate::model::{BackingStore, Model, Relation};
use crate::schema::Schema;

/// Model over an XML element
pub type XmlModel = Model<TreeStore>;

/// Element tree backing an [`XmlModel`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeStore {
    element: Element,
}

impl TreeStore {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn into_inner(self) -> Element {
        self.element
    }
}

impl From<Element> for TreeStore {
    fn from(element: Element) -> Self {
        Self::new(element)
    }
}

impl BackingStore for TreeStore {
    fn empty(schema: &Schema, root: Option<&str>) -> Self {
        Self::new(Element::new(root.unwrap_or_else(|| schema.root())))
    }

    fn has_attribute(&self, schema: &Schema, name: &str) -> bool {
        if schema.is_node_attribute(name) {
            self.element.attributes.contains_key(name)
        } else {
            self.element.child(name).is_some()
        }
    }

    fn get_attribute(&self, schema: &Schema, name: &str) -> Json {
        let text = if schema.is_node_attribute(name) {
            self.element.attribute(name).map(str::to_string)
        } else {
            self.element.child(name).map(|child| child.text.clone())
        };
        text.map(Json::String).unwrap_or(Json::Null)
    }

    fn on_load_attribute(&mut self, schema: &Schema, name: &str) {
        if schema.is_node_attribute(name) {
            self.element.remove_attribute(name);
        } else {
            self.element.take_child(name);
        }
    }

    fn take_one(&mut self, relation: &str) -> Option<Self> {
        self.element.take_child(relation).map(Self::new)
    }

    fn take_many(&mut self, relation: &str) -> ModelResult<Vec<Self>> {
        let items = self
            .element
            .take_child(relation)
            .map(|container| container.children.into_iter().map(Self::new).collect())
            .unwrap_or_default();
        Ok(items)
    }
}

impl Model<TreeStore> {
    /// Wrap a parsed element; the element's own tag stays the root tag
    pub fn from_element(schema: &'static Schema, element: Element) -> Self {
        Model::new(schema, TreeStore::new(element))
    }

    /// Parse an XML document
    pub fn from_xml_str(schema: &'static Schema, xml: &str) -> ModelResult<Self> {
        Ok(Self::from_element(schema, Element::parse(xml)?))
    }

    /// Empty instance whose root tag is `root`, or the schema's root
    pub fn with_root(schema: &'static Schema, root: Option<&str>) -> Self {
        Model::new(schema, TreeStore::empty(schema, root))
    }

    /// Build from a plain map under an explicit root tag
    pub fn from_plain_with_root(
        schema: &'static Schema,
        plain: serde_json::Map<String, Json>,
        root: Option<&str>,
    ) -> ModelResult<Self> {
        TreeStore::from_plain(schema, plain, root)
    }

    /// Tag of the root element
    pub fn root_name(&self) -> &str {
        &self.store().element().name
    }

    /// Residual element with every resolved attribute and relation merged back
    pub fn to_element(&self) -> Element {
        let schema = self.schema();
        let mut element = self.store().element().clone();

        for (name, value) in self.resolved_attributes() {
            let text = raw_text(self.uncast(name, value));
            if schema.is_node_attribute(name) {
                element.set_attribute(name, text);
            } else {
                element.children.push(Element::new(name).with_text(text));
            }
        }

        for (key, relation) in self.resolved_relations() {
            match relation {
                Relation::One(Some(related)) => {
                    element.append_copy(&related.borrow().to_element());
                }
                Relation::One(None) => {}
                Relation::Many(collection) => {
                    let container = element.child_or_insert(&key.name);
                    for item in collection.borrow().iter() {
                        container.append_copy(&item.borrow().to_element());
                    }
                }
            }
        }

        element
    }

    /// Compact XML without declaration
    pub fn to_xml_string(&self) -> ModelResult<String> {
        self.to_element().to_xml_string()
    }

    /// XML using the printer options in `config`
    pub fn to_xml_string_with(&self, config: &SerializerConfig) -> ModelResult<String> {
        self.to_element().to_xml_string_with(config)
    }
}

impl fmt::Display for Model<TreeStore> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_element(), f)
    }
}

fn raw_text(raw: Json) -> String {
    match raw {
        Json::Null => String::new(),
        Json::String(s) => s,
        other => {
            if other.is_object() || other.is_array() {
                tracing::warn!("Structured value written to XML as JSON text");
            }
            other.to_string()
        }
    }
}
