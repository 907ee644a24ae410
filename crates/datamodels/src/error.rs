//! Error types for the data model system
//!
//! Absence is never an error: missing attributes, missing relation
//! sub-structures and empty has-many containers all resolve to empty
//! results. The variants below cover contract violations at construction
//! or assignment time and failures surfaced by the document parsers.

use thiserror::Error;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error types for model operations
#[derive(Debug, Error)]
pub enum ModelError {
    /// A relation was assigned a value of an unsupported shape
    #[error("Invalid value for relation '{relation}': expected {expected} but {given} given")]
    InvalidRelationValue {
        relation: String,
        expected: String,
        given: String,
    },

    /// A plain attribute was assigned a model, collection or tree node
    #[error("Invalid value for attribute '{attribute}': {given} given")]
    InvalidAttributeValue { attribute: String, given: String },

    /// The name is not a relation of the requested kind
    #[error("Model '{model}' has no {kind} relation '{relation}'")]
    UnknownRelation {
        model: String,
        relation: String,
        kind: String,
    },

    /// A relation name was read or written as a plain attribute
    #[error("'{name}' is a relation on model '{model}', not an attribute")]
    NotAnAttribute { model: String, name: String },

    /// The schema declares a closed attribute set and the name is outside it
    #[error("Unknown attribute '{attribute}' on model '{model}'")]
    UnknownAttribute { model: String, attribute: String },

    /// A cast strategy could not convert the raw value
    #[error("Cannot cast attribute '{attribute}' as {cast}: {value}")]
    Cast {
        attribute: String,
        cast: String,
        value: String,
    },

    /// JSON parsing or printing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML parsing or printing error
    #[error("XML error: {0}")]
    Xml(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ModelError {
    pub(crate) fn invalid_relation(
        relation: &str,
        expected: impl Into<String>,
        given: impl Into<String>,
    ) -> Self {
        ModelError::InvalidRelationValue {
            relation: relation.to_string(),
            expected: expected.into(),
            given: given.into(),
        }
    }
}

impl From<quick_xml::Error> for ModelError {
    fn from(err: quick_xml::Error) -> Self {
        ModelError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ModelError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        ModelError::Xml(err.to_string())
    }
}
