//! Serializer configuration
//!
//! Printer options for the string forms of JSON and XML models. The model
//! declarations themselves live in [`crate::schema::Schema`].

use std::env;

use crate::error::{ModelError, ModelResult};

/// Environment variable toggling pretty-printed JSON
pub const ENV_JSON_PRETTY: &str = "DATAMODELS_JSON_PRETTY";
/// Environment variable toggling the `<?xml ...?>` declaration
pub const ENV_XML_DECLARATION: &str = "DATAMODELS_XML_DECLARATION";
/// Environment variable setting the XML indentation width
pub const ENV_XML_INDENT: &str = "DATAMODELS_XML_INDENT";

/// Printer options
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SerializerConfig {
    /// Pretty-print JSON output
    pub json_pretty: bool,
    /// Emit an XML declaration before the root element
    pub xml_declaration: bool,
    /// Indent nested XML elements by this many spaces
    pub xml_indent: Option<usize>,
}

impl SerializerConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> ModelResult<Self> {
        let mut config = Self::default();

        if let Ok(value) = env::var(ENV_JSON_PRETTY) {
            config.json_pretty = parse_bool(ENV_JSON_PRETTY, &value)?;
        }

        if let Ok(value) = env::var(ENV_XML_DECLARATION) {
            config.xml_declaration = parse_bool(ENV_XML_DECLARATION, &value)?;
        }

        if let Ok(value) = env::var(ENV_XML_INDENT) {
            let indent = value.trim().parse::<usize>().map_err(|_| {
                ModelError::Configuration(format!(
                    "{} must be a non-negative integer, got '{}'",
                    ENV_XML_INDENT, value
                ))
            })?;
            config.xml_indent = if indent == 0 { None } else { Some(indent) };
        }

        tracing::debug!("Loaded serializer configuration: {:?}", config);
        Ok(config)
    }

    pub fn with_json_pretty(mut self, pretty: bool) -> Self {
        self.json_pretty = pretty;
        self
    }

    pub fn with_xml_declaration(mut self, declaration: bool) -> Self {
        self.xml_declaration = declaration;
        self
    }

    pub fn with_xml_indent(mut self, indent: Option<usize>) -> Self {
        self.xml_indent = indent;
        self
    }
}

fn parse_bool(field: &str, value: &str) -> ModelResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ModelError::Configuration(format!(
            "{} must be a boolean, got '{}'",
            field, value
        ))),
    }
}
