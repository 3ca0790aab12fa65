use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;

/// Name, description and JSON Schema of a tool as offered to a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Derives the parameter schema from `P` with nested types inlined.
    pub fn for_params<P: JsonSchema>(name: impl Into<String>, description: impl Into<String>) -> Self {
        let generator = SchemaSettings::draft07()
            .with(|settings| {
                settings.inline_subschemas = true;
                settings.meta_schema = None;
            })
            .into_generator();
        let schema = generator.into_root_schema_for::<P>();
        let parameters =
            serde_json::to_value(schema).unwrap_or_else(|_| json!({ "type": "object" }));

        Self::new(name, description, parameters)
    }
}

/// Typed tool arguments.
///
/// Deserialization covers structure; `validate` adds the semantic checks a
/// JSON Schema cannot express.
pub trait ToolParams: DeserializeOwned + JsonSchema + Clone + Send + Sync + 'static {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Closed set of tool names a registry is keyed by.
pub trait ToolKind:
    Copy + Eq + Hash + Debug + Display + FromStr + Send + Sync + 'static
{
}

impl<T> ToolKind for T where T: Copy + Eq + Hash + Debug + Display + FromStr + Send + Sync + 'static {}
