//! The JSON Schema subset understood by the struct transpiler.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TranspileError;
use crate::openapi::schema::SchemaOrRef;

const COMPONENT_SCHEMAS_PREFIX: &str = "#/components/schemas/";
const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// The `type` keyword: one type or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeValue {
    One(String),
    Many(Vec<String>),
}

/// `items` as a single schema or in tuple form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Items {
    Tuple(Vec<JsonSchema>),
    Single(Box<JsonSchema>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Additional {
    Bool(bool),
    Schema(Box<JsonSchema>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema {
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema_uri: Option<String>,

    #[serde(rename = "$id", alias = "id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_value: Option<TypeValue>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, JsonSchema>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,

    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Additional>,

    #[serde(default, alias = "$defs", skip_serializing_if = "IndexMap::is_empty")]
    pub definitions: IndexMap<String, JsonSchema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl JsonSchema {
    /// Parse a JSON Schema document.
    pub fn parse(bytes: &[u8]) -> Result<JsonSchema, TranspileError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Convert an OpenAPI schema node. Component references are rewritten
    /// to point into `definitions`.
    pub fn from_openapi(node: &SchemaOrRef) -> Result<JsonSchema, TranspileError> {
        let mut value = serde_json::to_value(node)?;
        rewrite_refs(&mut value);
        Ok(serde_json::from_value(value)?)
    }

    /// Declared types in order; the bool is true for a type list with more
    /// than one entry.
    pub fn types(&self) -> (Vec<&str>, bool) {
        match &self.type_value {
            None => (Vec::new(), false),
            Some(TypeValue::One(t)) => (vec![t.as_str()], false),
            Some(TypeValue::Many(ts)) => (ts.iter().map(String::as_str).collect(), ts.len() > 1),
        }
    }
}

fn rewrite_refs(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == "$ref" {
                    if let Value::String(reference) = child {
                        if let Some(name) = reference.strip_prefix(COMPONENT_SCHEMAS_PREFIX) {
                            *reference = format!("{DEFINITIONS_PREFIX}{name}");
                        }
                    }
                } else {
                    rewrite_refs(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(rewrite_refs),
        _ => {}
    }
}
