//! Serde model of the parts of an OpenAPI 3.x document the generator reads.

pub mod components;
pub mod document;
pub mod paths;
pub mod schema;

use crate::error::ParseError;
use document::OpenApi;

/// Parse an OpenAPI document from YAML.
pub fn from_yaml(input: &str) -> Result<OpenApi, ParseError> {
    let doc: OpenApi = serde_yaml_ng::from_str(input)?;
    validate_version(&doc)?;
    Ok(doc)
}

/// Parse an OpenAPI document from JSON.
pub fn from_json(input: &str) -> Result<OpenApi, ParseError> {
    let doc: OpenApi = serde_json::from_str(input)?;
    validate_version(&doc)?;
    Ok(doc)
}

/// Parse raw document bytes, picking JSON when the content opens with `{`
/// and YAML otherwise.
pub fn from_slice(input: &[u8]) -> Result<OpenApi, ParseError> {
    let text = std::str::from_utf8(input)?;
    if text.trim_start().starts_with('{') {
        from_json(text)
    } else {
        from_yaml(text)
    }
}

fn validate_version(doc: &OpenApi) -> Result<(), ParseError> {
    if !doc.openapi.starts_with("3.") {
        return Err(ParseError::UnsupportedVersion(doc.openapi.clone()));
    }
    Ok(())
}
