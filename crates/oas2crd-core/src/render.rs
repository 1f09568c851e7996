//! Schema nodes to portable JSON Schema bytes.
//!
//! Output is a pure function of the tree: properties keep insertion order
//! and absent keywords are omitted, so equal trees render identical bytes.

use crate::error::RenderError;
use crate::openapi::schema::Schema;

/// Compact JSON rendering.
pub fn render(schema: &Schema) -> Result<Vec<u8>, RenderError> {
    Ok(serde_json::to_vec(schema)?)
}

/// Indented JSON rendering, for files meant to be read by people.
pub fn render_pretty(schema: &Schema) -> Result<Vec<u8>, RenderError> {
    let mut out = serde_json::to_vec_pretty(schema)?;
    out.push(b'\n');
    Ok(out)
}

/// Re-render compact schema bytes with indentation.
pub fn prettify(bytes: &[u8]) -> Result<Vec<u8>, RenderError> {
    let schema: Schema = serde_json::from_slice(bytes)?;
    render_pretty(&schema)
}
