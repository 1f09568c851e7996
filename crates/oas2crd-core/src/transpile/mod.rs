//! JSON Schema to struct definition transpiler.

pub mod arena;
pub mod jsonschema;
pub mod transpiler;

use indexmap::IndexMap;

use crate::document::Document;
use crate::error::TranspileError;

pub use jsonschema::JsonSchema;
pub use transpiler::{AdditionalFields, FieldDef, FieldType, StructDef, Transpiled, Transpiler};

/// Struct definitions for `schemas`, keyed by type name.
pub fn transpile(
    schemas: impl IntoIterator<Item = JsonSchema>,
) -> Result<IndexMap<String, StructDef>, TranspileError> {
    Ok(Transpiler::new(schemas).run()?.structs)
}

/// Like [`transpile`], with a fallback name for every untitled root.
pub fn transpile_named(
    schemas: impl IntoIterator<Item = (String, JsonSchema)>,
) -> Result<Transpiled, TranspileError> {
    Transpiler::named(schemas).run()
}

/// Transpile the component schemas of a loaded document.
pub fn transpile_document(doc: &Document) -> Result<Transpiled, TranspileError> {
    let mut root = JsonSchema::default();
    for (name, node) in doc.component_schemas().into_iter().flatten() {
        root.definitions
            .insert(name.clone(), JsonSchema::from_openapi(node)?);
    }
    if root.definitions.is_empty() {
        return Ok(Transpiled::default());
    }
    log::debug!("transpiling {} component schemas", root.definitions.len());
    Transpiler::new([root]).run()
}
