use crate::error::SynthesisError;
use crate::openapi::schema::Schema;
use crate::render;

/// Status schema exposing the remote identifier as a string field.
pub fn build_status_schema(identifier: &str) -> Result<Vec<u8>, SynthesisError> {
    let schema = Schema::object().with_property(identifier, Schema::string());
    render::render(&schema).map_err(|source| SynthesisError::Render {
        context: format!("status {identifier}"),
        source,
    })
}
