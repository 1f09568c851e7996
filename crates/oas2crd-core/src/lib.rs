pub mod config;
pub mod document;
pub mod error;
pub mod naming;
pub mod openapi;
pub mod render;
pub mod resolve;
pub mod resource;
pub mod security;
pub mod synth;
pub mod transpile;

pub use document::Document;
pub use resource::{ResourceDescriptor, VerbDescriptor};
pub use synth::{GeneratedSchemaSet, generate_schema_set};

/// A generated file with path and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub content: Vec<u8>,
}
