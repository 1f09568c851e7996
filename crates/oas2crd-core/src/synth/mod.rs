//! Synthesis of the spec, status and auth schemas of a managed resource.

pub mod getter;
pub mod spec;
pub mod status;

use indexmap::IndexMap;

use crate::document::Document;
use crate::error::{SynthesisError, SynthesisWarning};
use crate::resource::ResourceDescriptor;
use crate::security;
use crate::GeneratedFile;

pub use getter::{
    AuthSchemaGetter, JsonSchemaGetter, SpecSchemaGetter, StaticSchemaGetter, StatusSchemaGetter,
};
pub use spec::{AUTHENTICATION_REFS, build_spec_schema, supported_schemes};
pub use status::build_status_schema;

/// Every schema generated for one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSchemaSet {
    kind: String,
    spec: Option<Vec<u8>>,
    status: Vec<u8>,
    auth: IndexMap<String, Vec<u8>>,
    warnings: Vec<SynthesisWarning>,
}

impl GeneratedSchemaSet {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Spec schema stored under `kind`.
    pub fn spec_schema(&self, kind: &str) -> Option<&[u8]> {
        if kind == self.kind {
            self.spec.as_deref()
        } else {
            None
        }
    }

    pub fn status_schema(&self) -> &[u8] {
        &self.status
    }

    /// Credentials schema for a canonical scheme name such as `BasicAuth`.
    pub fn auth_schema(&self, name: &str) -> Option<&[u8]> {
        self.auth.get(name).map(Vec::as_slice)
    }

    pub fn auth_schemas(&self) -> &IndexMap<String, Vec<u8>> {
        &self.auth
    }

    pub fn warnings(&self) -> &[SynthesisWarning] {
        &self.warnings
    }

    /// Files for this set, relative to an output directory: the spec and
    /// status schemas under `<kind>/`, credentials under `auth/`.
    pub fn files(&self) -> Vec<GeneratedFile> {
        let mut files = Vec::new();
        if let Some(spec) = &self.spec {
            files.push(GeneratedFile {
                path: format!("{}/spec.schema.json", self.kind),
                content: spec.clone(),
            });
        }
        files.push(GeneratedFile {
            path: format!("{}/status.schema.json", self.kind),
            content: self.status.clone(),
        });
        for (name, content) in &self.auth {
            files.push(GeneratedFile {
                path: format!("auth/{name}.schema.json"),
                content: content.clone(),
            });
        }
        files
    }
}

/// Synthesize the full schema set of `resource`.
///
/// The document is only read, so the same one can serve any number of
/// resources.
pub fn generate_schema_set(
    doc: &Document,
    resource: &ResourceDescriptor,
) -> Result<GeneratedSchemaSet, SynthesisError> {
    let (spec, mut warnings) = build_spec_schema(doc, resource)?;
    let status = build_status_schema(&resource.identifier)?;

    let mut auth = IndexMap::new();
    for (name, scheme) in doc.security_schemes() {
        let Ok(canonical) = security::canonical_name(scheme) else {
            // already reported while building the spec schema
            continue;
        };
        match security::build_auth_schema(scheme) {
            Ok(bytes) => {
                auth.insert(canonical.to_string(), bytes);
            }
            Err(source) => {
                let warning = SynthesisWarning::SecurityScheme {
                    name: name.clone(),
                    source,
                };
                log::warn!("{warning}");
                warnings.push(warning);
            }
        }
    }

    log::debug!(
        "resource {}: spec {}, {} auth schemas, {} warnings",
        resource.kind,
        if spec.is_some() { "generated" } else { "skipped" },
        auth.len(),
        warnings.len()
    );

    Ok(GeneratedSchemaSet {
        kind: resource.kind.clone(),
        spec,
        status,
        auth,
        warnings,
    })
}
