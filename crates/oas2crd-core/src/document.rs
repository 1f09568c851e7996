use indexmap::IndexMap;

use crate::error::LoadError;
use crate::openapi;
use crate::openapi::components::SecurityScheme;
use crate::openapi::document::{Info, OpenApi};
use crate::openapi::paths::{HttpMethod, Operation, PathItem};
use crate::openapi::schema::{Schema, SchemaOrRef};
use crate::resolve::{RefResolver, SchemaInliner};

/// A parsed OpenAPI document whose references have all been checked.
///
/// Holding a `Document` means loading succeeded: there is no way to obtain
/// one with a dangling reference. Parameters, request bodies and responses
/// are inlined. Schema references stay shared until [`Document::inline_schema`]
/// expands them.
#[derive(Debug, Clone)]
pub struct Document {
    resolved: OpenApi,
}

impl Document {
    /// Parse raw bytes (JSON or YAML) and resolve every reference.
    pub fn load(bytes: &[u8]) -> Result<Document, LoadError> {
        let source = openapi::from_slice(bytes)?;
        Self::from_openapi(source)
    }

    /// Resolve an already parsed document.
    pub fn from_openapi(source: OpenApi) -> Result<Document, LoadError> {
        let resolved = RefResolver::new(&source)
            .resolve_document(&source)
            .map_err(LoadError::Unresolved)?;
        log::debug!(
            "loaded OpenAPI {} document '{}' with {} paths",
            resolved.openapi,
            resolved.info.title,
            resolved.paths.len()
        );
        Ok(Document { resolved })
    }

    pub fn info(&self) -> &Info {
        &self.resolved.info
    }

    /// Look up a path item by its literal path string.
    pub fn path_item(&self, path: &str) -> Option<&PathItem> {
        self.resolved.paths.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = (&String, &PathItem)> {
        self.resolved.paths.iter()
    }

    /// Operations declared at `path`, in method order. Empty if the path is unknown.
    pub fn operations(&self, path: &str) -> Vec<(HttpMethod, &Operation)> {
        self.path_item(path)
            .map(|item| item.operations().collect())
            .unwrap_or_default()
    }

    /// Security schemes in declaration order.
    pub fn security_schemes(&self) -> impl Iterator<Item = (&String, &SecurityScheme)> {
        self.resolved
            .components
            .iter()
            .flat_map(|c| c.security_schemes.iter())
    }

    /// Component schemas as written, with their references intact.
    pub fn component_schemas(&self) -> Option<&IndexMap<String, SchemaOrRef>> {
        self.resolved.components.as_ref().map(|c| &c.schemas)
    }

    /// An inliner over this document's components. Reuse one across several
    /// nodes to expand each shared component only once.
    pub fn inliner(&self) -> SchemaInliner<'_> {
        SchemaInliner::new(&self.resolved)
    }

    /// A standalone copy of `node` with every reference expanded.
    pub fn inline_schema(&self, node: &SchemaOrRef) -> Schema {
        self.inliner().inline(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
openapi: 3.0.3
info:
  title: Widgets
  version: "1.0"
paths:
  /widgets:
    get:
      responses:
        "200":
          description: ok
    post:
      responses:
        "201":
          description: created
components:
  securitySchemes:
    basic:
      type: http
      scheme: basic
    key:
      type: apiKey
      name: X-Key
      in: header
"#;

    #[test]
    fn test_load_yaml() {
        let doc = Document::load(MINIMAL.as_bytes()).unwrap();
        assert_eq!(doc.info().title, "Widgets");
        assert!(doc.path_item("/widgets").is_some());
        assert!(doc.path_item("/widgets/").is_none());
    }

    #[test]
    fn test_load_json() {
        let json = r#"{"openapi":"3.1.0","info":{"title":"J","version":"1"},"paths":{}}"#;
        let doc = Document::load(json.as_bytes()).unwrap();
        assert_eq!(doc.info().title, "J");
    }

    #[test]
    fn test_operations_in_method_order() {
        let doc = Document::load(MINIMAL.as_bytes()).unwrap();
        let methods: Vec<HttpMethod> = doc.operations("/widgets").into_iter().map(|(m, _)| m).collect();
        assert_eq!(methods, vec![HttpMethod::Get, HttpMethod::Post]);
        assert!(doc.operations("/missing").is_empty());
    }

    #[test]
    fn test_security_schemes_in_declaration_order() {
        let doc = Document::load(MINIMAL.as_bytes()).unwrap();
        let names: Vec<&String> = doc.security_schemes().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["basic", "key"]);
    }

    #[test]
    fn test_swagger_two_is_rejected() {
        let yaml = "openapi: \"2.0\"\ninfo: {title: t, version: '1'}\npaths: {}\n";
        assert!(matches!(
            Document::load(yaml.as_bytes()),
            Err(LoadError::Parse(_))
        ));
    }
}
