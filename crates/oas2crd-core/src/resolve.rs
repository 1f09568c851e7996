use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::error::{ResolveError, ResolveErrors};
use crate::openapi::components::Components;
use crate::openapi::document::OpenApi;
use crate::openapi::paths::{
    HttpMethod, MediaType, Operation, Parameter, ParameterOrRef, PathItem, RequestBody,
    RequestBodyOrRef, Response, ResponseOrRef,
};
use crate::openapi::schema::{AdditionalProperties, Schema, SchemaOrRef};

/// Kubernetes keyword that lets a field hold any value.
pub const PRESERVE_UNKNOWN_FIELDS: &str = "x-kubernetes-preserve-unknown-fields";

/// Stand-in for a schema reference that points back into its own ancestry.
pub fn open_object() -> Schema {
    let mut schema = Schema::object();
    schema
        .extensions
        .insert(PRESERVE_UNKNOWN_FIELDS.to_string(), serde_json::Value::Bool(true));
    schema
}

/// Resolves the `$ref` pointers of an OpenAPI document.
///
/// Parameter, request body and response references are replaced by their
/// targets. Schema references are checked but kept, so shared schemas stay
/// shared; [`SchemaInliner`] expands them on demand. Every failing reference
/// is recorded and the walk continues, so a single pass reports all of them.
pub struct RefResolver<'a> {
    components: Option<&'a Components>,
    location: Vec<String>,
    errors: Vec<ResolveError>,
}

impl<'a> RefResolver<'a> {
    pub fn new(doc: &'a OpenApi) -> Self {
        Self {
            components: doc.components.as_ref(),
            location: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Resolve the whole document. Fails with every unresolved reference.
    pub fn resolve_document(mut self, doc: &OpenApi) -> Result<OpenApi, ResolveErrors> {
        let mut resolved = doc.clone();

        self.location.push("paths".to_string());
        for (path, item) in &mut resolved.paths {
            self.location.push(path.clone());
            self.resolve_path_item(item);
            self.location.pop();
        }
        self.location.pop();

        if let Some(ref mut components) = resolved.components {
            self.location.push("components".to_string());
            self.resolve_components(components);
            self.location.pop();
        }

        if self.errors.is_empty() {
            Ok(resolved)
        } else {
            Err(ResolveErrors(self.errors))
        }
    }

    fn resolve_components(&mut self, components: &mut Components) {
        self.location.push("schemas".to_string());
        for (name, schema) in &components.schemas {
            self.location.push(name.clone());
            self.check_schema_or_ref(schema);
            self.location.pop();
        }
        self.location.pop();

        self.location.push("parameters".to_string());
        for (name, param) in &mut components.parameters {
            self.location.push(name.clone());
            *param = self.resolve_parameter_or_ref(param);
            self.location.pop();
        }
        self.location.pop();

        self.location.push("requestBodies".to_string());
        for (name, body) in &mut components.request_bodies {
            self.location.push(name.clone());
            *body = self.resolve_request_body_or_ref(body);
            self.location.pop();
        }
        self.location.pop();

        self.location.push("responses".to_string());
        for (name, resp) in &mut components.responses {
            self.location.push(name.clone());
            *resp = self.resolve_response_or_ref(resp);
            self.location.pop();
        }
        self.location.pop();
    }

    fn resolve_path_item(&mut self, item: &mut PathItem) {
        self.location.push("parameters".to_string());
        item.parameters = self.resolve_parameters(&item.parameters);
        self.location.pop();

        for method in HttpMethod::ALL {
            if let Some(op) = item.operation_mut(method) {
                self.location.push(method.key().to_string());
                self.resolve_operation(op);
                self.location.pop();
            }
        }
    }

    fn resolve_operation(&mut self, op: &mut Operation) {
        self.location.push("parameters".to_string());
        op.parameters = self.resolve_parameters(&op.parameters);
        self.location.pop();

        if let Some(ref body) = op.request_body {
            self.location.push("requestBody".to_string());
            let resolved = self.resolve_request_body_or_ref(body);
            op.request_body = Some(resolved);
            self.location.pop();
        }

        self.location.push("responses".to_string());
        let mut resolved_responses = IndexMap::new();
        for (status, resp) in &op.responses {
            self.location.push(status.clone());
            resolved_responses.insert(status.clone(), self.resolve_response_or_ref(resp));
            self.location.pop();
        }
        op.responses = resolved_responses;
        self.location.pop();
    }

    fn resolve_parameters(&mut self, params: &[ParameterOrRef]) -> Vec<ParameterOrRef> {
        params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                self.location.push(i.to_string());
                let resolved = self.resolve_parameter_or_ref(p);
                self.location.pop();
                resolved
            })
            .collect()
    }

    /// Check that every reference under `schema_or_ref` has a target.
    ///
    /// A target is checked where it is declared, never through its users, so
    /// each component is walked once however often it is referenced.
    fn check_schema_or_ref(&mut self, schema_or_ref: &SchemaOrRef) {
        match schema_or_ref {
            SchemaOrRef::Ref { ref_path, .. } => {
                if let Err(err) = self.lookup_schema(ref_path) {
                    self.record(err);
                }
            }
            SchemaOrRef::Schema(schema) => self.check_schema(schema),
        }
    }

    fn check_schema(&mut self, schema: &Schema) {
        self.location.push("properties".to_string());
        for (name, prop) in &schema.properties {
            self.location.push(name.clone());
            self.check_schema_or_ref(prop);
            self.location.pop();
        }
        self.location.pop();

        if let Some(ref items) = schema.items {
            self.location.push("items".to_string());
            self.check_schema_or_ref(items);
            self.location.pop();
        }

        if let Some(ref not) = schema.not {
            self.location.push("not".to_string());
            self.check_schema_or_ref(not);
            self.location.pop();
        }

        self.check_list("allOf", &schema.all_of);
        self.check_list("oneOf", &schema.one_of);
        self.check_list("anyOf", &schema.any_of);

        if let Some(AdditionalProperties::Schema(ref s)) = schema.additional_properties {
            self.location.push("additionalProperties".to_string());
            self.check_schema_or_ref(s);
            self.location.pop();
        }
    }

    fn check_list(&mut self, keyword: &str, list: &[SchemaOrRef]) {
        self.location.push(keyword.to_string());
        for (i, s) in list.iter().enumerate() {
            self.location.push(i.to_string());
            self.check_schema_or_ref(s);
            self.location.pop();
        }
        self.location.pop();
    }

    // A referenced parameter, body or response is checked where it is
    // declared under `components`, so only inline ones are walked here.

    fn resolve_parameter_or_ref(&mut self, param: &ParameterOrRef) -> ParameterOrRef {
        match param {
            ParameterOrRef::Ref { ref_path } => match self.lookup_parameter(ref_path) {
                Ok(p) => ParameterOrRef::Parameter(p),
                Err(err) => {
                    self.record(err);
                    param.clone()
                }
            },
            ParameterOrRef::Parameter(p) => {
                if let Some(ref s) = p.schema {
                    self.location.push("schema".to_string());
                    self.check_schema_or_ref(s);
                    self.location.pop();
                }
                param.clone()
            }
        }
    }

    fn resolve_request_body_or_ref(&mut self, body: &RequestBodyOrRef) -> RequestBodyOrRef {
        match body {
            RequestBodyOrRef::Ref { ref_path } => match self.lookup_request_body(ref_path) {
                Ok(rb) => RequestBodyOrRef::RequestBody(rb),
                Err(err) => {
                    self.record(err);
                    body.clone()
                }
            },
            RequestBodyOrRef::RequestBody(rb) => {
                self.check_media_types(&rb.content);
                body.clone()
            }
        }
    }

    fn resolve_response_or_ref(&mut self, resp: &ResponseOrRef) -> ResponseOrRef {
        match resp {
            ResponseOrRef::Ref { ref_path } => match self.lookup_response(ref_path) {
                Ok(r) => ResponseOrRef::Response(r),
                Err(err) => {
                    self.record(err);
                    resp.clone()
                }
            },
            ResponseOrRef::Response(r) => {
                self.check_media_types(&r.content);
                resp.clone()
            }
        }
    }

    fn check_media_types(&mut self, content: &IndexMap<String, MediaType>) {
        self.location.push("content".to_string());
        for (key, mt) in content {
            if let Some(ref s) = mt.schema {
                self.location.push(key.clone());
                self.location.push("schema".to_string());
                self.check_schema_or_ref(s);
                self.location.pop();
                self.location.pop();
            }
        }
        self.location.pop();
    }

    fn record(&mut self, err: ResolveError) {
        if !self.errors.contains(&err) {
            self.errors.push(err);
        }
    }

    /// JSON pointer of the node currently being resolved.
    fn pointer(&self) -> String {
        let mut out = String::from("#");
        for segment in &self.location {
            out.push('/');
            out.push_str(&segment.replace('~', "~0").replace('/', "~1"));
        }
        out
    }

    // Lookup helpers

    fn lookup_schema(&self, ref_path: &str) -> Result<&'a Schema, ResolveError> {
        let mut current: &str = ref_path;
        let mut hops: HashSet<&str> = HashSet::new();
        loop {
            let name = self.parse_ref_name(current, "schemas")?;
            if !hops.insert(current) {
                // A chain of bare references that never reaches a schema.
                return Err(self.not_found(ref_path));
            }
            match self.components.and_then(|c| c.schemas.get(&name)) {
                Some(SchemaOrRef::Schema(schema)) => return Ok(&**schema),
                Some(SchemaOrRef::Ref { ref_path: inner, .. }) => current = inner.as_str(),
                None => return Err(self.not_found(ref_path)),
            }
        }
    }

    fn lookup_parameter(&self, ref_path: &str) -> Result<Parameter, ResolveError> {
        let name = self.parse_ref_name(ref_path, "parameters")?;
        self.components
            .and_then(|c| c.parameters.get(&name))
            .and_then(|p| match p {
                ParameterOrRef::Parameter(param) => Some(param.clone()),
                _ => None,
            })
            .ok_or_else(|| self.not_found(ref_path))
    }

    fn lookup_request_body(&self, ref_path: &str) -> Result<RequestBody, ResolveError> {
        let name = self.parse_ref_name(ref_path, "requestBodies")?;
        self.components
            .and_then(|c| c.request_bodies.get(&name))
            .and_then(|rb| match rb {
                RequestBodyOrRef::RequestBody(body) => Some(body.clone()),
                _ => None,
            })
            .ok_or_else(|| self.not_found(ref_path))
    }

    fn lookup_response(&self, ref_path: &str) -> Result<Response, ResolveError> {
        let name = self.parse_ref_name(ref_path, "responses")?;
        self.components
            .and_then(|c| c.responses.get(&name))
            .and_then(|r| match r {
                ResponseOrRef::Response(resp) => Some(resp.clone()),
                _ => None,
            })
            .ok_or_else(|| self.not_found(ref_path))
    }

    fn not_found(&self, ref_path: &str) -> ResolveError {
        ResolveError::RefTargetNotFound {
            reference: ref_path.to_string(),
            location: self.pointer(),
        }
    }

    /// Parse a `$ref` like `#/components/schemas/Foo` and extract the name.
    fn parse_ref_name(&self, ref_path: &str, expected_section: &str) -> Result<String, ResolveError> {
        if !ref_path.starts_with('#') {
            return Err(ResolveError::External {
                reference: ref_path.to_string(),
                location: self.pointer(),
            });
        }
        let invalid = || ResolveError::InvalidRefFormat {
            reference: ref_path.to_string(),
            location: self.pointer(),
        };
        let stripped = ref_path.strip_prefix("#/components/").ok_or_else(invalid)?;
        let (section, name) = stripped.split_once('/').ok_or_else(invalid)?;
        if section != expected_section || name.is_empty() {
            return Err(invalid());
        }
        Ok(name.replace("~1", "/").replace("~0", "~"))
    }
}

/// Expands schema references into standalone value trees.
///
/// Each component is expanded once and then reused, so a schema shared by
/// many properties costs one walk. A reference back into the chain being
/// expanded becomes [`open_object`] with a warning; results that contain
/// such a cut depend on where the walk entered the cycle and are not reused.
pub struct SchemaInliner<'a> {
    schemas: Option<&'a IndexMap<String, SchemaOrRef>>,
    expanded: HashMap<String, Schema>,
    in_progress: HashSet<String>,
    cuts: usize,
}

impl<'a> SchemaInliner<'a> {
    pub fn new(doc: &'a OpenApi) -> Self {
        Self {
            schemas: doc.components.as_ref().map(|c| &c.schemas),
            expanded: HashMap::new(),
            in_progress: HashSet::new(),
            cuts: 0,
        }
    }

    /// A copy of `node` with no reference left in it.
    pub fn inline(&mut self, node: &SchemaOrRef) -> Schema {
        match node {
            SchemaOrRef::Ref {
                ref_path,
                description,
            } => {
                let mut schema = self.inline_ref(ref_path);
                if description.is_some() {
                    schema.description = description.clone();
                }
                schema
            }
            SchemaOrRef::Schema(schema) => self.inline_schema(schema),
        }
    }

    fn inline_ref(&mut self, ref_path: &str) -> Schema {
        if let Some(schema) = self.expanded.get(ref_path) {
            return schema.clone();
        }
        if self.in_progress.contains(ref_path) {
            log::warn!("recursive reference {ref_path} replaced by an object with unknown fields");
            self.cuts += 1;
            return open_object();
        }
        let Some(target) = self.target(ref_path) else {
            // Documents are checked at load, so this only happens for hand-built models.
            log::warn!("reference {ref_path} has no target, replaced by an object with unknown fields");
            return open_object();
        };

        self.in_progress.insert(ref_path.to_string());
        let cuts = self.cuts;
        let schema = self.inline_schema(target);
        self.in_progress.remove(ref_path);
        if self.cuts == cuts {
            self.expanded.insert(ref_path.to_string(), schema.clone());
        }
        schema
    }

    fn inline_schema(&mut self, schema: &Schema) -> Schema {
        let mut out = schema.clone();
        out.properties = schema
            .properties
            .iter()
            .map(|(name, prop)| (name.clone(), SchemaOrRef::from(self.inline(prop))))
            .collect();
        if let Some(ref items) = schema.items {
            out.items = Some(Box::new(SchemaOrRef::from(self.inline(items))));
        }
        if let Some(ref not) = schema.not {
            out.not = Some(Box::new(SchemaOrRef::from(self.inline(not))));
        }
        out.all_of = schema.all_of.iter().map(|s| SchemaOrRef::from(self.inline(s))).collect();
        out.one_of = schema.one_of.iter().map(|s| SchemaOrRef::from(self.inline(s))).collect();
        out.any_of = schema.any_of.iter().map(|s| SchemaOrRef::from(self.inline(s))).collect();
        if let Some(AdditionalProperties::Schema(ref s)) = schema.additional_properties {
            out.additional_properties = Some(AdditionalProperties::Schema(Box::new(
                SchemaOrRef::from(self.inline(s)),
            )));
        }
        out
    }

    /// Follow a chain of bare references to the schema it ends at.
    fn target(&self, ref_path: &str) -> Option<&'a Schema> {
        let schemas = self.schemas?;
        let mut current = ref_path;
        let mut hops = HashSet::new();
        while hops.insert(current) {
            let name = current.strip_prefix("#/components/schemas/")?;
            let name = name.replace("~1", "/").replace("~0", "~");
            match schemas.get(&name)? {
                SchemaOrRef::Schema(schema) => return Some(&**schema),
                SchemaOrRef::Ref { ref_path, .. } => current = ref_path,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi;

    fn resolve(yaml: &str) -> Result<OpenApi, ResolveErrors> {
        let doc = openapi::from_yaml(yaml).unwrap();
        RefResolver::new(&doc).resolve_document(&doc)
    }

    fn inline_component(doc: &OpenApi, name: &str) -> Schema {
        let node = SchemaOrRef::reference(format!("#/components/schemas/{name}"));
        SchemaInliner::new(doc).inline(&node)
    }

    #[test]
    fn test_follows_reference_chains() {
        let yaml = r#"
openapi: 3.0.3
info: { title: t, version: "1" }
paths: {}
components:
  schemas:
    Alias:
      $ref: '#/components/schemas/Target'
    Target:
      type: string
"#;
        let doc = resolve(yaml).unwrap();
        let alias = &doc.components.as_ref().unwrap().schemas["Alias"];
        assert_eq!(alias.ref_path(), Some("#/components/schemas/Target"));
        assert_eq!(inline_component(&doc, "Alias"), Schema::string());
    }

    #[test]
    fn test_collects_every_missing_reference() {
        let yaml = r#"
openapi: 3.0.3
info: { title: t, version: "1" }
paths:
  /a:
    post:
      requestBody:
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Missing'
      parameters:
        - $ref: '#/components/parameters/Nope'
"#;
        let errs = resolve(yaml).unwrap_err();
        assert_eq!(errs.0.len(), 2);
        assert!(errs.0.iter().any(|e| e.reference() == "#/components/schemas/Missing"));
        assert!(errs.0.iter().any(|e| e.reference() == "#/components/parameters/Nope"));
    }

    #[test]
    fn test_reports_location_of_failing_reference() {
        let yaml = r#"
openapi: 3.0.3
info: { title: t, version: "1" }
paths: {}
components:
  schemas:
    Pet:
      properties:
        owner:
          $ref: '#/components/schemas/Owner'
"#;
        let errs = resolve(yaml).unwrap_err();
        assert_eq!(
            errs.0[0],
            ResolveError::RefTargetNotFound {
                reference: "#/components/schemas/Owner".to_string(),
                location: "#/components/schemas/Pet/properties/owner".to_string(),
            }
        );
    }

    #[test]
    fn test_external_reference_is_an_error() {
        let yaml = r#"
openapi: 3.0.3
info: { title: t, version: "1" }
paths: {}
components:
  schemas:
    Pet:
      $ref: 'other.yaml#/components/schemas/Pet'
"#;
        let errs = resolve(yaml).unwrap_err();
        assert!(matches!(errs.0[0], ResolveError::External { .. }));
    }

    #[test]
    fn test_recursive_reference_becomes_open_object() {
        let yaml = r#"
openapi: 3.0.3
info: { title: t, version: "1" }
paths: {}
components:
  schemas:
    Node:
      type: object
      properties:
        value:
          type: integer
        next:
          $ref: '#/components/schemas/Node'
"#;
        let doc = resolve(yaml).unwrap();
        let node = inline_component(&doc, "Node");
        assert!(node.properties["value"].as_schema().is_some());
        let next = node.properties["next"].as_schema().unwrap();
        assert_eq!(next, &open_object());
        insta::assert_snapshot!(
            serde_json::to_string(next).unwrap(),
            @r#"{"type":"object","x-kubernetes-preserve-unknown-fields":true}"#
        );
    }

    #[test]
    fn test_shared_component_is_expanded_once() {
        let yaml = r#"
openapi: 3.0.3
info: { title: t, version: "1" }
paths: {}
components:
  schemas:
    Pair:
      type: object
      properties:
        left:
          $ref: '#/components/schemas/Leaf'
        right:
          $ref: '#/components/schemas/Leaf'
    Leaf:
      type: string
"#;
        let doc = resolve(yaml).unwrap();
        let mut inliner = SchemaInliner::new(&doc);
        let pair = inliner.inline(&SchemaOrRef::reference("#/components/schemas/Pair"));
        assert_eq!(inliner.expanded.len(), 2);
        assert_eq!(pair.properties["left"], pair.properties["right"]);
        assert_eq!(pair.properties["left"].as_schema(), Some(&Schema::string()));
    }

    #[test]
    fn test_reference_description_overrides_target() {
        let yaml = r#"
openapi: 3.1.0
info: { title: t, version: "1" }
paths: {}
components:
  schemas:
    Owner:
      type: object
      properties:
        pet:
          $ref: '#/components/schemas/Pet'
          description: The pet this owner walks
    Pet:
      type: string
      description: A pet
"#;
        let doc = resolve(yaml).unwrap();
        let owner = inline_component(&doc, "Owner");
        let pet = owner.properties["pet"].as_schema().unwrap();
        assert_eq!(pet.description.as_deref(), Some("The pet this owner walks"));
        assert_eq!(inline_component(&doc, "Pet").description.as_deref(), Some("A pet"));
    }
}
