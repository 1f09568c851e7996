//! Spec schema synthesis: the create request body of a resource, extended
//! with credential references and the parameters of its path.

use indexmap::IndexMap;

use crate::document::Document;
use crate::error::{SynthesisError, SynthesisWarning};
use crate::naming::{capitalize_first, lower_first};
use crate::openapi::paths::Parameter;
use crate::openapi::schema::{Schema, SchemaOrRef};
use crate::render;
use crate::resolve::SchemaInliner;
use crate::resource::ResourceDescriptor;
use crate::security::AuthKind;

pub const AUTHENTICATION_REFS: &str = "authenticationRefs";

const AUTHENTICATION_REFS_DESCRIPTION: &str = "AuthenticationRefs represent the reference to a CR containing the authentication information. One authentication method must be set.";

/// Supported security schemes of the document, keyed by canonical name in
/// declaration order, and a warning for every scheme left out.
pub fn supported_schemes(doc: &Document) -> (IndexMap<&'static str, AuthKind>, Vec<SynthesisWarning>) {
    let mut schemes = IndexMap::new();
    let mut warnings = Vec::new();
    for (name, scheme) in doc.security_schemes() {
        match AuthKind::classify(scheme) {
            Ok(kind) => {
                schemes.insert(kind.canonical_name(), kind);
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
    (schemes, warnings)
}

/// Build the spec schema of `resource` from its create/POST verb.
///
/// Returns `None` when the resource has no create/POST verb. When several
/// qualify, the last one wins.
pub fn build_spec_schema(
    doc: &Document,
    resource: &ResourceDescriptor,
) -> Result<(Option<Vec<u8>>, Vec<SynthesisWarning>), SynthesisError> {
    let (schemes, mut warnings) = supported_schemes(doc);
    let mut spec: Option<Vec<u8>> = None;

    for verb in resource.create_verbs() {
        let schema = synthesize(doc, &verb.path, &schemes, &mut warnings)?;
        let bytes = render::render(&schema).map_err(|source| SynthesisError::Render {
            context: verb.path.clone(),
            source,
        })?;
        if spec.replace(bytes).is_some() {
            log::warn!(
                "resource {}: spec schema from {} {} overwrites an earlier create verb",
                resource.kind,
                verb.method,
                verb.path
            );
        }
    }

    if spec.is_none() {
        log::debug!("resource {} has no create verb, no spec schema", resource.kind);
    }
    Ok((spec, warnings))
}

fn synthesize(
    doc: &Document,
    path: &str,
    schemes: &IndexMap<&'static str, AuthKind>,
    warnings: &mut Vec<SynthesisWarning>,
) -> Result<Schema, SynthesisError> {
    let mut inliner = doc.inliner();
    let mut body = body_schema(doc, &mut inliner, path)?;
    inject_authentication_refs(&mut body, schemes, path)?;
    merge_parameters(doc, &mut inliner, path, &mut body, warnings)?;
    Ok(body)
}

/// A private, fully inlined copy of the POST body schema at `path`.
fn body_schema(
    doc: &Document,
    inliner: &mut SchemaInliner<'_>,
    path: &str,
) -> Result<Schema, SynthesisError> {
    let item = doc
        .path_item(path)
        .ok_or_else(|| SynthesisError::PathNotFound(path.to_string()))?;
    let post = item
        .post
        .as_ref()
        .ok_or_else(|| SynthesisError::BodySchemaNotFound(path.to_string()))?;

    match post.json_body_schema() {
        None => Ok(Schema::object()),
        Some(Some(node)) => Ok(inliner.inline(node)),
        Some(None) => Err(SynthesisError::BodySchemaNotFound(path.to_string())),
    }
}

fn inject_authentication_refs(
    body: &mut Schema,
    schemes: &IndexMap<&'static str, AuthKind>,
    path: &str,
) -> Result<(), SynthesisError> {
    body.properties.insert(
        AUTHENTICATION_REFS.to_string(),
        Schema::object()
            .with_description(AUTHENTICATION_REFS_DESCRIPTION)
            .into(),
    );
    body.require(AUTHENTICATION_REFS);

    let refs = body
        .properties
        .get_mut(AUTHENTICATION_REFS)
        .and_then(SchemaOrRef::as_schema_mut)
        .ok_or_else(|| SynthesisError::AuthenticationRefsMissing(path.to_string()))?;
    for name in schemes.keys() {
        refs.properties
            .insert(format!("{}Ref", lower_first(name)), Schema::string().into());
    }
    Ok(())
}

fn merge_parameters(
    doc: &Document,
    inliner: &mut SchemaInliner<'_>,
    path: &str,
    body: &mut Schema,
    warnings: &mut Vec<SynthesisWarning>,
) -> Result<(), SynthesisError> {
    for (method, operation) in doc.operations(path) {
        for param in operation.inline_parameters() {
            if body.properties.contains_key(&param.name) {
                let warning = SynthesisWarning::ParameterExists {
                    name: param.name.clone(),
                };
                log::warn!("{path}: {warning}");
                warnings.push(warning);
                continue;
            }
            let node = param
                .schema
                .as_ref()
                .ok_or_else(|| SynthesisError::MissingParameterSchema {
                    path: path.to_string(),
                    parameter: param.name.clone(),
                })?;
            let description = parameter_description(param, &capitalize_first(method.key()));
            body.properties.insert(
                param.name.clone(),
                inliner.inline(node).with_description(description).into(),
            );
        }
    }
    Ok(())
}

fn parameter_description(param: &Parameter, verb: &str) -> String {
    format!(
        "PARAMETER: {}, VERB: {} - {}",
        param.location,
        verb,
        param.description.as_deref().unwrap_or_default()
    )
}
