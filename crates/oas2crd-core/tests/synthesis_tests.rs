use oas2crd_core::error::{SecurityError, SynthesisError, SynthesisWarning};
use oas2crd_core::synth::{AUTHENTICATION_REFS, build_spec_schema, build_status_schema};
use oas2crd_core::{Document, ResourceDescriptor, VerbDescriptor, generate_schema_set};
use serde_json::Value;

const WIDGETS: &str = include_str!("fixtures/widgets.yaml");
const APIKEY_ONLY: &str = include_str!("fixtures/apikey-only.yaml");

fn creating(kind: &str, path: &str) -> ResourceDescriptor {
    ResourceDescriptor::new(kind, "id")
        .with_verb(VerbDescriptor::new("create", "POST", path))
        .with_verb(VerbDescriptor::new("get", "GET", path))
}

fn json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).expect("schema should be valid JSON")
}

fn property_names(schema: &Value) -> Vec<String> {
    schema["properties"]
        .as_object()
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default()
}

#[test]
fn widgets_spec_schema() {
    let doc = Document::load(WIDGETS.as_bytes()).unwrap();
    let (spec, warnings) = build_spec_schema(&doc, &creating("Widget", "/widgets")).unwrap();
    insta::assert_snapshot!(
        String::from_utf8(spec.expect("should have a spec schema")).unwrap(),
        @r#"{"type":"object","properties":{"name":{"type":"string","description":"Widget name"},"authenticationRefs":{"type":"object","description":"AuthenticationRefs represent the reference to a CR containing the authentication information. One authentication method must be set.","properties":{"basicAuthRef":{"type":"string"},"bearerAuthRef":{"type":"string"}}},"page":{"type":"integer","description":"PARAMETER: query, VERB: Get - "},"color":{"type":"string","description":"PARAMETER: query, VERB: Post - Paint color"}},"required":["name","authenticationRefs"]}"#
    );
    assert_eq!(
        warnings,
        vec![
            SynthesisWarning::SecurityScheme {
                name: "legacyKey".to_string(),
                source: SecurityError::InvalidSecurityScheme {
                    scheme_type: "apiKey".to_string(),
                    scheme: String::new(),
                },
            },
            SynthesisWarning::ParameterExists {
                name: "name".to_string()
            },
        ]
    );
}

#[test]
fn colliding_parameter_leaves_body_property_unchanged() {
    let doc = Document::load(WIDGETS.as_bytes()).unwrap();
    let (spec, _) = build_spec_schema(&doc, &creating("Widget", "/widgets")).unwrap();
    let spec = json(&spec.unwrap());
    assert_eq!(spec["properties"]["name"]["description"], "Widget name");
}

#[test]
fn spec_schema_is_deterministic() {
    let resource = creating("Widget", "/widgets");
    let first = build_spec_schema(&Document::load(WIDGETS.as_bytes()).unwrap(), &resource).unwrap();
    let second = build_spec_schema(&Document::load(WIDGETS.as_bytes()).unwrap(), &resource).unwrap();
    assert_eq!(first, second);
}

#[test]
fn shared_body_reference_does_not_leak_between_resources() {
    let doc = Document::load(WIDGETS.as_bytes()).unwrap();

    let gadget = generate_schema_set(&doc, &creating("Gadget", "/gadgets")).unwrap();
    let gizmo = generate_schema_set(&doc, &creating("Gizmo", "/gizmos")).unwrap();
    let again = generate_schema_set(&doc, &creating("Gadget", "/gadgets")).unwrap();

    let gadget_spec = json(gadget.spec_schema("Gadget").unwrap());
    let gizmo_spec = json(gizmo.spec_schema("Gizmo").unwrap());
    assert_eq!(property_names(&gadget_spec), vec!["name", "parts", AUTHENTICATION_REFS]);
    assert_eq!(gadget_spec, gizmo_spec);
    assert_eq!(gadget, again);

    let widget = doc.component_schemas().unwrap()["Widget"].as_schema().unwrap();
    assert!(!widget.properties.contains_key(AUTHENTICATION_REFS));
    assert_eq!(widget.required, vec!["name".to_string()]);
}

#[test]
fn recursive_body_is_cut_into_an_open_object() {
    let doc = Document::load(WIDGETS.as_bytes()).unwrap();
    let set = generate_schema_set(&doc, &creating("Gadget", "/gadgets")).unwrap();
    let bytes = set.spec_schema("Gadget").unwrap();
    assert!(!String::from_utf8_lossy(bytes).contains("$ref"));

    let spec = json(bytes);
    let part = &spec["properties"]["parts"]["items"];
    assert_eq!(property_names(part), vec!["label", "parent"]);
    insta::assert_snapshot!(
        part["properties"]["parent"].to_string(),
        @r#"{"type":"object","x-kubernetes-preserve-unknown-fields":true}"#
    );
}

#[test]
fn last_create_verb_wins() {
    let doc = Document::load(WIDGETS.as_bytes()).unwrap();
    let resource = ResourceDescriptor::new("Widget", "id")
        .with_verb(VerbDescriptor::new("create", "POST", "/gadgets"))
        .with_verb(VerbDescriptor::new("Create", "post", "/widgets"));
    let (spec, _) = build_spec_schema(&doc, &resource).unwrap();
    let (expected, _) = build_spec_schema(&doc, &creating("Widget", "/widgets")).unwrap();
    assert_eq!(spec, expected);
}

#[test]
fn unknown_create_path_is_fatal() {
    let doc = Document::load(WIDGETS.as_bytes()).unwrap();
    let err = generate_schema_set(&doc, &creating("Widget", "/widgets/")).unwrap_err();
    assert!(matches!(err, SynthesisError::PathNotFound(p) if p == "/widgets/"));
}

#[test]
fn apikey_only_document() {
    let doc = Document::load(APIKEY_ONLY.as_bytes()).unwrap();
    let set = generate_schema_set(&doc, &creating("Key", "/keys")).unwrap();

    assert!(set.auth_schemas().is_empty());
    assert_eq!(set.warnings().len(), 2);

    let spec = json(set.spec_schema("Key").unwrap());
    assert_eq!(property_names(&spec), vec!["label", AUTHENTICATION_REFS]);
    assert!(spec["properties"][AUTHENTICATION_REFS].get("properties").is_none());
    assert_eq!(spec["required"], serde_json::json!([AUTHENTICATION_REFS]));
}

#[test]
fn auth_schemas_keyed_by_canonical_name() {
    let doc = Document::load(WIDGETS.as_bytes()).unwrap();
    let set = generate_schema_set(&doc, &creating("Widget", "/widgets")).unwrap();

    let names: Vec<&String> = set.auth_schemas().keys().collect();
    assert_eq!(names, vec!["BasicAuth", "BearerAuth"]);

    let basic = json(set.auth_schema("BasicAuth").unwrap());
    assert_eq!(property_names(&basic), vec!["username", "password"]);
    assert_eq!(basic["additionalProperties"], Value::Bool(false));

    let spec = json(set.spec_schema("Widget").unwrap());
    let refs = property_names(&spec["properties"][AUTHENTICATION_REFS]);
    assert_eq!(refs, vec!["basicAuthRef", "bearerAuthRef"]);
}

#[test]
fn status_schema_for_identifier() {
    let bytes = build_status_schema("widgetId").unwrap();
    insta::assert_snapshot!(
        String::from_utf8(bytes).unwrap(),
        @r#"{"type":"object","properties":{"widgetId":{"type":"string"}}}"#
    );
}
