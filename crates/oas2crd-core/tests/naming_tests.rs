use oas2crd_core::naming::type_name;
use oas2crd_core::transpile::{FieldType, JsonSchema, transpile};

#[test]
fn test_schema_keys() {
    assert_eq!(type_name("address"), "Address");
    assert_eq!(type_name("pet-owner"), "PetOwner");
    assert_eq!(type_name("TagsItems"), "TagsItems");
    assert_eq!(type_name("created_at"), "CreatedAt");
}

#[test]
fn test_separators_split_words() {
    assert_eq!(type_name("a/b"), "AB");
    assert_eq!(type_name("/pets/{petId}"), "PetsPetId");
    assert_eq!(type_name("application/json"), "ApplicationJson");
}

#[test]
fn test_leading_digit_is_prefixed() {
    let name = type_name("2fa");
    assert!(name.starts_with("_2"), "got {name}");
    assert_eq!(name.to_lowercase(), "_2fa");
    assert_eq!(type_name("-2fa").to_lowercase(), "_2fa");
}

#[test]
fn test_nothing_usable_is_unnamed() {
    assert_eq!(type_name("$%"), "Unnamed");
    assert_eq!(type_name(""), "Unnamed");
}

#[test]
fn test_struct_and_field_names_from_keys() {
    let schema = JsonSchema::parse(
        br#"{
            "title": "settings",
            "type": "object",
            "properties": {
                "a/b": {"type": "object", "properties": {"x": {"type": "string"}}},
                "2fa": {"type": "string"},
                "$%": {"type": "boolean"}
            }
        }"#,
    )
    .unwrap();
    let structs = transpile([schema]).unwrap();

    let settings = &structs["Settings"];
    let names: Vec<&str> = settings.fields.keys().map(String::as_str).collect();
    assert_eq!(names.len(), 3);
    assert_eq!(names[0], "AB");
    assert_eq!(names[1].to_lowercase(), "_2fa");
    assert_eq!(names[2], "Unnamed");

    let nested = &settings.fields["AB"];
    assert_eq!(nested.json_name.as_deref(), Some("a/b"));
    assert_eq!(nested.ty, FieldType::Struct("AB".into()));
    assert!(structs.contains_key("AB"));
    assert_eq!(settings.fields["Unnamed"].json_name.as_deref(), Some("$%"));
    assert_eq!(settings.fields["Unnamed"].ty, FieldType::Boolean);
}
