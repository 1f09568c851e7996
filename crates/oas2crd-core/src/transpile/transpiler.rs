use std::collections::{HashMap, HashSet};
use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use super::arena::{AdditionalNode, Arena, ItemsNode, NodeId, Origin};
use super::jsonschema::JsonSchema;
use crate::error::TranspileError;
use crate::naming::type_name;

const ADDITIONAL_PROPERTIES_FIELD: &str = "AdditionalProperties";

/// A type produced for a schema node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Null,
    Any,
    Array(Box<FieldType>),
    Map(Box<FieldType>),
    Struct(String),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => write!(f, "String"),
            FieldType::Integer => write!(f, "i64"),
            FieldType::Number => write!(f, "f64"),
            FieldType::Boolean => write!(f, "bool"),
            FieldType::Null => write!(f, "()"),
            FieldType::Any => write!(f, "serde_json::Value"),
            FieldType::Array(inner) => write!(f, "Vec<{inner}>"),
            FieldType::Map(inner) => write!(f, "IndexMap<String, {inner}>"),
            FieldType::Struct(name) => write!(f, "{name}"),
        }
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// How a struct treats keys it does not declare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdditionalFields {
    Typed(FieldType),
    Any,
    Forbidden,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    pub name: String,
    /// Key in the JSON document; `None` for the catch-all field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_name: Option<String>,
    #[serde(rename = "type")]
    pub ty: FieldType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub multi_typed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructDef {
    /// Pointer of the source node, e.g. `#/definitions/address`.
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
    /// Set when required fields or extra keys need custom (de)serialization.
    pub custom_marshal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional: Option<AdditionalFields>,
}

/// Everything produced by one transpiler run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transpiled {
    pub structs: IndexMap<String, StructDef>,
    /// Root schemas that did not become a struct of their own name.
    pub aliases: IndexMap<String, FieldDef>,
}

pub struct Transpiler {
    arena: Arena,
    keys: HashMap<NodeId, String>,
    generated: HashMap<NodeId, FieldType>,
    in_progress: HashSet<NodeId>,
    output: Transpiled,
    anonymous: usize,
}

impl Transpiler {
    pub fn new(schemas: impl IntoIterator<Item = JsonSchema>) -> Self {
        Self::from_arena(Arena::new(schemas), HashMap::new())
    }

    /// Roots named by the caller when they carry no title.
    pub fn named(schemas: impl IntoIterator<Item = (String, JsonSchema)>) -> Self {
        let (keys, schemas): (Vec<String>, Vec<JsonSchema>) = schemas.into_iter().unzip();
        let arena = Arena::new(schemas);
        let keys = arena.roots().iter().copied().zip(keys).collect();
        Self::from_arena(arena, keys)
    }

    fn from_arena(arena: Arena, keys: HashMap<NodeId, String>) -> Self {
        Self {
            arena,
            keys,
            generated: HashMap::new(),
            in_progress: HashSet::new(),
            output: Transpiled::default(),
            anonymous: 0,
        }
    }

    pub fn run(mut self) -> Result<Transpiled, TranspileError> {
        let roots = self.arena.roots().to_vec();
        for root in roots {
            if self.arena.node(root).is_definitions_container() {
                self.process_definitions(root)?;
                continue;
            }

            let key = self.keys.get(&root).cloned();
            let name = self.schema_name(key.as_deref(), root);
            let ty = self.process_schema(&name, root)?;
            if ty != FieldType::Struct(name.clone()) {
                let node = self.arena.node(root);
                self.output.aliases.insert(
                    name.clone(),
                    FieldDef {
                        name,
                        json_name: None,
                        ty,
                        required: false,
                        description: node.description.clone(),
                        multi_typed: node.is_multi_typed(),
                    },
                );
            }
        }
        Ok(self.output)
    }

    fn process_definitions(&mut self, id: NodeId) -> Result<(), TranspileError> {
        let definitions: Vec<(String, NodeId)> = self
            .arena
            .node(id)
            .definitions
            .iter()
            .map(|(key, child)| (key.clone(), *child))
            .collect();
        for (key, child) in definitions {
            self.process_schema(&type_name(&key), child)?;
        }
        Ok(())
    }

    fn process_schema(&mut self, name: &str, id: NodeId) -> Result<FieldType, TranspileError> {
        if let Some(ty) = self.generated.get(&id) {
            return Ok(ty.clone());
        }
        if self.in_progress.contains(&id) {
            log::debug!("cycle through {} resolves to any", self.arena.node(id).pointer);
            return Ok(FieldType::Any);
        }

        self.in_progress.insert(id);
        let result = self.process_types(name, id);
        self.in_progress.remove(&id);

        let ty = result?;
        self.generated.insert(id, ty.clone());
        Ok(ty)
    }

    fn process_types(&mut self, name: &str, id: NodeId) -> Result<FieldType, TranspileError> {
        if !self.arena.node(id).definitions.is_empty() {
            self.process_definitions(id)?;
        }

        let types = self.arena.node(id).effective_types();
        match types.as_slice() {
            [] => match self.arena.node(id).reference.clone() {
                Some(reference) => self.process_reference(id, &reference),
                None => Ok(FieldType::Any),
            },
            [single] => self.process_type(name, single, id),
            many => {
                for schema_type in many {
                    let variant = format!("{name}{}", type_name(schema_type));
                    self.process_type(&variant, schema_type, id)?;
                }
                Ok(FieldType::Any)
            }
        }
    }

    fn process_type(&mut self, name: &str, schema_type: &str, id: NodeId) -> Result<FieldType, TranspileError> {
        match schema_type {
            "object" => self.process_object(name, id),
            "array" => self.process_array(name, id),
            other => primitive(other),
        }
    }

    fn process_reference(&mut self, id: NodeId, reference: &str) -> Result<FieldType, TranspileError> {
        let target = self
            .arena
            .resolve(id, reference)
            .ok_or_else(|| TranspileError::UnresolvedRef {
                reference: reference.to_string(),
                path: self.arena.node(id).pointer.clone(),
            })?;
        if let Some(ty) = self.generated.get(&target) {
            return Ok(ty.clone());
        }
        let name = self.schema_name(None, target);
        self.process_schema(&name, target)
    }

    fn process_array(&mut self, name: &str, id: NodeId) -> Result<FieldType, TranspileError> {
        let items = self.arena.node(id).items.clone();
        let element = match items {
            None => FieldType::Any,
            Some(ItemsNode::Tuple(items)) if items.is_empty() => {
                return Err(TranspileError::EmptyArraySubtype(
                    self.arena.node(id).pointer.clone(),
                ));
            }
            Some(ItemsNode::Single(item)) => {
                let sub_name = self.schema_name(Some(&format!("{name}Items")), item);
                self.process_schema(&sub_name, item)?
            }
            Some(ItemsNode::Tuple(items)) => {
                let mut element: Option<FieldType> = None;
                for (i, item) in items.into_iter().enumerate() {
                    let sub_name = self.schema_name(Some(&format!("{name}Items{i}")), item);
                    let ty = self.process_schema(&sub_name, item)?;
                    element = match element {
                        None => Some(ty),
                        Some(prev) if prev == ty => Some(prev),
                        Some(_) => Some(FieldType::Any),
                    };
                }
                element.unwrap_or(FieldType::Any)
            }
        };

        let ty = FieldType::Array(Box::new(element));
        let node = self.arena.node(id);
        if node.parent.is_none() {
            self.output.aliases.insert(
                name.to_string(),
                FieldDef {
                    name: name.to_string(),
                    json_name: None,
                    ty: ty.clone(),
                    required: false,
                    description: node.description.clone(),
                    multi_typed: node.is_multi_typed(),
                },
            );
        }
        Ok(ty)
    }

    fn process_object(&mut self, name: &str, id: NodeId) -> Result<FieldType, TranspileError> {
        // registered before the children so recursive references find it
        self.generated.insert(id, FieldType::Struct(name.to_string()));

        let node = self.arena.node(id);
        let mut strct = StructDef {
            id: node.pointer.clone(),
            name: name.to_string(),
            description: node.description.clone(),
            fields: IndexMap::new(),
            custom_marshal: false,
            additional: None,
        };
        let properties: Vec<(String, NodeId)> =
            node.properties.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let required = node.required.clone();
        let additional = node.additional.clone();
        let is_definition = matches!(node.origin, Origin::Definition(_));

        for (key, child) in &properties {
            let field_name = type_name(key);
            let sub_name = self.schema_name(Some(&field_name), *child);
            let ty = self.process_schema(&sub_name, *child)?;
            let child_node = self.arena.node(*child);
            let field = FieldDef {
                name: field_name.clone(),
                json_name: Some(key.clone()),
                ty,
                required: required.contains(key),
                description: child_node.description.clone(),
                multi_typed: child_node.is_multi_typed(),
            };
            if field.required {
                strct.custom_marshal = true;
            }
            strct.fields.insert(field_name, field);
        }

        match additional {
            Some(AdditionalNode::Schema(ap)) => {
                let ap_name = self.schema_name(None, ap);
                let sub = self.process_schema(&ap_name, ap)?;
                let map = FieldType::Map(Box::new(sub.clone()));
                if properties.is_empty() && !is_definition {
                    // nothing but extra keys: a plain map will do
                    self.generated.insert(id, map.clone());
                    return Ok(map);
                }
                strct.fields.insert(ADDITIONAL_PROPERTIES_FIELD.to_string(), catch_all(map));
                strct.custom_marshal = true;
                strct.additional = Some(AdditionalFields::Typed(sub));
            }
            Some(AdditionalNode::Bool(true)) => {
                strct.fields.insert(
                    ADDITIONAL_PROPERTIES_FIELD.to_string(),
                    catch_all(FieldType::Map(Box::new(FieldType::Any))),
                );
                strct.custom_marshal = true;
                strct.additional = Some(AdditionalFields::Any);
            }
            Some(AdditionalNode::Bool(false)) => {
                strct.custom_marshal = true;
                strct.additional = Some(AdditionalFields::Forbidden);
            }
            None => {}
        }

        if let Some(previous) = self.output.structs.insert(name.to_string(), strct) {
            log::warn!("struct {name} from {} replaces the one from {}", self.arena.node(id).pointer, previous.id);
        }
        Ok(FieldType::Struct(name.to_string()))
    }

    /// Title, then the caller's key, then the position of the node.
    fn schema_name(&mut self, key: Option<&str>, id: NodeId) -> String {
        let node = self.arena.node(id);
        if let Some(title) = node.title.as_deref().filter(|t| !t.is_empty()) {
            return type_name(title);
        }
        if let Some(key) = key.filter(|k| !k.is_empty()) {
            return type_name(key);
        }
        let Some(parent) = node.parent else {
            return "Root".to_string();
        };
        if let Some(key) = node.origin.key() {
            return type_name(key);
        }
        if let Some(key) = self.arena.node(parent).origin.key() {
            return type_name(&format!("{key}Item"));
        }
        self.anonymous += 1;
        format!("Anonymous{}", self.anonymous)
    }
}

fn catch_all(ty: FieldType) -> FieldDef {
    FieldDef {
        name: ADDITIONAL_PROPERTIES_FIELD.to_string(),
        json_name: None,
        ty,
        required: false,
        description: None,
        multi_typed: false,
    }
}

fn primitive(schema_type: &str) -> Result<FieldType, TranspileError> {
    match schema_type {
        "string" => Ok(FieldType::String),
        "integer" => Ok(FieldType::Integer),
        "number" => Ok(FieldType::Number),
        "boolean" => Ok(FieldType::Boolean),
        "null" => Ok(FieldType::Null),
        other => Err(TranspileError::UnknownType(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(json: &str) -> Result<Transpiled, TranspileError> {
        Transpiler::new([JsonSchema::parse(json.as_bytes()).unwrap()]).run()
    }

    #[test]
    fn test_multi_typed_field_is_any() {
        let out = run(r#"{"title": "root", "properties": {"name": {"type": ["integer", "string"]}}}"#).unwrap();
        let field = &out.structs["Root"].fields["Name"];
        assert_eq!(field.ty, FieldType::Any);
        assert!(field.multi_typed);
        assert_eq!(field.json_name.as_deref(), Some("name"));
    }

    #[test]
    fn test_multi_typed_object_variant() {
        let out = run(
            r#"{"title": "root", "properties": {"v": {"type": ["object", "null"], "properties": {"a": {"type": "string"}}}}}"#,
        )
        .unwrap();
        assert!(out.structs.contains_key("VObject"));
        assert_eq!(out.structs["Root"].fields["V"].ty, FieldType::Any);
    }

    #[test]
    fn test_mutual_cycle_resolves_to_named_structs() {
        let out = run(
            r##"{"definitions": {
                "a": {"type": "object", "required": ["b"], "properties": {"b": {"$ref": "#/definitions/b"}}},
                "b": {"type": "object", "properties": {"a": {"$ref": "#/definitions/a"}}}
            }}"##,
        )
        .unwrap();
        let names: Vec<&String> = out.structs.keys().collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(out.structs["A"].fields["B"].ty, FieldType::Struct("B".into()));
        assert_eq!(out.structs["B"].fields["A"].ty, FieldType::Struct("A".into()));
        assert!(out.structs["A"].custom_marshal);
        assert!(!out.structs["B"].custom_marshal);
        assert_eq!(out.structs["A"].id, "#/definitions/a");
        assert!(out.aliases.is_empty());
    }

    #[test]
    fn test_self_reference() {
        let out = run(r##"{"title": "Node", "type": "object", "properties": {"next": {"$ref": "#"}}}"##).unwrap();
        assert_eq!(out.structs["Node"].fields["Next"].ty, FieldType::Struct("Node".into()));
    }

    #[test]
    fn test_array_cycle_terminates_with_any() {
        let out = run(
            r##"{"definitions": {"list": {"type": "array", "items": {"$ref": "#/definitions/list"}}}}"##,
        )
        .unwrap();
        assert!(out.structs.is_empty());
    }

    #[test]
    fn test_additional_properties_collapse() {
        let out = run(
            r#"{"title": "Root",
                "properties": {"labels": {"type": "object", "additionalProperties": {"type": "string"}}},
                "definitions": {"tags": {"type": "object", "additionalProperties": {"type": "string"}}}}"#,
        )
        .unwrap();
        assert_eq!(
            out.structs["Root"].fields["Labels"].ty,
            FieldType::Map(Box::new(FieldType::String))
        );
        assert!(!out.structs.contains_key("Labels"));

        let tags = &out.structs["Tags"];
        assert_eq!(tags.additional, Some(AdditionalFields::Typed(FieldType::String)));
        let catch_all = &tags.fields[ADDITIONAL_PROPERTIES_FIELD];
        assert_eq!(catch_all.ty, FieldType::Map(Box::new(FieldType::String)));
        assert_eq!(catch_all.json_name, None);
    }

    #[test]
    fn test_additional_properties_bool() {
        let open = run(r#"{"title": "Open", "type": "object", "properties": {"a": {"type": "string"}}, "additionalProperties": true}"#).unwrap();
        let open = &open.structs["Open"];
        assert_eq!(open.additional, Some(AdditionalFields::Any));
        assert_eq!(
            open.fields[ADDITIONAL_PROPERTIES_FIELD].ty,
            FieldType::Map(Box::new(FieldType::Any))
        );

        let closed = run(r#"{"title": "Closed", "type": "object", "properties": {"a": {"type": "string"}}, "additionalProperties": false}"#).unwrap();
        let closed = &closed.structs["Closed"];
        assert_eq!(closed.additional, Some(AdditionalFields::Forbidden));
        assert!(closed.custom_marshal);
        assert_eq!(closed.fields.len(), 1);
    }

    #[test]
    fn test_root_array_is_aliased() {
        let out = run(
            r#"{"title": "Tags", "type": "array", "items": {"type": "object", "properties": {"n": {"type": "string"}}}}"#,
        )
        .unwrap();
        assert_eq!(
            out.aliases["Tags"].ty,
            FieldType::Array(Box::new(FieldType::Struct("TagsItems".into())))
        );
        assert!(out.structs.contains_key("TagsItems"));
    }

    #[test]
    fn test_nested_array_item_names() {
        let out = run(
            r#"{"title": "R", "properties": {"list": {"type": "array", "items": {"properties": {"a": {"type": "string"}}}}}}"#,
        )
        .unwrap();
        assert_eq!(
            out.structs["R"].fields["List"].ty,
            FieldType::Array(Box::new(FieldType::Struct("ListItems".into())))
        );
    }

    #[test]
    fn test_unresolved_reference() {
        let err = run(r##"{"title": "R", "properties": {"x": {"$ref": "#/definitions/missing"}}}"##).unwrap_err();
        assert_eq!(
            err.to_string(),
            r##"reference "#/definitions/missing" not found at "#/properties/x""##
        );
    }

    #[test]
    fn test_unknown_type() {
        let err = run(r#"{"type": "object", "properties": {"x": {"type": "date"}}}"#).unwrap_err();
        assert!(matches!(err, TranspileError::UnknownType(t) if t == "date"));
    }

    #[test]
    fn test_empty_tuple_items() {
        let err = run(r#"{"type": "array", "items": []}"#).unwrap_err();
        assert!(matches!(err, TranspileError::EmptyArraySubtype(p) if p == "#"));
    }

    #[test]
    fn test_named_roots() {
        let schema = JsonSchema::parse(br#"{"type": "object", "properties": {"id": {"type": "integer"}}}"#).unwrap();
        let out = Transpiler::named([("pet-owner".to_string(), schema)]).run().unwrap();
        assert_eq!(out.structs["PetOwner"].fields["Id"].ty, FieldType::Integer);
    }

    #[test]
    fn test_field_type_display() {
        let ty = FieldType::Map(Box::new(FieldType::Array(Box::new(FieldType::Struct("Pet".into())))));
        assert_eq!(ty.to_string(), "IndexMap<String, Vec<Pet>>");
        assert_eq!(serde_json::to_value(&FieldType::Integer).unwrap(), "i64");
    }
}
