//! Schema nodes flattened into an arena so references and cycles can be
//! expressed as plain indices.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::jsonschema::{Additional, Items, JsonSchema, TypeValue};

pub type NodeId = usize;

/// Where a node sits relative to its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Root,
    Property(String),
    Items,
    AdditionalProperties,
    Definition(String),
}

impl Origin {
    /// The JSON key a node was declared under, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Origin::Property(key) | Origin::Definition(key) => Some(key),
            Origin::Root | Origin::Items | Origin::AdditionalProperties => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ItemsNode {
    Single(NodeId),
    Tuple(Vec<NodeId>),
}

#[derive(Debug, Clone)]
pub enum AdditionalNode {
    Bool(bool),
    Schema(NodeId),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub root: NodeId,
    pub origin: Origin,
    /// JSON pointer within the root document, e.g. `#/properties/a/items`.
    pub pointer: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub types: Vec<String>,
    pub reference: Option<String>,
    pub required: Vec<String>,
    pub properties: IndexMap<String, NodeId>,
    pub items: Option<ItemsNode>,
    pub additional: Option<AdditionalNode>,
    pub definitions: IndexMap<String, NodeId>,
}

impl Node {
    pub fn is_multi_typed(&self) -> bool {
        self.types.len() > 1
    }

    /// A schema that only carries `definitions`.
    pub fn is_definitions_container(&self) -> bool {
        !self.definitions.is_empty()
            && self.types.is_empty()
            && self.reference.is_none()
            && self.properties.is_empty()
            && self.items.is_none()
            && self.additional.is_none()
    }

    /// Declared types, or the type implied by `properties` or `items`.
    pub fn effective_types(&self) -> Vec<String> {
        if !self.types.is_empty() {
            self.types.clone()
        } else if !self.properties.is_empty() {
            vec!["object".to_string()]
        } else if self.items.is_some() {
            vec!["array".to_string()]
        } else {
            Vec::new()
        }
    }
}

#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    pointers: HashMap<(NodeId, String), NodeId>,
    ids: HashMap<String, NodeId>,
}

impl Arena {
    pub fn new(schemas: impl IntoIterator<Item = JsonSchema>) -> Arena {
        let mut arena = Arena::default();
        for schema in schemas {
            let id = arena.nodes.len();
            arena.insert(schema, None, id, Origin::Root, "#".to_string());
            arena.roots.push(id);
        }
        arena
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Resolve `reference` as seen from node `from`. Fragment-only
    /// references stay within the same root; anything else is looked up by
    /// `$id`.
    pub fn resolve(&self, from: NodeId, reference: &str) -> Option<NodeId> {
        let (base, fragment) = match reference.split_once('#') {
            Some((base, fragment)) => (base, fragment),
            None => (reference, ""),
        };
        if base.is_empty() {
            let root = self.nodes[from].root;
            return self.pointers.get(&(root, format!("#{fragment}"))).copied();
        }
        let target = *self.ids.get(base)?;
        if fragment.is_empty() {
            return Some(target);
        }
        let root = self.nodes[target].root;
        self.pointers.get(&(root, format!("#{fragment}"))).copied()
    }

    fn insert(
        &mut self,
        schema: JsonSchema,
        parent: Option<NodeId>,
        root: NodeId,
        origin: Origin,
        pointer: String,
    ) -> NodeId {
        let id = self.nodes.len();
        let types = match schema.type_value {
            None => Vec::new(),
            Some(TypeValue::One(t)) => vec![t],
            Some(TypeValue::Many(ts)) => ts,
        };
        self.nodes.push(Node {
            parent,
            root,
            origin,
            pointer: pointer.clone(),
            title: schema.title,
            description: schema.description,
            types,
            reference: schema.reference,
            required: schema.required,
            properties: IndexMap::new(),
            items: None,
            additional: None,
            definitions: IndexMap::new(),
        });
        self.pointers.insert((root, pointer.clone()), id);
        if let Some(schema_id) = schema.id {
            self.ids.insert(schema_id.trim_end_matches('#').to_string(), id);
        }

        for (key, def) in schema.definitions {
            let escaped = escape(&key);
            let child = self.insert(
                def,
                Some(id),
                root,
                Origin::Definition(key.clone()),
                format!("{pointer}/definitions/{escaped}"),
            );
            self.pointers
                .insert((root, format!("{pointer}/$defs/{escaped}")), child);
            self.nodes[id].definitions.insert(key, child);
        }

        for (key, prop) in schema.properties {
            let child_pointer = format!("{pointer}/properties/{}", escape(&key));
            let child = self.insert(prop, Some(id), root, Origin::Property(key.clone()), child_pointer);
            self.nodes[id].properties.insert(key, child);
        }

        let items = schema.items.map(|items| match items {
            Items::Single(item) => {
                let child = self.insert(*item, Some(id), root, Origin::Items, format!("{pointer}/items"));
                ItemsNode::Single(child)
            }
            Items::Tuple(items) => ItemsNode::Tuple(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| {
                        self.insert(item, Some(id), root, Origin::Items, format!("{pointer}/items/{i}"))
                    })
                    .collect(),
            ),
        });
        self.nodes[id].items = items;

        let additional = schema.additional_properties.map(|additional| match additional {
            Additional::Bool(allowed) => AdditionalNode::Bool(allowed),
            Additional::Schema(ap) => AdditionalNode::Schema(self.insert(
                *ap,
                Some(id),
                root,
                Origin::AdditionalProperties,
                format!("{pointer}/additionalProperties"),
            )),
        });
        self.nodes[id].additional = additional;

        id
    }
}

fn escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
