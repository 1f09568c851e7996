//! Lazy schema sources for a CRD renderer.

use super::GeneratedSchemaSet;

/// Yields the schema bytes of one CRD section, if there are any.
pub trait JsonSchemaGetter {
    fn get(&self) -> Option<&[u8]>;
}

pub struct SpecSchemaGetter<'a> {
    set: &'a GeneratedSchemaSet,
}

impl<'a> SpecSchemaGetter<'a> {
    pub fn new(set: &'a GeneratedSchemaSet) -> Self {
        Self { set }
    }
}

impl JsonSchemaGetter for SpecSchemaGetter<'_> {
    fn get(&self) -> Option<&[u8]> {
        self.set.spec_schema(self.set.kind())
    }
}

pub struct StatusSchemaGetter<'a> {
    set: &'a GeneratedSchemaSet,
}

impl<'a> StatusSchemaGetter<'a> {
    pub fn new(set: &'a GeneratedSchemaSet) -> Self {
        Self { set }
    }
}

impl JsonSchemaGetter for StatusSchemaGetter<'_> {
    fn get(&self) -> Option<&[u8]> {
        Some(self.set.status_schema())
    }
}

pub struct AuthSchemaGetter<'a> {
    set: &'a GeneratedSchemaSet,
    name: String,
}

impl<'a> AuthSchemaGetter<'a> {
    pub fn new(set: &'a GeneratedSchemaSet, name: impl Into<String>) -> Self {
        Self {
            set,
            name: name.into(),
        }
    }
}

impl JsonSchemaGetter for AuthSchemaGetter<'_> {
    fn get(&self) -> Option<&[u8]> {
        self.set.auth_schema(&self.name)
    }
}

/// Always empty; stands in for sections without a schema.
pub struct StaticSchemaGetter;

impl JsonSchemaGetter for StaticSchemaGetter {
    fn get(&self) -> Option<&[u8]> {
        None
    }
}
