use serde::{Deserialize, Serialize};

use crate::openapi::paths::HttpMethod;

/// Maps a semantic action onto one HTTP operation of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbDescriptor {
    /// One of `create`, `update`, `list`, `get`, `delete`.
    pub action: String,
    /// HTTP method, e.g. `POST`.
    pub method: String,
    /// Literal path as written in the document.
    pub path: String,
}

impl VerbDescriptor {
    pub fn new(
        action: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            method: method.into(),
            path: path.into(),
        }
    }

    /// `create` through `POST`, compared case-insensitively.
    pub fn is_create_post(&self) -> bool {
        self.action.eq_ignore_ascii_case("create") && self.http_method() == Some(HttpMethod::Post)
    }

    /// The method as a known HTTP method, `None` for anything else.
    pub fn http_method(&self) -> Option<HttpMethod> {
        HttpMethod::parse(&self.method)
    }
}

/// One managed resource kind and the operations backing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub kind: String,
    /// Name of the status field holding the remote identifier.
    pub identifier: String,
    #[serde(rename = "verbsDescription", default)]
    pub verbs: Vec<VerbDescriptor>,
}

impl ResourceDescriptor {
    pub fn new(kind: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            identifier: identifier.into(),
            verbs: Vec::new(),
        }
    }

    pub fn with_verb(mut self, verb: VerbDescriptor) -> Self {
        self.verbs.push(verb);
        self
    }

    /// Verbs that drive spec schema synthesis, in declaration order.
    pub fn create_verbs(&self) -> impl Iterator<Item = &VerbDescriptor> {
        self.verbs.iter().filter(|v| v.is_create_post())
    }
}
