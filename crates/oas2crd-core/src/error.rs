use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("invalid reference format {reference} at {location}")]
    InvalidRefFormat { reference: String, location: String },

    #[error("external reference {reference} at {location} cannot be resolved")]
    External { reference: String, location: String },

    #[error("reference target not found: {reference} at {location}")]
    RefTargetNotFound { reference: String, location: String },
}

impl ResolveError {
    pub fn reference(&self) -> &str {
        match self {
            ResolveError::InvalidRefFormat { reference, .. }
            | ResolveError::External { reference, .. }
            | ResolveError::RefTargetNotFound { reference, .. } => reference,
        }
    }
}

/// Every reference that failed to resolve during a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveErrors(pub Vec<ResolveError>);

impl fmt::Display for ResolveErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to resolve model references:\n{0}")]
    Unresolved(ResolveErrors),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecurityError {
    #[error("invalid security schema type or scheme (type: {scheme_type}, scheme: {scheme})")]
    InvalidSecurityScheme { scheme_type: String, scheme: String },

    #[error("rendering auth schema: {0}")]
    Render(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to render JSON schema: {0}")]
    Json(#[from] serde_json::Error),
}

/// Conditions that abort synthesis for a resource.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("path {0} not found")]
    PathNotFound(String),

    #[error("body schema not found for {0}")]
    BodySchemaNotFound(String),

    #[error("authenticationRefs schema not found for {0}")]
    AuthenticationRefsMissing(String),

    #[error("building schema for {path}: parameter {parameter} has no schema")]
    MissingParameterSchema { path: String, parameter: String },

    #[error("building schema for {context}: {source}")]
    Render {
        context: String,
        #[source]
        source: RenderError,
    },
}

/// Conditions reported next to a successful synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisWarning {
    #[error("skipping security scheme {name}: {source}")]
    SecurityScheme {
        name: String,
        #[source]
        source: SecurityError,
    },

    #[error("parameter {name} already exists in schema")]
    ParameterExists { name: String },
}

#[derive(Debug, Error)]
pub enum TranspileError {
    #[error("failed to parse JSON schema: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("reference \"{reference}\" not found at \"{path}\"")]
    UnresolvedRef { reference: String, path: String },

    #[error("can't create an array of an empty subtype at \"{0}\"")]
    EmptyArraySubtype(String),

    #[error("failed to get a primitive type for schemaType {0}")]
    UnknownType(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },
}
