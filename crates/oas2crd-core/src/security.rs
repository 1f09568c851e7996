//! Classification of security schemes and the credential schemas derived
//! from the supported ones.

use crate::error::SecurityError;
use crate::openapi::components::{SecurityScheme, SecuritySchemeType};
use crate::openapi::schema::{AdditionalProperties, Schema};
use crate::render;

pub const BASIC_SCHEME: &str = "basic";
pub const BEARER_SCHEME: &str = "bearer";

/// A security scheme this generator can turn into credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthKind {
    Basic,
    Bearer,
}

impl AuthKind {
    /// Classify a scheme. Matching on `type` and `scheme` is exact.
    pub fn classify(scheme: &SecurityScheme) -> Result<AuthKind, SecurityError> {
        match (&scheme.scheme_type, scheme.scheme.as_deref()) {
            (SecuritySchemeType::Http, Some(BASIC_SCHEME)) => Ok(AuthKind::Basic),
            (SecuritySchemeType::Http, Some(BEARER_SCHEME)) => Ok(AuthKind::Bearer),
            (other, token) => Err(SecurityError::InvalidSecurityScheme {
                scheme_type: other.as_str().to_string(),
                scheme: token.unwrap_or_default().to_string(),
            }),
        }
    }

    pub fn canonical_name(&self) -> &'static str {
        match self {
            AuthKind::Basic => "BasicAuth",
            AuthKind::Bearer => "BearerAuth",
        }
    }

    /// Credential fields, all of them strings.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            AuthKind::Basic => &["username", "password"],
            AuthKind::Bearer => &["token"],
        }
    }

    /// Object schema with one required string property per credential field.
    pub fn credentials_schema(&self) -> Schema {
        let mut schema = Schema::object();
        for field in self.fields() {
            schema = schema.with_property(*field, Schema::string());
            schema.require(field);
        }
        schema.additional_properties = Some(AdditionalProperties::Bool(false));
        schema
    }
}

pub fn is_supported(scheme: &SecurityScheme) -> bool {
    AuthKind::classify(scheme).is_ok()
}

/// `BasicAuth` or `BearerAuth`; anything else is an invalid scheme.
pub fn canonical_name(scheme: &SecurityScheme) -> Result<&'static str, SecurityError> {
    AuthKind::classify(scheme).map(|kind| kind.canonical_name())
}

/// Render the credentials schema for a supported scheme.
pub fn build_auth_schema(scheme: &SecurityScheme) -> Result<Vec<u8>, SecurityError> {
    let kind = AuthKind::classify(scheme)?;
    render::render(&kind.credentials_schema()).map_err(|e| SecurityError::Render(e.to_string()))
}
