//! Schema dialect detection and per-dialect dispatch.

use super::{RefResolver, SchemaInvalidReason, openapi3, swagger2};
use serde_json::{Map, Value};

/// Supported API-schema dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// OpenAPI 3.x (`openapi: "3.x"`).
    OpenApi3,
    /// Swagger 2.0 (`swagger: "2.0"`).
    Swagger2,
}

/// Request body extracted by a dialect before flattening.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawBody {
    pub(crate) content_type: String,
    pub(crate) required: bool,
    pub(crate) schema: Value,
}

impl Dialect {
    /// Detects the dialect from the document's declared version.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaInvalidReason::UnsupportedVersion`] for anything other
    /// than `openapi: 3.x` or `swagger: "2.0"`.
    pub fn detect(document: &Value) -> Result<Self, SchemaInvalidReason> {
        if !document.is_object() {
            return Err(SchemaInvalidReason::UnsupportedVersion(
                "document is not a JSON object".to_owned(),
            ));
        }
        if let Some(version) = document.get("openapi") {
            return match version.as_str() {
                Some(text) if text.starts_with("3.") => Ok(Self::OpenApi3),
                _ => Err(SchemaInvalidReason::UnsupportedVersion(format!(
                    "openapi {version}"
                ))),
            };
        }
        match document.get("swagger") {
            Some(Value::String(text)) if text == "2.0" => Ok(Self::Swagger2),
            Some(version) => Err(SchemaInvalidReason::UnsupportedVersion(format!(
                "swagger {version}"
            ))),
            None => Err(SchemaInvalidReason::UnsupportedVersion(
                "no openapi or swagger version declared".to_owned(),
            )),
        }
    }

    /// Returns a short label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenApi3 => "openapi3",
            Self::Swagger2 => "swagger2",
        }
    }

    pub(crate) fn base_path(self, document: &Value) -> Option<&str> {
        match self {
            Self::OpenApi3 => None,
            Self::Swagger2 => swagger2::base_path(document),
        }
    }

    /// Whether `in: body` parameters carry the request body.
    pub(crate) const fn has_body_parameters(self) -> bool {
        matches!(self, Self::Swagger2)
    }

    pub(crate) fn parameter_schema(
        self,
        resolver: RefResolver<'_>,
        parameter: &Value,
    ) -> Result<Value, SchemaInvalidReason> {
        match self {
            Self::OpenApi3 => openapi3::parameter_schema(resolver, parameter),
            Self::Swagger2 => swagger2::parameter_schema(resolver, parameter),
        }
    }

    pub(crate) fn request_body<'doc>(
        self,
        resolver: RefResolver<'doc>,
        operation: &'doc Map<String, Value>,
        parameters: &[&'doc Value],
    ) -> Result<Option<RawBody>, SchemaInvalidReason> {
        match self {
            Self::OpenApi3 => openapi3::request_body(resolver, operation),
            Self::Swagger2 => swagger2::request_body(resolver, operation, parameters),
        }
    }

    pub(crate) fn response_has_json_body(self, response: &Value) -> bool {
        match self {
            Self::OpenApi3 => openapi3::response_has_json_body(response),
            Self::Swagger2 => swagger2::response_has_json_body(response),
        }
    }
}

/// Whether a media type carries JSON.
pub(crate) fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json") || essence.ends_with("/json")
}
