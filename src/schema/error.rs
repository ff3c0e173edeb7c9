//! Error types for schema compilation.

use crate::tool_registry::domain::ServiceName;
use thiserror::Error;

/// Result type for schema compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Errors returned when a schema document cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The document is not a usable API schema.
    #[error("schema of service {service} is invalid: {reason}")]
    SchemaInvalid {
        /// Service whose schema was compiled.
        service: ServiceName,
        /// Why the document was rejected.
        reason: SchemaInvalidReason,
    },
}

impl CompileError {
    /// Returns the stable error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SchemaInvalid { .. } => "SchemaInvalid",
        }
    }

    /// Returns the rejection reason.
    #[must_use]
    pub const fn reason(&self) -> &SchemaInvalidReason {
        match self {
            Self::SchemaInvalid { reason, .. } => reason,
        }
    }
}

/// Detailed reason for a [`CompileError::SchemaInvalid`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaInvalidReason {
    /// Neither `openapi: 3.x` nor `swagger: "2.0"` was declared.
    #[error("unsupported schema version: {0}")]
    UnsupportedVersion(String),

    /// A structural element has the wrong shape.
    #[error("malformed document at {location}: {detail}")]
    MalformedDocument {
        /// Where in the document the problem was found.
        location: String,
        /// What was wrong.
        detail: String,
    },

    /// A `$ref` points outside the document.
    #[error("non-local reference {0}")]
    NonLocalReference(String),

    /// A `$ref` points at nothing.
    #[error("dangling reference {0}")]
    DanglingReference(String),

    /// A chain of `$ref`s loops or nests too deeply.
    #[error("reference cycle or excessive nesting at {0}")]
    ReferenceCycle(String),

    /// A declared `type` is outside the supported set.
    #[error("unrecognized type '{type_name}' at {location}")]
    UnrecognizedType {
        /// Where the type was declared.
        location: String,
        /// Declared type text.
        type_name: String,
    },

    /// A parameter uses a location the gateway cannot send.
    #[error("operation {operation}: parameter {parameter} uses unsupported location '{location}'")]
    UnsupportedParameterLocation {
        /// Operation identifier.
        operation: String,
        /// Parameter name.
        parameter: String,
        /// Declared `in` value.
        location: String,
    },

    /// A path template is syntactically malformed.
    #[error("malformed path template {template}: {detail}")]
    MalformedPathTemplate {
        /// Declared template.
        template: String,
        /// What was wrong.
        detail: String,
    },

    /// A path placeholder has no matching path parameter.
    #[error("operation {operation}: placeholder {placeholder} has no path parameter")]
    UnmatchedPlaceholder {
        /// Operation identifier.
        operation: String,
        /// Placeholder name.
        placeholder: String,
    },

    /// A path parameter has no matching placeholder.
    #[error("operation {operation}: path parameter {parameter} has no placeholder")]
    UnmatchedPathParameter {
        /// Operation identifier.
        operation: String,
        /// Parameter name.
        parameter: String,
    },

    /// Two parameters of one operation share a name.
    #[error("operation {operation}: duplicate parameter {parameter}")]
    DuplicateParameter {
        /// Operation identifier.
        operation: String,
        /// Parameter name.
        parameter: String,
    },

    /// Two operations share an operation identifier.
    #[error("duplicate operation id {0}")]
    DuplicateOperationId(String),
}

impl SchemaInvalidReason {
    pub(crate) fn malformed(location: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedDocument {
            location: location.into(),
            detail: detail.into(),
        }
    }
}
