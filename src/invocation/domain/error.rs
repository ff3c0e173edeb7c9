//! Tool-level error taxonomy returned inside successful JSON-RPC envelopes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Argument validation failures detected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required parameter has neither a value nor a default.
    #[error("missing required argument '{0}'")]
    MissingRequiredArgument(String),

    /// An argument names no declared parameter.
    #[error("unknown argument '{0}'")]
    UnknownArgument(String),

    /// An argument cannot be coerced to its declared type.
    #[error("argument '{name}' must be {expected}, got {got}")]
    TypeMismatch {
        /// Argument name.
        name: String,
        /// Declared type.
        expected: String,
        /// Type actually supplied.
        got: String,
    },
}

impl ValidationError {
    /// Returns the tool error kind of the failure.
    #[must_use]
    pub const fn kind(&self) -> ToolErrorKind {
        match self {
            Self::MissingRequiredArgument(_) => ToolErrorKind::MissingRequiredArgument,
            Self::UnknownArgument(_) => ToolErrorKind::UnknownArgument,
            Self::TypeMismatch { .. } => ToolErrorKind::TypeMismatch,
        }
    }
}

/// Stable kinds of tool-level errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolErrorKind {
    /// See [`ValidationError::MissingRequiredArgument`].
    MissingRequiredArgument,
    /// See [`ValidationError::UnknownArgument`].
    UnknownArgument,
    /// See [`ValidationError::TypeMismatch`].
    TypeMismatch,
    /// Connection refused, timeout, DNS or other transport failure.
    UpstreamUnreachable,
    /// The downstream service answered with a 4xx status.
    UpstreamRejected,
    /// The downstream service answered with a 5xx status.
    UpstreamFailure,
    /// The response was truncated, undecodable or had an unexpected status.
    MalformedUpstreamResponse,
}

impl ToolErrorKind {
    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingRequiredArgument => "MissingRequiredArgument",
            Self::UnknownArgument => "UnknownArgument",
            Self::TypeMismatch => "TypeMismatch",
            Self::UpstreamUnreachable => "UpstreamUnreachable",
            Self::UpstreamRejected => "UpstreamRejected",
            Self::UpstreamFailure => "UpstreamFailure",
            Self::MalformedUpstreamResponse => "MalformedUpstreamResponse",
        }
    }
}

impl fmt::Display for ToolErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Structured error reported for a failed tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolError {
    /// Error kind.
    pub kind: ToolErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Downstream HTTP status, when a response was received.
    pub status: Option<u16>,
}

impl ToolError {
    /// Creates a tool error.
    #[must_use]
    pub fn new(kind: ToolErrorKind, message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            kind,
            message: message.into(),
            status,
        }
    }
}

impl From<ValidationError> for ToolError {
    fn from(err: ValidationError) -> Self {
        Self::new(err.kind(), err.to_string(), None)
    }
}
