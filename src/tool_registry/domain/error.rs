//! Error types for tool registry domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing tool registry domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolRegistryDomainError {
    /// The service name is empty after trimming.
    #[error("service name must not be empty")]
    EmptyServiceName,

    /// The service name contains characters outside `[a-z0-9_]`.
    #[error(
        "service name '{0}' contains invalid characters (only lowercase alphanumeric and underscores allowed)"
    )]
    InvalidServiceName(String),

    /// The service name exceeds the 100-character limit.
    #[error("service name exceeds 100 character limit: {0}")]
    ServiceNameTooLong(String),

    /// The base URL is empty.
    #[error("service base URL must not be empty")]
    EmptyBaseUrl,

    /// The base URL does not have an `http://` or `https://` prefix or does not parse.
    #[error("service base URL '{0}' must be an absolute http:// or https:// URL")]
    InvalidBaseUrl(String),

    /// A health or schema endpoint path does not start with `/`.
    #[error("endpoint path '{0}' must start with '/'")]
    InvalidEndpointPath(String),

    /// The request timeout is zero.
    #[error("request timeout for service '{0}' must be greater than zero")]
    ZeroTimeout(String),

    /// A tool name is empty after trimming.
    #[error("tool name must not be empty")]
    EmptyToolName,
}

/// Error returned while parsing a declared parameter type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognized parameter type: {0}")]
pub struct ParseParameterTypeError(pub String);
