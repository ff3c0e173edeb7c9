//! Per-call request and result types.

use super::ToolError;
use serde_json::Value;

/// One `tools/call` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    /// Published tool name.
    pub tool_name: String,
    /// Raw arguments as received.
    pub arguments: Option<Value>,
}

impl InvocationRequest {
    /// Creates an invocation request.
    #[must_use]
    pub fn new(tool_name: impl Into<String>, arguments: Option<Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// Outcome of one tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    /// The downstream service answered with 2xx.
    Success {
        /// Downstream body as JSON.
        payload: Value,
        /// Downstream HTTP status.
        status: u16,
    },
    /// Validation or invocation failed.
    Failure(ToolError),
}

impl InvocationResult {
    /// Returns whether the call failed.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Returns the downstream status, if one was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Success { status, .. } => Some(*status),
            Self::Failure(error) => error.status,
        }
    }
}
