//! MCP method parameter and result shapes.

use crate::invocation::domain::{InvocationRequest, InvocationResult};
use crate::tool_registry::domain::Tool;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Oldest protocol revision the gateway speaks.
pub const PROTOCOL_VERSION_2024_11_05: &str = "2024-11-05";
/// Intermediate protocol revision.
pub const PROTOCOL_VERSION_2025_03_26: &str = "2025-03-26";
/// Newest protocol revision the gateway speaks.
pub const PROTOCOL_VERSION_LATEST: &str = "2025-06-18";

/// Every protocol revision echoed back on `initialize`.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = [
    PROTOCOL_VERSION_2024_11_05,
    PROTOCOL_VERSION_2025_03_26,
    PROTOCOL_VERSION_LATEST,
];

/// Picks the requested revision when supported, otherwise the latest.
#[must_use]
pub fn negotiate_protocol_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|version| {
            SUPPORTED_PROTOCOL_VERSIONS
                .into_iter()
                .find(|supported| *supported == version)
        })
        .unwrap_or(PROTOCOL_VERSION_LATEST)
}

/// Parameters of `initialize`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Revision requested by the client.
    #[serde(default)]
    pub protocol_version: Option<String>,
    /// Client capabilities; accepted and ignored.
    #[serde(default)]
    pub capabilities: Option<Value>,
    /// Client name and version.
    #[serde(default)]
    pub client_info: Option<Value>,
}

/// Name and version reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").replace('_', "-"),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

/// Capabilities advertised on `initialize`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Tool capabilities.
    pub tools: ToolsCapability,
}

/// Tool-related capabilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    /// Whether list-changed notifications are sent. Always `false`.
    pub list_changed: bool,
}

/// Result of `initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Negotiated revision.
    pub protocol_version: String,
    /// Advertised capabilities.
    pub capabilities: ServerCapabilities,
    /// Server identity.
    pub server_info: ServerInfo,
    /// Usage hints for clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// One entry of `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Published tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema of the arguments.
    pub input_schema: Value,
}

impl From<&Tool> for ToolDescriptor {
    fn from(tool: &Tool) -> Self {
        Self {
            name: tool.name().as_str().to_owned(),
            description: tool.description().to_owned(),
            input_schema: tool.input_schema().clone(),
        }
    }
}

/// Result of `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListToolsResult {
    /// Every published tool.
    pub tools: Vec<ToolDescriptor>,
}

/// Parameters of `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolParams {
    /// Tool to invoke.
    pub name: String,
    /// Argument object.
    #[serde(default)]
    pub arguments: Option<Value>,
}

impl From<CallToolParams> for InvocationRequest {
    fn from(params: CallToolParams) -> Self {
        Self::new(params.name, params.arguments)
    }
}

/// Content block of a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text {
        /// Block text.
        text: String,
    },
}

/// Call metadata attached to every tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolMeta {
    /// Service that owns the tool.
    pub service: String,
    /// Invoked tool.
    pub tool_name: String,
    /// Downstream HTTP status, when a response was received.
    pub status_code: Option<u16>,
}

/// Result of `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Text rendering of the outcome.
    pub content: Vec<ContentBlock>,
    /// Downstream payload, or the structured error.
    pub structured_content: Value,
    /// Whether the call failed.
    pub is_error: bool,
    /// Call metadata.
    #[serde(rename = "_meta")]
    pub meta: CallToolMeta,
}

impl CallToolResult {
    /// Renders an invocation outcome for the tool that produced it.
    #[must_use]
    pub fn from_invocation(tool: &Tool, result: &InvocationResult) -> Self {
        let (text, structured_content) = match result {
            InvocationResult::Success { payload, .. } => (
                serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string()),
                payload.clone(),
            ),
            InvocationResult::Failure(error) => (
                format!("Error: {}", error.message),
                json!({
                    "kind": error.kind.as_str(),
                    "message": error.message,
                    "status": error.status,
                }),
            ),
        };
        Self {
            content: vec![ContentBlock::Text { text }],
            structured_content,
            is_error: result.is_error(),
            meta: CallToolMeta {
                service: tool.service().name().as_str().to_owned(),
                tool_name: tool.name().as_str().to_owned(),
                status_code: result.status(),
            },
        }
    }
}
