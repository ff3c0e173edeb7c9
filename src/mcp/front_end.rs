//! Method dispatch for the MCP protocol surface.

use super::jsonrpc::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION, JsonRpcError, JsonRpcId,
    JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND,
};
use super::types::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, ListToolsResult,
    ServerCapabilities, ServerInfo, ToolDescriptor, negotiate_protocol_version,
};
use crate::invocation::{domain::InvocationRequest, ports::UpstreamClient, services::ToolInvoker};
use crate::tool_registry::{
    domain::{SchemaFingerprint, ServiceHealthSnapshot},
    ports::SchemaFetcher,
    services::{ServiceStatus, ToolRegistry},
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use mockable::Clock;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failures reported as JSON-RPC errors rather than tool results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The envelope is not a JSON-RPC 2.0 request.
    #[error("unsupported jsonrpc version '{0}'")]
    InvalidRequest(String),
    /// No handler exists for the method.
    #[error("method not found: {0}")]
    MethodNotFound(String),
    /// The method parameters could not be decoded.
    #[error("invalid params: {0}")]
    InvalidParams(String),
    /// No published tool has the requested name.
    #[error("tool not found: {0}")]
    ToolNotFound(String),
    /// A result could not be encoded.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProtocolError {
    /// Returns the stable error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::MethodNotFound(_) => "MethodNotFound",
            Self::InvalidParams(_) => "InvalidParams",
            Self::ToolNotFound(_) => "ToolNotFound",
            Self::Internal(_) => "Internal",
        }
    }

    /// Returns the JSON-RPC error code.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::InvalidRequest(_) => INVALID_REQUEST,
            Self::MethodNotFound(_) => METHOD_NOT_FOUND,
            Self::InvalidParams(_) | Self::ToolNotFound(_) => INVALID_PARAMS,
            Self::Internal(_) => INTERNAL_ERROR,
        }
    }
}

impl From<ProtocolError> for JsonRpcError {
    fn from(err: ProtocolError) -> Self {
        let data = match &err {
            ProtocolError::ToolNotFound(tool) => json!({ "kind": err.kind(), "tool": tool }),
            _ => json!({ "kind": err.kind() }),
        };
        Self::new(err.code(), err.to_string(), Some(data))
    }
}

/// Per-service entry of the health report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealthReport {
    /// Last observed reachability, flattened into `status`, `checkedAt` and
    /// `message`.
    #[serde(flatten)]
    pub health: ServiceHealthSnapshot,
    /// Number of published tools.
    pub tool_count: usize,
    /// Time of the last successful discovery.
    pub discovered_at: Option<DateTime<Utc>>,
    /// Fingerprint of the last compiled schema.
    pub fingerprint: Option<SchemaFingerprint>,
}

impl From<ServiceStatus> for ServiceHealthReport {
    fn from(status: ServiceStatus) -> Self {
        Self {
            health: status.health,
            tool_count: status.tool_count,
            discovered_at: status.discovered_at,
            fingerprint: status.fingerprint,
        }
    }
}

/// Details section of the health report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDetails {
    /// Number of tools currently published.
    pub tools_available: usize,
    /// Per-service reachability keyed by service name.
    pub services: BTreeMap<String, ServiceHealthReport>,
}

/// Body of `GET /health`.
///
/// The overall status is `healthy` whenever the gateway answers; downstream
/// outages only show up per service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    /// Always `healthy`.
    pub status: &'static str,
    /// Gateway name.
    pub service: String,
    /// Tool and service details.
    pub details: HealthDetails,
}

/// Stateless MCP request handler over a shared registry.
pub struct McpFrontEnd<F, C, U>
where
    F: SchemaFetcher,
    C: Clock + Send + Sync,
    U: UpstreamClient,
{
    registry: Arc<ToolRegistry<F, C>>,
    invoker: ToolInvoker<U>,
    server_info: ServerInfo,
}

impl<F, C, U> McpFrontEnd<F, C, U>
where
    F: SchemaFetcher,
    C: Clock + Send + Sync,
    U: UpstreamClient,
{
    /// Creates a front end reporting the crate name and version.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry<F, C>>, invoker: ToolInvoker<U>) -> Self {
        Self {
            registry,
            invoker,
            server_info: ServerInfo::default(),
        }
    }

    /// Returns the registry backing `tools/list` and `tools/call`.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ToolRegistry<F, C>> {
        &self.registry
    }

    /// Dispatches one request.
    ///
    /// Returns `None` for notifications, which are acknowledged without a
    /// body.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            debug!(method = %request.method, "notification acknowledged");
            return None;
        };
        let outcome = if request.jsonrpc == JSONRPC_VERSION {
            self.dispatch(&request.method, request.params).await
        } else {
            Err(ProtocolError::InvalidRequest(request.jsonrpc))
        };
        Some(outcome.map_or_else(
            |err| {
                debug!(kind = err.kind(), error = %err, "request rejected");
                JsonRpcResponse::failure(id.clone(), err.into())
            },
            |result| JsonRpcResponse::success(id.clone(), result),
        ))
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, ProtocolError> {
        match method {
            "initialize" => encode(&self.initialize(&decode::<InitializeParams>(params)?)),
            "ping" => Ok(Value::Object(Map::new())),
            "tools/list" => encode(&self.list_tools()),
            "tools/call" => {
                let call = decode::<CallToolParams>(params)?;
                encode(&self.call_tool(call.into()).await?)
            }
            other => Err(ProtocolError::MethodNotFound(other.to_owned())),
        }
    }

    /// Answers `initialize`. Has no registry side effect.
    #[must_use]
    pub fn initialize(&self, params: &InitializeParams) -> InitializeResult {
        let protocol_version = negotiate_protocol_version(params.protocol_version.as_deref());
        info!(
            requested = params.protocol_version.as_deref().unwrap_or_default(),
            negotiated = protocol_version,
            "client initialized"
        );
        InitializeResult {
            protocol_version: protocol_version.to_owned(),
            capabilities: ServerCapabilities::default(),
            server_info: self.server_info.clone(),
            instructions: None,
        }
    }

    /// Answers `tools/list` from the current registry snapshot.
    #[must_use]
    pub fn list_tools(&self) -> ListToolsResult {
        let snapshot = self.registry.snapshot();
        ListToolsResult {
            tools: snapshot
                .tools()
                .map(|tool| ToolDescriptor::from(tool.as_ref()))
                .collect(),
        }
    }

    /// Answers `tools/call`.
    ///
    /// Argument and downstream failures are returned inside the result with
    /// `isError` set.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ToolNotFound`] when no published tool has
    /// the requested name.
    pub async fn call_tool(
        &self,
        request: InvocationRequest,
    ) -> Result<CallToolResult, ProtocolError> {
        let Some(tool) = self.registry.resolve(&request.tool_name) else {
            warn!(tool = %request.tool_name, "tool not found");
            return Err(ProtocolError::ToolNotFound(request.tool_name));
        };
        let result = self
            .invoker
            .invoke(&tool, request.arguments.as_ref())
            .await;
        Ok(CallToolResult::from_invocation(&tool, &result))
    }

    /// Probes every service's health endpoint and reports the outcome
    /// together with discovery state.
    pub async fn health(&self) -> HealthReport {
        let probes = self
            .registry
            .services()
            .map(|service| self.registry.check_health(service.name().as_str()));
        for result in join_all(probes).await {
            if let Err(err) = result {
                warn!(kind = err.kind(), error = %err, "health probe skipped");
            }
        }

        HealthReport {
            status: "healthy",
            service: self.server_info.name.clone(),
            details: HealthDetails {
                tools_available: self.registry.snapshot().tool_count(),
                services: self
                    .registry
                    .service_statuses()
                    .into_iter()
                    .map(|status| (status.service.as_str().to_owned(), status.into()))
                    .collect(),
            },
        }
    }
}

fn decode<T: DeserializeOwned>(params: Option<Value>) -> Result<T, ProtocolError> {
    let raw = params.unwrap_or_else(|| Value::Object(Map::new()));
    serde_json::from_value(raw).map_err(|err| ProtocolError::InvalidParams(err.to_string()))
}

fn encode<T: Serialize>(result: &T) -> Result<Value, ProtocolError> {
    serde_json::to_value(result).map_err(|err| ProtocolError::Internal(err.to_string()))
}
