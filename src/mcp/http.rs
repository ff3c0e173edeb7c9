//! Streamable-HTTP transport: one JSON-RPC endpoint plus health and admin
//! routes.

use super::front_end::McpFrontEnd;
use super::jsonrpc::{JsonRpcError, JsonRpcId, JsonRpcRequest, JsonRpcResponse};
use crate::invocation::ports::UpstreamClient;
use crate::tool_registry::{
    ports::SchemaFetcher,
    services::{RefreshError, RefreshReport},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use mockable::Clock;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

/// Header carrying the informational session identifier.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Default path of the JSON-RPC endpoint.
pub const DEFAULT_MCP_PATH: &str = "/mcp";

type SharedFrontEnd<F, C, U> = Arc<McpFrontEnd<F, C, U>>;

/// Builds the gateway router.
///
/// Routes: `POST {mcp_path}`, `GET /health`, `POST /admin/refresh` and
/// `POST /admin/refresh/{service}`.
pub fn router<F, C, U>(front_end: SharedFrontEnd<F, C, U>, mcp_path: &str) -> Router
where
    F: SchemaFetcher + 'static,
    C: Clock + Send + Sync + 'static,
    U: UpstreamClient + 'static,
{
    Router::new()
        .route(mcp_path, post(mcp_post::<F, C, U>))
        .route("/health", get(health::<F, C, U>))
        .route("/admin/refresh", post(refresh_all::<F, C, U>))
        .route("/admin/refresh/{service}", post(refresh_one::<F, C, U>))
        .layer(TraceLayer::new_for_http())
        .with_state(front_end)
}

/// Serves the router until Ctrl-C is received.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "gateway listening");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "ctrl-c handler unavailable; serving until killed");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn mcp_post<F, C, U>(
    State(front_end): State<SharedFrontEnd<F, C, U>>,
    body: String,
) -> Response
where
    F: SchemaFetcher + 'static,
    C: Clock + Send + Sync + 'static,
    U: UpstreamClient + 'static,
{
    let value: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(err) => {
            let error = JsonRpcError::parse_error(err.to_string());
            return rpc_response(JsonRpcResponse::failure(JsonRpcId::Null, error), None);
        }
    };

    if value.is_array() {
        let error = JsonRpcError::batch_not_supported();
        return rpc_response(JsonRpcResponse::failure(JsonRpcId::Null, error), None);
    }

    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(err) => {
            let error = JsonRpcError::invalid_request(err.to_string());
            return rpc_response(JsonRpcResponse::failure(JsonRpcId::Null, error), None);
        }
    };

    let session_id = (request.method == "initialize" && !request.is_notification())
        .then(|| Uuid::new_v4().to_string());
    front_end.handle(request).await.map_or_else(
        || StatusCode::ACCEPTED.into_response(),
        |response| rpc_response(response, session_id.as_deref()),
    )
}

fn rpc_response(response: JsonRpcResponse, session_id: Option<&str>) -> Response {
    let mut http = Json(response).into_response();
    if let Some(value) = session_id.and_then(|id| HeaderValue::from_str(id).ok()) {
        http.headers_mut().insert(SESSION_HEADER, value);
    }
    http
}

async fn health<F, C, U>(State(front_end): State<SharedFrontEnd<F, C, U>>) -> Response
where
    F: SchemaFetcher + 'static,
    C: Clock + Send + Sync + 'static,
    U: UpstreamClient + 'static,
{
    Json(front_end.health().await).into_response()
}

/// Refresh failure as reported by the admin routes.
#[derive(Debug, Clone, Serialize)]
struct RefreshFailure {
    kind: &'static str,
    message: String,
}

impl From<&RefreshError> for RefreshFailure {
    fn from(err: &RefreshError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct RefreshEntry {
    service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<RefreshReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RefreshFailure>,
}

#[derive(Debug, Clone, Serialize)]
struct ErrorBody {
    error: RefreshFailure,
}

async fn refresh_all<F, C, U>(State(front_end): State<SharedFrontEnd<F, C, U>>) -> Response
where
    F: SchemaFetcher + 'static,
    C: Clock + Send + Sync + 'static,
    U: UpstreamClient + 'static,
{
    let entries: Vec<RefreshEntry> = front_end
        .registry()
        .refresh_all()
        .await
        .into_iter()
        .map(|(service, result)| RefreshEntry {
            service: service.as_str().to_owned(),
            error: result.as_ref().err().map(RefreshFailure::from),
            report: result.ok(),
        })
        .collect();
    Json(entries).into_response()
}

async fn refresh_one<F, C, U>(
    State(front_end): State<SharedFrontEnd<F, C, U>>,
    Path(service): Path<String>,
) -> Response
where
    F: SchemaFetcher + 'static,
    C: Clock + Send + Sync + 'static,
    U: UpstreamClient + 'static,
{
    front_end.registry().refresh(&service).await.map_or_else(
        |err| {
            let status = match err {
                RefreshError::UnknownService(_) => StatusCode::NOT_FOUND,
                RefreshError::Compile(_) | RefreshError::ToolNameConflict(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                RefreshError::Fetch(_) => StatusCode::BAD_GATEWAY,
            };
            let body = ErrorBody {
                error: RefreshFailure::from(&err),
            };
            (status, Json(body)).into_response()
        },
        |report| Json(report).into_response(),
    )
}
