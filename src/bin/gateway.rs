//! Gateway binary: discovers downstream REST services and serves them as
//! MCP tools over HTTP.
//!
//! Configuration comes from an optional JSON file (`--config` or
//! `GATEWAY_CONFIG`); without one the three demo services on ports 8001 to
//! 8003 are used. Every service is discovered once at startup; later
//! re-discovery happens through `POST /admin/refresh`.

use camino::Utf8PathBuf;
use clap::Parser;
use mockable::DefaultClock;
use rest_mcp_gateway::config::GatewayConfig;
use rest_mcp_gateway::invocation::{adapters::ReqwestUpstreamClient, services::ToolInvoker};
use rest_mcp_gateway::mcp::{McpFrontEnd, router, serve};
use rest_mcp_gateway::telemetry::init_tracing;
use rest_mcp_gateway::tool_registry::{adapters::ReqwestSchemaFetcher, services::ToolRegistry};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::runtime::Builder;
use tracing::{info, warn};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Parser)]
#[command(
    name = "rest-mcp-gateway",
    version,
    about = "Expose REST services described by OpenAPI as MCP tools"
)]
struct Args {
    /// JSON configuration file.
    #[arg(long, env = "GATEWAY_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Listener address, overriding the configuration file.
    #[arg(long, env = "GATEWAY_LISTEN")]
    listen: Option<SocketAddr>,

    /// Log filter directive, overriding `RUST_LOG`.
    #[arg(long, env = "GATEWAY_LOG")]
    log: Option<String>,
}

fn main() -> Result<(), BoxError> {
    let args = Args::parse();
    init_tracing(args.log.as_deref())?;

    let mut config = args
        .config
        .as_deref()
        .map_or_else(|| Ok(GatewayConfig::default()), GatewayConfig::load)?;
    if let Some(listen) = args.listen {
        config.listen = listen;
    }

    let runtime = Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(run(config))
}

async fn run(config: GatewayConfig) -> Result<(), BoxError> {
    let services = config.service_descriptors()?;
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;

    let registry = Arc::new(ToolRegistry::new(
        services,
        Arc::new(ReqwestSchemaFetcher::new(client.clone())),
        Arc::new(DefaultClock),
    )?);

    let failed = registry
        .refresh_all()
        .await
        .into_iter()
        .filter(|(_, result)| result.is_err())
        .count();
    let tool_count = registry.snapshot().tool_count();
    if failed > 0 {
        warn!(failed, tool_count, "initial discovery incomplete");
    } else {
        info!(tool_count, "initial discovery finished");
    }

    let front_end = Arc::new(McpFrontEnd::new(
        registry,
        ToolInvoker::new(Arc::new(ReqwestUpstreamClient::new(client))),
    ));
    let app = router(front_end, &config.mcp_path);
    let listener = TcpListener::bind(config.listen).await?;
    serve(listener, app).await?;
    Ok(())
}
