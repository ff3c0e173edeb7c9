//! MCP protocol surface over the tool registry and invoker.
//!
//! JSON-RPC 2.0 messages arrive over HTTP, are dispatched by
//! [`McpFrontEnd`], and are answered from the current registry snapshot or
//! by invoking a downstream service. The front end keeps no per-client
//! state.

pub mod front_end;
pub mod http;
pub mod jsonrpc;
pub mod types;

pub use front_end::{HealthReport, McpFrontEnd, ProtocolError};
pub use http::{DEFAULT_MCP_PATH, router, serve};
