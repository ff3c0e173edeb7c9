//! Schema-driven gateway exposing REST services as MCP tools.
//!
//! Each configured downstream service publishes an OpenAPI 3 or Swagger 2
//! document. The gateway compiles every operation into a tool, serves the
//! tools over JSON-RPC, and translates each `tools/call` into one HTTP
//! request against the owning service.
//!
//! # Architecture
//!
//! The gateway follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (HTTP clients, in-memory doubles)
//!
//! # Modules
//!
//! - [`schema`]: Compiles schema documents into operations
//! - [`tool_registry`]: Discovery, refresh and lookup of tools per service
//! - [`invocation`]: Argument validation, request translation and response mapping
//! - [`mcp`]: JSON-RPC front end and HTTP transport
//! - [`config`]: Configuration file loading
//! - [`telemetry`]: Log subscriber setup

pub mod config;
pub mod invocation;
pub mod mcp;
pub mod schema;
pub mod telemetry;
pub mod tool_registry;
