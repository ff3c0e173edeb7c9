//! Domain model for downstream services and the tools compiled from them.
//!
//! The tool registry domain models service identity and configuration,
//! compiled REST operations, the tools derived from them, and the versioned
//! snapshot that publishes tools to readers. Infrastructure concerns remain
//! outside this boundary.

mod error;
mod health;
mod ids;
mod operation;
mod parameter;
mod service;
mod snapshot;
mod tool;

pub use error::{ParseParameterTypeError, ToolRegistryDomainError};
pub use health::{ServiceHealthSnapshot, ServiceHealthStatus};
pub use ids::{ServiceName, ToolName, sanitize_identifier};
pub use operation::{
    BodyMode, HttpMethod, Operation, PathTemplate, PathTemplateError, RequestBody, ResponseHint,
};
pub use parameter::{Parameter, ParameterLocation, ParameterType};
pub use service::{DEFAULT_HEALTH_PATH, DEFAULT_SCHEMA_PATH, DEFAULT_TIMEOUT, ServiceDescriptor};
pub use snapshot::{
    DiscoveredTools, RegistrySnapshot, SchemaFingerprint, ServiceSlice, ToolNameConflict,
};
pub use tool::Tool;
