//! Application services for tool discovery and lookup.

mod registry;

pub use registry::{
    RefreshError, RefreshReport, RefreshResult, ServiceStatus, ToolRegistry,
    ToolRegistryBuildError,
};
