//! Upstream client port used to reach downstream REST services.

use crate::invocation::domain::{HttpOutcome, HttpRequest};
use crate::tool_registry::domain::ServiceDescriptor;
use async_trait::async_trait;

/// Sends materialized requests to downstream services.
///
/// Implementations apply the service timeout and never retry. Every failure
/// is reported as an [`HttpOutcome`], never as an error.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Sends one request to `service`.
    async fn send(&self, service: &ServiceDescriptor, request: &HttpRequest) -> HttpOutcome;
}
