//! Service executing tool calls: translate, send, map.

use crate::invocation::{
    domain::{InvocationResult, ToolError, map_outcome, translate},
    ports::UpstreamClient,
};
use crate::tool_registry::domain::Tool;
use serde_json::Value;
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span, warn};

/// Executes tool calls against downstream services.
#[derive(Clone)]
pub struct ToolInvoker<U>
where
    U: UpstreamClient,
{
    upstream: Arc<U>,
}

impl<U> ToolInvoker<U>
where
    U: UpstreamClient,
{
    /// Creates an invoker around an upstream client.
    #[must_use]
    pub const fn new(upstream: Arc<U>) -> Self {
        Self { upstream }
    }

    /// Validates the arguments, calls the downstream service and maps the
    /// outcome.
    ///
    /// Validation failures are returned without any network call.
    pub async fn invoke(&self, tool: &Tool, arguments: Option<&Value>) -> InvocationResult {
        let span = info_span!(
            "tool.invoke",
            tool = %tool.name(),
            service = %tool.service().name()
        );
        async {
            let request = match translate(tool, arguments) {
                Ok(request) => request,
                Err(err) => {
                    info!(kind = %err.kind(), error = %err, "rejected tool arguments");
                    return InvocationResult::Failure(ToolError::from(err));
                }
            };
            debug!(method = %request.method, url = %request.url, "translated request");

            let outcome = self.upstream.send(tool.service(), &request).await;
            let result = map_outcome(outcome);
            match &result {
                InvocationResult::Success { status, .. } => {
                    info!(status, "tool call succeeded");
                }
                InvocationResult::Failure(error) => {
                    warn!(kind = %error.kind, status = error.status, message = %error.message, "tool call failed");
                }
            }
            result
        }
        .instrument(span)
        .await
    }
}
