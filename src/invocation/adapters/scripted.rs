//! Scripted upstream client for deterministic invocation tests.

use crate::invocation::{
    domain::{HttpOutcome, HttpRequest, TransportFailure, TransportFailureKind, UpstreamResponse},
    ports::UpstreamClient,
};
use crate::tool_registry::domain::ServiceDescriptor;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

/// Upstream client that replays queued outcomes and records every request.
///
/// When the queue is empty the client answers with a transport failure, so
/// an unexpected call is visible in test assertions.
#[derive(Debug, Clone, Default)]
pub struct ScriptedUpstreamClient {
    state: Arc<RwLock<ScriptedState>>,
}

#[derive(Debug, Default)]
struct ScriptedState {
    outcomes: VecDeque<HttpOutcome>,
    calls: Vec<HttpRequest>,
}

impl ScriptedUpstreamClient {
    /// Creates a client with no queued outcomes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an arbitrary outcome.
    pub fn push_outcome(&self, outcome: HttpOutcome) {
        self.write().outcomes.push_back(outcome);
    }

    /// Queues a JSON response with the given status.
    pub fn push_json(&self, status: u16, body: &Value) {
        self.push_outcome(HttpOutcome::Completed(
            UpstreamResponse::new(status, body.to_string()),
        ));
    }

    /// Returns every request sent so far.
    #[must_use]
    pub fn calls(&self) -> Vec<HttpRequest> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
            .clone()
    }

    fn write(&self) -> RwLockWriteGuard<'_, ScriptedState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UpstreamClient for ScriptedUpstreamClient {
    async fn send(&self, _service: &ServiceDescriptor, request: &HttpRequest) -> HttpOutcome {
        let mut state = self.write();
        state.calls.push(request.clone());
        state.outcomes.pop_front().unwrap_or_else(|| {
            HttpOutcome::Failed(TransportFailure::new(
                TransportFailureKind::Connect,
                "no scripted outcome",
            ))
        })
    }
}
