//! In-memory schema fetcher for deterministic discovery tests.

use crate::tool_registry::{
    domain::{ServiceDescriptor, ServiceName},
    ports::{FetchError, FetchResult, SchemaDocument, SchemaFetcher},
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// In-memory schema fetcher.
///
/// Documents and failures are scripted per service. Services without a
/// scripted document report `SchemaUnavailable`.
#[derive(Debug, Clone, Default)]
pub struct InMemorySchemaFetcher {
    state: Arc<RwLock<InMemoryFetcherState>>,
}

#[derive(Debug, Default)]
struct InMemoryFetcherState {
    documents: HashMap<ServiceName, Value>,
    unreachable: HashMap<ServiceName, String>,
    delays: HashMap<ServiceName, Duration>,
    fetch_counts: HashMap<ServiceName, usize>,
}

impl InMemorySchemaFetcher {
    /// Creates an empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a schema document for a service, replacing any previous one.
    pub fn set_document(&self, service: &ServiceName, document: Value) {
        self.write().documents.insert(service.clone(), document);
    }

    /// Makes the health probe of a service fail with `reason`.
    pub fn set_unreachable(&self, service: &ServiceName, reason: impl Into<String>) {
        self.write()
            .unreachable
            .insert(service.clone(), reason.into());
    }

    /// Delays every fetch of a service, simulating a slow schema endpoint.
    pub fn set_delay(&self, service: &ServiceName, delay: Duration) {
        self.write().delays.insert(service.clone(), delay);
    }

    /// Returns how many schema fetches were attempted for a service.
    #[must_use]
    pub fn fetch_count(&self, service: &ServiceName) -> usize {
        self.read().fetch_counts.get(service).copied().unwrap_or(0)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, InMemoryFetcherState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InMemoryFetcherState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn probe(&self, service: &ServiceDescriptor) -> FetchResult<()> {
        self.read()
            .unreachable
            .get(service.name())
            .map_or(Ok(()), |reason| {
                Err(FetchError::ServiceUnreachable {
                    service: service.name().clone(),
                    reason: reason.clone(),
                })
            })
    }
}

#[async_trait]
impl SchemaFetcher for InMemorySchemaFetcher {
    async fn fetch(&self, service: &ServiceDescriptor) -> FetchResult<SchemaDocument> {
        let delay = {
            let mut state = self.write();
            *state.fetch_counts.entry(service.name().clone()).or_insert(0) += 1;
            state.delays.get(service.name()).copied()
        };
        if let Some(duration) = delay {
            tokio::time::sleep(duration).await;
        }

        self.probe(service)?;
        self.read()
            .documents
            .get(service.name())
            .cloned()
            .map(SchemaDocument::from_value)
            .ok_or_else(|| FetchError::SchemaUnavailable {
                service: service.name().clone(),
                reason: "no schema document published".to_owned(),
            })
    }

    async fn check_health(&self, service: &ServiceDescriptor) -> FetchResult<()> {
        self.probe(service)
    }
}
