//! Service layer owning discovered tools and their atomic refresh.

use crate::schema::{self, CompileError};
use arc_swap::ArcSwap;
use crate::tool_registry::{
    domain::{
        DiscoveredTools, RegistrySnapshot, SchemaFingerprint, ServiceDescriptor,
        ServiceHealthSnapshot, ServiceHealthStatus, ServiceName, Tool, ToolNameConflict,
    },
    ports::{FetchError, SchemaFetcher},
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use mockable::Clock;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{Instrument, info, info_span, warn};

/// Errors returned when building a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolRegistryBuildError {
    /// Two descriptors share a service name.
    #[error("service {0} is configured more than once")]
    DuplicateService(ServiceName),
}

/// Errors returned by [`ToolRegistry::refresh`].
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    /// No service with the given name is configured.
    #[error("unknown service {0}")]
    UnknownService(String),
    /// The health probe or schema fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The schema document could not be compiled.
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// A compiled tool name is already published by another service.
    #[error(transparent)]
    ToolNameConflict(#[from] ToolNameConflict),
}

impl RefreshError {
    /// Returns the stable error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownService(_) => "UnknownService",
            Self::Fetch(err) => err.kind(),
            Self::Compile(err) => err.kind(),
            Self::ToolNameConflict(_) => "ToolNameConflict",
        }
    }
}

/// Result type for registry refresh operations.
pub type RefreshResult<T> = Result<T, RefreshError>;

/// Outcome of a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    /// Refreshed service.
    pub service: ServiceName,
    /// Number of tools now published for the service.
    pub tool_count: usize,
    /// Whether the schema fingerprint differs from the previous discovery.
    pub changed: bool,
    /// Fingerprint of the compiled schema.
    pub fingerprint: SchemaFingerprint,
    /// Snapshot version that published the tools.
    pub version: u64,
}

/// Per-service view used by health reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    /// Service name.
    pub service: ServiceName,
    /// Last recorded health.
    pub health: ServiceHealthSnapshot,
    /// Number of published tools.
    pub tool_count: usize,
    /// Fingerprint of the last compiled schema.
    pub fingerprint: Option<SchemaFingerprint>,
    /// Time of the last successful discovery.
    pub discovered_at: Option<DateTime<Utc>>,
}

/// Registry of tools compiled from every configured service.
///
/// Readers clone the current snapshot pointer and never observe a partial
/// update. Refreshes of one service are serialized; refreshes of different
/// services run their I/O independently and only contend while swapping
/// the snapshot pointer.
pub struct ToolRegistry<F, C>
where
    F: SchemaFetcher,
    C: Clock + Send + Sync,
{
    services: Vec<RegisteredService>,
    fetcher: Arc<F>,
    clock: Arc<C>,
    snapshot: ArcSwap<RegistrySnapshot>,
    publish_lock: std::sync::Mutex<()>,
}

struct RegisteredService {
    descriptor: Arc<ServiceDescriptor>,
    refresh_lock: Mutex<()>,
}

impl<F, C> ToolRegistry<F, C>
where
    F: SchemaFetcher,
    C: Clock + Send + Sync,
{
    /// Creates a registry with one empty slice per service, in the given
    /// registration order.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryBuildError::DuplicateService`] when two
    /// descriptors share a name.
    pub fn new(
        services: Vec<ServiceDescriptor>,
        fetcher: Arc<F>,
        clock: Arc<C>,
    ) -> Result<Self, ToolRegistryBuildError> {
        let mut seen = HashSet::with_capacity(services.len());
        for service in &services {
            if !seen.insert(service.name().clone()) {
                return Err(ToolRegistryBuildError::DuplicateService(
                    service.name().clone(),
                ));
            }
        }
        let descriptors: Vec<Arc<ServiceDescriptor>> =
            services.into_iter().map(Arc::new).collect();
        let initial = RegistrySnapshot::new(&descriptors, clock.utc());

        Ok(Self {
            services: descriptors
                .into_iter()
                .map(|descriptor| RegisteredService {
                    descriptor,
                    refresh_lock: Mutex::new(()),
                })
                .collect(),
            fetcher,
            clock,
            snapshot: ArcSwap::from_pointee(initial),
            publish_lock: std::sync::Mutex::new(()),
        })
    }

    /// Iterates the configured services in registration order.
    pub fn services(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.iter().map(|entry| entry.descriptor.as_ref())
    }

    /// Returns the current snapshot without blocking on writers.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snapshot.load_full()
    }

    /// Returns every tool, ordered by service registration then operation.
    #[must_use]
    pub fn list(&self) -> Vec<Arc<Tool>> {
        self.snapshot().tools().cloned().collect()
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn resolve(&self, tool_name: &str) -> Option<Arc<Tool>> {
        self.snapshot().resolve(tool_name).cloned()
    }

    /// Returns health, tool count and discovery metadata for every service.
    #[must_use]
    pub fn service_statuses(&self) -> Vec<ServiceStatus> {
        self.snapshot()
            .slices()
            .iter()
            .map(|slice| ServiceStatus {
                service: slice.service().name().clone(),
                health: slice.health().clone(),
                tool_count: slice.tools().len(),
                fingerprint: slice.fingerprint().cloned(),
                discovered_at: slice.discovered_at(),
            })
            .collect()
    }

    /// Fetches and compiles the schema of one service and publishes its
    /// tools.
    ///
    /// On failure the previously published tools stay available. An
    /// unreachable service is additionally recorded as unhealthy.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError`] when the service is unknown, unreachable,
    /// its schema is unavailable or invalid, or a tool name conflicts with
    /// another service.
    pub async fn refresh(&self, service: &str) -> RefreshResult<RefreshReport> {
        let (position, entry) = self.lookup(service)?;
        let span = info_span!("registry.refresh", service = %entry.descriptor.name());
        async {
            let _guard = entry.refresh_lock.lock().await;
            let result = self.discover(position, &entry.descriptor).await;
            match &result {
                Ok(report) => info!(
                    tool_count = report.tool_count,
                    changed = report.changed,
                    version = report.version,
                    "discovered tools"
                ),
                Err(err) => warn!(kind = err.kind(), error = %err, "refresh failed; keeping known tools"),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Refreshes every service concurrently.
    ///
    /// Results are returned in registration order.
    pub async fn refresh_all(&self) -> Vec<(ServiceName, RefreshResult<RefreshReport>)> {
        let refreshes = self.services.iter().map(|entry| async move {
            let name = entry.descriptor.name();
            (name.clone(), self.refresh(name.as_str()).await)
        });
        join_all(refreshes).await
    }

    /// Probes the health endpoint of one service and records the outcome
    /// without touching its tools.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError::UnknownService`] for unknown names. Probe
    /// failures are recorded, not returned.
    pub async fn check_health(&self, service: &str) -> RefreshResult<ServiceHealthSnapshot> {
        let (position, entry) = self.lookup(service)?;
        let probe = self.fetcher.check_health(&entry.descriptor).await;
        let health = ServiceHealthSnapshot::from_probe(self.clock.utc(), &probe);
        if health.status() == ServiceHealthStatus::Unhealthy {
            warn!(service = %entry.descriptor.name(), message = health.message().unwrap_or_default(), "health check failed");
        }
        self.publish(|current| current.with_health(position, health.clone()));
        Ok(health)
    }

    fn lookup(&self, service: &str) -> RefreshResult<(usize, &RegisteredService)> {
        self.services
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.descriptor.name().as_str() == service)
            .ok_or_else(|| RefreshError::UnknownService(service.to_owned()))
    }

    async fn discover(
        &self,
        position: usize,
        descriptor: &Arc<ServiceDescriptor>,
    ) -> RefreshResult<RefreshReport> {
        let document = match self.fetcher.fetch(descriptor).await {
            Ok(document) => document,
            Err(err) => {
                if matches!(err, FetchError::ServiceUnreachable { .. }) {
                    let health = ServiceHealthSnapshot::unreachable(self.clock.utc(), &err);
                    self.publish(|current| current.with_health(position, health.clone()));
                }
                return Err(err.into());
            }
        };

        let operations = schema::compile(document.body(), descriptor.name())?;
        let tools: Vec<Arc<Tool>> = operations
            .into_iter()
            .map(|operation| Arc::new(Tool::from_operation(Arc::clone(descriptor), Arc::new(operation))))
            .collect();
        let tool_count = tools.len();
        let fingerprint = document.fingerprint().clone();
        let discovered = DiscoveredTools {
            tools,
            fingerprint: fingerprint.clone(),
            discovered_at: self.clock.utc(),
        };

        let _publishing = self.publish_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.snapshot.load();
        let previous = current
            .slices()
            .get(position)
            .and_then(|slice| slice.fingerprint().cloned());
        let Some(next) = current.with_discovered(position, discovered)? else {
            return Err(RefreshError::UnknownService(
                descriptor.name().as_str().to_owned(),
            ));
        };
        let version = next.version();
        self.snapshot.store(Arc::new(next));

        Ok(RefreshReport {
            service: descriptor.name().clone(),
            tool_count,
            changed: previous.as_ref() != Some(&fingerprint),
            fingerprint,
            version,
        })
    }

    /// Writers are serialized so that concurrent updates of different
    /// services cannot overwrite each other.
    fn publish(&self, update: impl FnOnce(&RegistrySnapshot) -> Option<RegistrySnapshot>) {
        let _publishing = self.publish_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(next) = update(&self.snapshot.load()) {
            self.snapshot.store(Arc::new(next));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool_registry::adapters::InMemorySchemaFetcher;
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};
    use std::time::Duration;

    type TestRegistry = ToolRegistry<InMemorySchemaFetcher, DefaultClock>;

    fn name(raw: &str) -> ServiceName {
        ServiceName::new(raw).expect("valid service name")
    }

    fn descriptor(raw: &str, port: u16) -> ServiceDescriptor {
        ServiceDescriptor::new(name(raw), format!("http://localhost:{port}"))
            .expect("valid descriptor")
    }

    fn document(operation_ids: &[&str]) -> Value {
        let paths: serde_json::Map<String, Value> = operation_ids
            .iter()
            .map(|id| {
                (
                    format!("/{id}"),
                    json!({"get": {"operationId": id, "responses": {"200": {"description": "OK"}}}}),
                )
            })
            .collect();
        json!({"openapi": "3.0.0", "paths": paths})
    }

    #[fixture]
    fn fetcher() -> Arc<InMemorySchemaFetcher> {
        Arc::new(InMemorySchemaFetcher::new())
    }

    fn build(fetcher: &Arc<InMemorySchemaFetcher>) -> TestRegistry {
        ToolRegistry::new(
            vec![descriptor("customer", 8001), descriptor("order", 8002)],
            Arc::clone(fetcher),
            Arc::new(DefaultClock),
        )
        .expect("unique services")
    }

    #[test]
    fn duplicate_services_are_rejected() {
        let result = ToolRegistry::new(
            vec![descriptor("customer", 8001), descriptor("customer", 8002)],
            Arc::new(InMemorySchemaFetcher::new()),
            Arc::new(DefaultClock),
        );
        assert!(matches!(
            result,
            Err(ToolRegistryBuildError::DuplicateService(_))
        ));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn refresh_publishes_tools_in_registration_order(fetcher: Arc<InMemorySchemaFetcher>) {
        fetcher.set_document(&name("order"), document(&["listOrders"]));
        fetcher.set_document(&name("customer"), document(&["listCustomers", "getCustomer"]));
        let registry = build(&fetcher);

        let results = registry.refresh_all().await;
        let names: Vec<String> = registry
            .list()
            .iter()
            .map(|tool| tool.name().to_string())
            .collect();

        assert!(results.iter().all(|(_, result)| result.is_ok()));
        assert_eq!(
            names,
            vec![
                "customer_getCustomer",
                "customer_listCustomers",
                "order_listOrders"
            ]
        );
        assert!(registry.resolve("order_listOrders").is_some());
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn readers_do_not_wait_for_a_publishing_writer(fetcher: Arc<InMemorySchemaFetcher>) {
        fetcher.set_document(&name("customer"), document(&["listCustomers"]));
        let registry = build(&fetcher);
        registry.refresh("customer").await.expect("refresh succeeds");

        let _publishing = registry.publish_lock.lock().expect("publish lock is free");

        assert_eq!(registry.list().len(), 1);
        assert!(registry.resolve("customer_listCustomers").is_some());
        assert_eq!(registry.service_statuses().len(), 2);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn failed_refresh_keeps_known_tools(fetcher: Arc<InMemorySchemaFetcher>) {
        fetcher.set_document(&name("order"), document(&["listOrders"]));
        let registry = build(&fetcher);
        registry.refresh("order").await.expect("first discovery");

        fetcher.set_unreachable(&name("order"), "timed out");
        let err = registry
            .refresh("order")
            .await
            .expect_err("service is unreachable");

        assert_eq!(err.kind(), "ServiceUnreachable");
        assert!(registry.resolve("order_listOrders").is_some());
        let status = registry
            .service_statuses()
            .into_iter()
            .find(|status| status.service.as_str() == "order")
            .expect("order status");
        assert_eq!(status.health.status(), ServiceHealthStatus::Unhealthy);
        assert_eq!(status.tool_count, 1);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn invalid_schema_keeps_known_tools(fetcher: Arc<InMemorySchemaFetcher>) {
        fetcher.set_document(&name("customer"), document(&["listCustomers"]));
        let registry = build(&fetcher);
        registry.refresh("customer").await.expect("first discovery");

        fetcher.set_document(&name("customer"), json!({"swagger": "1.2"}));
        let err = registry
            .refresh("customer")
            .await
            .expect_err("schema is invalid");

        assert_eq!(err.kind(), "SchemaInvalid");
        assert_eq!(registry.list().len(), 1);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn unknown_services_are_rejected(fetcher: Arc<InMemorySchemaFetcher>) {
        let registry = build(&fetcher);
        let err = registry
            .refresh("billing")
            .await
            .expect_err("billing is not configured");
        assert_eq!(err.kind(), "UnknownService");
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn refresh_reports_schema_changes(fetcher: Arc<InMemorySchemaFetcher>) {
        fetcher.set_document(&name("customer"), document(&["listCustomers"]));
        let registry = build(&fetcher);

        let first = registry.refresh("customer").await.expect("first discovery");
        let unchanged = registry.refresh("customer").await.expect("second discovery");
        fetcher.set_document(&name("customer"), document(&["listCustomers", "getCustomer"]));
        let changed = registry.refresh("customer").await.expect("third discovery");

        assert!(first.changed);
        assert!(!unchanged.changed);
        assert!(changed.changed);
        assert_eq!(changed.tool_count, 2);
        assert!(changed.version > first.version);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_refreshes_of_one_service_are_serialized(
        fetcher: Arc<InMemorySchemaFetcher>,
    ) {
        fetcher.set_document(&name("customer"), document(&["listCustomers"]));
        fetcher.set_delay(&name("customer"), Duration::from_millis(50));
        let registry = build(&fetcher);

        let (first, second) = tokio::join!(registry.refresh("customer"), registry.refresh("customer"));
        let versions = [
            first.expect("first refresh").version,
            second.expect("second refresh").version,
        ];

        assert_eq!(fetcher.fetch_count(&name("customer")), 2);
        assert!(versions.contains(&1));
        assert!(versions.contains(&2));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn health_checks_do_not_touch_tools(fetcher: Arc<InMemorySchemaFetcher>) {
        fetcher.set_document(&name("customer"), document(&["listCustomers"]));
        let registry = build(&fetcher);
        registry.refresh("customer").await.expect("discovery");

        fetcher.set_unreachable(&name("customer"), "connection refused");
        let health = registry
            .check_health("customer")
            .await
            .expect("known service");

        assert_eq!(health.status(), ServiceHealthStatus::Unhealthy);
        assert_eq!(registry.list().len(), 1);
    }
}
