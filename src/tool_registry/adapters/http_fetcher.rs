//! Schema fetcher over HTTP using `reqwest`.

use crate::tool_registry::{
    domain::ServiceDescriptor,
    ports::{FetchError, FetchResult, SchemaDocument, SchemaFetcher},
};
use async_trait::async_trait;
use tracing::debug;

/// Fetches health and schema documents with a shared `reqwest` client.
///
/// Every request carries the service's own timeout. Nothing is retried.
#[derive(Debug, Clone)]
pub struct ReqwestSchemaFetcher {
    client: reqwest::Client,
}

impl ReqwestSchemaFetcher {
    /// Creates a fetcher around an existing client.
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SchemaFetcher for ReqwestSchemaFetcher {
    async fn fetch(&self, service: &ServiceDescriptor) -> FetchResult<SchemaDocument> {
        self.check_health(service).await?;

        let url = service.endpoint_url(service.schema_path());
        debug!(service = %service.name(), %url, "fetching schema");
        let unavailable = |reason: String| FetchError::SchemaUnavailable {
            service: service.name().clone(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .timeout(service.timeout())
            .send()
            .await
            .map_err(|err| unavailable(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("schema endpoint returned {status}")));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| unavailable(err.to_string()))?;
        SchemaDocument::from_bytes(&bytes)
            .map_err(|err| unavailable(format!("schema is not a JSON document: {err}")))
    }

    async fn check_health(&self, service: &ServiceDescriptor) -> FetchResult<()> {
        let url = service.endpoint_url(service.health_path());
        debug!(service = %service.name(), %url, "probing health");
        let unreachable = |reason: String| FetchError::ServiceUnreachable {
            service: service.name().clone(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .timeout(service.timeout())
            .send()
            .await
            .map_err(|err| unreachable(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(unreachable(format!("health endpoint returned {status}")))
        }
    }
}
