//! Schema fetcher port for service discovery.

use crate::tool_registry::domain::{SchemaFingerprint, ServiceDescriptor, ServiceName};
use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Result type for schema fetcher operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Retrieves health and API-schema documents of downstream services.
///
/// Implementations perform no retries and mutate no registry state.
#[async_trait]
pub trait SchemaFetcher: Send + Sync {
    /// Probes the health endpoint, then fetches and parses the schema.
    async fn fetch(&self, service: &ServiceDescriptor) -> FetchResult<SchemaDocument>;

    /// Probes only the health endpoint.
    async fn check_health(&self, service: &ServiceDescriptor) -> FetchResult<()>;
}

/// Errors returned by schema fetcher adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The health probe failed or timed out.
    #[error("service {service} is unreachable: {reason}")]
    ServiceUnreachable {
        /// Service name.
        service: ServiceName,
        /// Diagnostic reason.
        reason: String,
    },

    /// The schema could not be retrieved or was not a JSON document.
    #[error("schema of service {service} is unavailable: {reason}")]
    SchemaUnavailable {
        /// Service name.
        service: ServiceName,
        /// Diagnostic reason.
        reason: String,
    },
}

impl FetchError {
    /// Returns the stable error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ServiceUnreachable { .. } => "ServiceUnreachable",
            Self::SchemaUnavailable { .. } => "SchemaUnavailable",
        }
    }
}

/// A parsed schema document and the fingerprint of its source bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    body: Value,
    fingerprint: SchemaFingerprint,
}

impl SchemaDocument {
    /// Parses raw bytes as a JSON document.
    ///
    /// # Errors
    ///
    /// Returns the JSON parse error when the bytes are not a JSON document.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let body = serde_json::from_slice(bytes)?;
        Ok(Self {
            body,
            fingerprint: fingerprint_of(bytes),
        })
    }

    /// Wraps an in-memory document, fingerprinting its serialized form.
    #[must_use]
    pub fn from_value(body: Value) -> Self {
        let fingerprint = fingerprint_of(body.to_string().as_bytes());
        Self { body, fingerprint }
    }

    /// Returns the parsed document.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.body
    }

    /// Returns the SHA-256 fingerprint.
    #[must_use]
    pub const fn fingerprint(&self) -> &SchemaFingerprint {
        &self.fingerprint
    }
}

fn fingerprint_of(bytes: &[u8]) -> SchemaFingerprint {
    SchemaFingerprint::new(format!("{:x}", Sha256::digest(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_bytes_share_a_fingerprint() {
        let first = SchemaDocument::from_bytes(br#"{"openapi":"3.0.0"}"#).expect("valid JSON");
        let second = SchemaDocument::from_bytes(br#"{"openapi":"3.0.0"}"#).expect("valid JSON");
        let changed = SchemaDocument::from_bytes(br#"{"openapi":"3.0.1"}"#).expect("valid JSON");

        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_ne!(first.fingerprint(), changed.fingerprint());
        assert_eq!(first.fingerprint().as_str().len(), 64);
        assert_eq!(first.body(), &json!({"openapi": "3.0.0"}));
    }

    #[test]
    fn non_json_bytes_are_rejected() {
        assert!(SchemaDocument::from_bytes(b"<html>").is_err());
    }
}
