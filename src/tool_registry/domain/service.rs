//! Downstream service descriptor value object.

use super::{ServiceName, ToolRegistryDomainError};
use std::time::Duration;
use url::Url;

/// Default health endpoint path.
pub const DEFAULT_HEALTH_PATH: &str = "/health";

/// Default schema endpoint path.
pub const DEFAULT_SCHEMA_PATH: &str = "/openapi.json";

/// Default timeout applied to every outbound call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable configuration of one downstream REST service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    name: ServiceName,
    base_url: Url,
    health_path: String,
    schema_path: String,
    timeout: Duration,
}

impl ServiceDescriptor {
    /// Creates a descriptor with default endpoint paths and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError`] when the base URL is empty, not
    /// absolute, or not `http`/`https`.
    pub fn new(
        name: ServiceName,
        base_url: impl Into<String>,
    ) -> Result<Self, ToolRegistryDomainError> {
        let normalized = base_url.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(ToolRegistryDomainError::EmptyBaseUrl);
        }

        let has_valid_prefix =
            normalized.starts_with("http://") || normalized.starts_with("https://");
        if !has_valid_prefix {
            return Err(ToolRegistryDomainError::InvalidBaseUrl(normalized));
        }

        let parsed = Url::parse(&normalized)
            .map_err(|_| ToolRegistryDomainError::InvalidBaseUrl(normalized.clone()))?;
        if parsed.cannot_be_a_base() {
            return Err(ToolRegistryDomainError::InvalidBaseUrl(normalized));
        }

        Ok(Self {
            name,
            base_url: parsed,
            health_path: DEFAULT_HEALTH_PATH.to_owned(),
            schema_path: DEFAULT_SCHEMA_PATH.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Overrides the health endpoint path.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::InvalidEndpointPath`] when the path
    /// does not start with `/`.
    pub fn with_health_path(
        mut self,
        path: impl Into<String>,
    ) -> Result<Self, ToolRegistryDomainError> {
        self.health_path = validate_endpoint_path(path.into())?;
        Ok(self)
    }

    /// Overrides the schema endpoint path.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::InvalidEndpointPath`] when the path
    /// does not start with `/`.
    pub fn with_schema_path(
        mut self,
        path: impl Into<String>,
    ) -> Result<Self, ToolRegistryDomainError> {
        self.schema_path = validate_endpoint_path(path.into())?;
        Ok(self)
    }

    /// Overrides the request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::ZeroTimeout`] for a zero duration.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ToolRegistryDomainError> {
        if timeout.is_zero() {
            return Err(ToolRegistryDomainError::ZeroTimeout(
                self.name.as_str().to_owned(),
            ));
        }
        self.timeout = timeout;
        Ok(self)
    }

    /// Returns the logical service name.
    #[must_use]
    pub const fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Returns the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the health endpoint path.
    #[must_use]
    pub fn health_path(&self) -> &str {
        &self.health_path
    }

    /// Returns the schema endpoint path.
    #[must_use]
    pub fn schema_path(&self) -> &str {
        &self.schema_path
    }

    /// Returns the timeout applied to outbound calls.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Joins an absolute path onto the base URL.
    ///
    /// The base URL's own path is kept as a prefix, so a base of
    /// `http://host/api` and a path of `/health` yield
    /// `http://host/api/health`.
    #[must_use]
    pub fn endpoint_url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let prefix = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{prefix}{path}"));
        url
    }

    /// Appends already rendered path segments to the base URL.
    ///
    /// Each segment is percent-encoded, so `/` or `?` inside a value cannot
    /// change the request target.
    #[must_use]
    pub fn request_url(&self, segments: &[String]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }
}

fn validate_endpoint_path(path: String) -> Result<String, ToolRegistryDomainError> {
    let normalized = path.trim().to_owned();
    if normalized.starts_with('/') {
        Ok(normalized)
    } else {
        Err(ToolRegistryDomainError::InvalidEndpointPath(normalized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn name() -> ServiceName {
        ServiceName::new("customer").expect("valid service name")
    }

    #[test]
    fn defaults_match_conventional_endpoints() {
        let descriptor =
            ServiceDescriptor::new(name(), "http://localhost:8001").expect("valid descriptor");
        assert_eq!(descriptor.health_path(), "/health");
        assert_eq!(descriptor.schema_path(), "/openapi.json");
        assert_eq!(descriptor.timeout(), Duration::from_secs(30));
    }

    #[rstest]
    #[case("http://localhost:8001", "/health", "http://localhost:8001/health")]
    #[case("http://localhost:8001/", "/health", "http://localhost:8001/health")]
    #[case("https://api.test/v1", "/openapi.json", "https://api.test/v1/openapi.json")]
    fn endpoint_url_keeps_base_prefix(
        #[case] base: &str,
        #[case] path: &str,
        #[case] expected: &str,
    ) {
        let descriptor = ServiceDescriptor::new(name(), base).expect("valid descriptor");
        assert_eq!(descriptor.endpoint_url(path).as_str(), expected);
    }

    #[rstest]
    #[case("http://localhost:8001", &["customers", "42"], "http://localhost:8001/customers/42")]
    #[case("http://localhost:8001/api/", &["a b", "x/y"], "http://localhost:8001/api/a%20b/x%2Fy")]
    fn request_url_encodes_segments(
        #[case] base: &str,
        #[case] segments: &[&str],
        #[case] expected: &str,
    ) {
        let descriptor = ServiceDescriptor::new(name(), base).expect("valid descriptor");
        let owned: Vec<String> = segments.iter().map(|segment| (*segment).to_owned()).collect();
        assert_eq!(descriptor.request_url(&owned).as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("ftp://files.test")]
    #[case("localhost:8001")]
    fn rejects_invalid_base_urls(#[case] base: &str) {
        assert!(ServiceDescriptor::new(name(), base).is_err());
    }

    #[test]
    fn rejects_relative_endpoint_paths_and_zero_timeouts() {
        let descriptor =
            ServiceDescriptor::new(name(), "http://localhost:8001").expect("valid descriptor");
        assert!(matches!(
            descriptor.clone().with_health_path("health"),
            Err(ToolRegistryDomainError::InvalidEndpointPath(_))
        ));
        assert!(matches!(
            descriptor.with_timeout(Duration::ZERO),
            Err(ToolRegistryDomainError::ZeroTimeout(_))
        ));
    }
}
