//! Gateway configuration loaded from a JSON file.
//!
//! Service order in the file is the registration order, which in turn is
//! the order of `tools/list`. Without a file the gateway proxies the three
//! demo services on ports 8001 to 8003.

use crate::mcp::DEFAULT_MCP_PATH;
use crate::tool_registry::domain::{
    DEFAULT_HEALTH_PATH, DEFAULT_SCHEMA_PATH, DEFAULT_TIMEOUT, ServiceDescriptor, ServiceName,
    ToolRegistryDomainError,
};
use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

/// Default listener address.
pub const DEFAULT_LISTEN: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(Ipv4Addr::LOCALHOST),
    8080,
);

/// Errors raised while loading or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be opened or read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid configuration JSON.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path that was parsed.
        path: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// A service entry is invalid.
    #[error("invalid service {service}: {source}")]
    InvalidService {
        /// Service key as written.
        service: String,
        /// Validation failure.
        #[source]
        source: ToolRegistryDomainError,
    },
    /// The JSON-RPC path does not start with `/`.
    #[error("mcp_path must start with '/': {0}")]
    InvalidMcpPath(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings of one downstream service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Absolute `http`/`https` base URL.
    pub base_url: String,
    /// Health endpoint path.
    #[serde(default = "default_health_path")]
    pub health_path: String,
    /// Schema endpoint path.
    #[serde(default = "default_schema_path")]
    pub schema_path: String,
    /// Timeout for every outbound call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ServiceConfig {
    /// Creates a service entry with default paths and timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            health_path: default_health_path(),
            schema_path: default_schema_path(),
            timeout_ms: default_timeout_ms(),
        }
    }

    fn descriptor(&self, name: &str) -> ConfigResult<ServiceDescriptor> {
        let invalid = |source| ConfigError::InvalidService {
            service: name.to_owned(),
            source,
        };
        let service_name = ServiceName::new(name).map_err(invalid)?;
        ServiceDescriptor::new(service_name, self.base_url.as_str())
            .and_then(|descriptor| descriptor.with_health_path(self.health_path.as_str()))
            .and_then(|descriptor| descriptor.with_schema_path(self.schema_path.as_str()))
            .and_then(|descriptor| descriptor.with_timeout(Duration::from_millis(self.timeout_ms)))
            .map_err(invalid)
    }
}

fn default_health_path() -> String {
    DEFAULT_HEALTH_PATH.to_owned()
}

fn default_schema_path() -> String {
    DEFAULT_SCHEMA_PATH.to_owned()
}

fn default_timeout_ms() -> u64 {
    u64::try_from(DEFAULT_TIMEOUT.as_millis()).unwrap_or(u64::MAX)
}

const fn default_listen() -> SocketAddr {
    DEFAULT_LISTEN
}

fn default_mcp_path() -> String {
    DEFAULT_MCP_PATH.to_owned()
}

/// Service entries in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceTable(Vec<(String, ServiceConfig)>);

impl ServiceTable {
    /// Builds a table from entries in registration order.
    #[must_use]
    pub const fn new(entries: Vec<(String, ServiceConfig)>) -> Self {
        Self(entries)
    }

    /// Iterates the entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServiceConfig)> {
        self.0.iter().map(|(name, config)| (name.as_str(), config))
    }

    /// Returns the number of services.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether no service is configured.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for ServiceTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(ServiceTableVisitor)
    }
}

struct ServiceTableVisitor;

impl<'de> Visitor<'de> for ServiceTableVisitor {
    type Value = ServiceTable;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of service names to service settings")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, config)) = access.next_entry::<String, ServiceConfig>()? {
            if !seen.insert(name.clone()) {
                return Err(de::Error::custom(format!("duplicate service '{name}'")));
            }
            entries.push((name, config));
        }
        Ok(ServiceTable(entries))
    }
}

/// Complete gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Listener address.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Path of the JSON-RPC endpoint.
    #[serde(default = "default_mcp_path")]
    pub mcp_path: String,
    /// Downstream services in registration order.
    #[serde(default)]
    pub services: ServiceTable,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN,
            mcp_path: default_mcp_path(),
            services: ServiceTable::new(vec![
                ("customer".to_owned(), ServiceConfig::new("http://localhost:8001")),
                ("order".to_owned(), ServiceConfig::new("http://localhost:8002")),
                ("inventory".to_owned(), ServiceConfig::new("http://localhost:8003")),
            ]),
        }
    }
}

impl GatewayConfig {
    /// Reads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it is not valid configuration.
    pub fn load(path: &Utf8Path) -> ConfigResult<Self> {
        let contents = read_config_file(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Converts the service table into validated descriptors in
    /// registration order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidService`] for the first invalid entry
    /// and [`ConfigError::InvalidMcpPath`] for a relative endpoint path.
    pub fn service_descriptors(&self) -> ConfigResult<Vec<ServiceDescriptor>> {
        if !self.mcp_path.starts_with('/') {
            return Err(ConfigError::InvalidMcpPath(self.mcp_path.clone()));
        }
        self.services
            .iter()
            .map(|(name, config)| config.descriptor(name))
            .collect()
    }
}

fn read_config_file(path: &Utf8Path) -> std::io::Result<String> {
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.read_to_string(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_config_lists_demo_services() {
        let descriptors = GatewayConfig::default()
            .service_descriptors()
            .expect("valid defaults");
        let names: Vec<&str> = descriptors
            .iter()
            .map(|descriptor| descriptor.name().as_str())
            .collect();

        assert_eq!(names, vec!["customer", "order", "inventory"]);
        assert!(
            descriptors
                .iter()
                .all(|descriptor| descriptor.timeout() == DEFAULT_TIMEOUT)
        );
    }

    #[test]
    fn file_order_is_registration_order() {
        let config: GatewayConfig = serde_json::from_str(
            r#"{
                "services": {
                    "zeta": {"base_url": "http://localhost:9001"},
                    "alpha": {"base_url": "http://localhost:9002", "timeout_ms": 500}
                }
            }"#,
        )
        .expect("valid config");
        let descriptors = config.service_descriptors().expect("valid services");

        assert_eq!(config.listen, DEFAULT_LISTEN);
        assert_eq!(config.mcp_path, "/mcp");
        assert_eq!(
            descriptors
                .iter()
                .map(|descriptor| descriptor.name().as_str())
                .collect::<Vec<_>>(),
            vec!["zeta", "alpha"]
        );
        assert_eq!(
            descriptors.get(1).map(ServiceDescriptor::timeout),
            Some(Duration::from_millis(500))
        );
    }

    #[test]
    fn duplicate_service_keys_are_rejected() {
        let result = serde_json::from_str::<GatewayConfig>(
            r#"{"services": {
                "customer": {"base_url": "http://localhost:9001"},
                "customer": {"base_url": "http://localhost:9002"}
            }}"#,
        );
        assert!(result.is_err());
    }

    #[rstest]
    #[case(r#"{"services": {"bad-name": {"base_url": "http://localhost:1"}}}"#)]
    #[case(r#"{"services": {"svc": {"base_url": "ftp://localhost:1"}}}"#)]
    #[case(r#"{"services": {"svc": {"base_url": "http://localhost:1", "timeout_ms": 0}}}"#)]
    #[case(r#"{"services": {"svc": {"base_url": "http://localhost:1", "health_path": "health"}}}"#)]
    fn invalid_service_entries_are_rejected(#[case] raw: &str) {
        let config: GatewayConfig = serde_json::from_str(raw).expect("well-formed config");
        assert!(matches!(
            config.service_descriptors(),
            Err(ConfigError::InvalidService { .. })
        ));
    }

    #[test]
    fn relative_mcp_path_is_rejected() {
        let config = GatewayConfig {
            mcp_path: "mcp".to_owned(),
            ..GatewayConfig::default()
        };
        assert!(matches!(
            config.service_descriptors(),
            Err(ConfigError::InvalidMcpPath(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = GatewayConfig::load(Utf8Path::new("/nonexistent-dir/gateway.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
