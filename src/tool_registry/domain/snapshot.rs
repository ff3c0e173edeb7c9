//! Versioned, copy-on-write view of every service's discovered tools.

use super::{ServiceDescriptor, ServiceHealthSnapshot, ServiceName, Tool, ToolName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Hex-encoded SHA-256 digest of a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaFingerprint(String);

impl SchemaFingerprint {
    /// Wraps an already computed hex digest.
    #[must_use]
    pub fn new(hex_digest: impl Into<String>) -> Self {
        Self(hex_digest.into())
    }

    /// Returns the digest as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaFingerprint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A tool name is already published by another service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tool name {tool} is already owned by service {owner}")]
pub struct ToolNameConflict {
    /// Conflicting tool name.
    pub tool: ToolName,
    /// Service that currently owns the name.
    pub owner: ServiceName,
}

/// The discovered state of one service.
#[derive(Debug, Clone)]
pub struct ServiceSlice {
    service: Arc<ServiceDescriptor>,
    tools: Vec<Arc<Tool>>,
    health: ServiceHealthSnapshot,
    fingerprint: Option<SchemaFingerprint>,
    discovered_at: Option<DateTime<Utc>>,
}

impl ServiceSlice {
    fn undiscovered(service: Arc<ServiceDescriptor>, checked_at: DateTime<Utc>) -> Self {
        Self {
            service,
            tools: Vec::new(),
            health: ServiceHealthSnapshot::unknown(checked_at),
            fingerprint: None,
            discovered_at: None,
        }
    }

    /// Returns the service descriptor.
    #[must_use]
    pub fn service(&self) -> &Arc<ServiceDescriptor> {
        &self.service
    }

    /// Returns the tools in operation order.
    #[must_use]
    pub fn tools(&self) -> &[Arc<Tool>] {
        &self.tools
    }

    /// Returns the last recorded health snapshot.
    #[must_use]
    pub const fn health(&self) -> &ServiceHealthSnapshot {
        &self.health
    }

    /// Returns the fingerprint of the schema the tools were compiled from.
    #[must_use]
    pub const fn fingerprint(&self) -> Option<&SchemaFingerprint> {
        self.fingerprint.as_ref()
    }

    /// Returns when the tools were last discovered.
    #[must_use]
    pub const fn discovered_at(&self) -> Option<DateTime<Utc>> {
        self.discovered_at
    }
}

/// Freshly discovered tools for one service.
#[derive(Debug, Clone)]
pub struct DiscoveredTools {
    /// Compiled tools in operation order.
    pub tools: Vec<Arc<Tool>>,
    /// Fingerprint of the source schema.
    pub fingerprint: SchemaFingerprint,
    /// Discovery timestamp; also recorded as the healthy check time.
    pub discovered_at: DateTime<Utc>,
}

/// Immutable registry state published by pointer replacement.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    version: u64,
    slices: Vec<ServiceSlice>,
    index: HashMap<ToolName, (usize, usize)>,
}

impl RegistrySnapshot {
    /// Creates the initial snapshot with one empty slice per service.
    #[must_use]
    pub fn new(services: &[Arc<ServiceDescriptor>], checked_at: DateTime<Utc>) -> Self {
        Self {
            version: 0,
            slices: services
                .iter()
                .map(|service| ServiceSlice::undiscovered(Arc::clone(service), checked_at))
                .collect(),
            index: HashMap::new(),
        }
    }

    /// Returns the snapshot version; every published change increments it.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns every slice in registration order.
    #[must_use]
    pub fn slices(&self) -> &[ServiceSlice] {
        &self.slices
    }

    /// Finds the slice position of a service.
    #[must_use]
    pub fn position(&self, service: &str) -> Option<usize> {
        self.slices
            .iter()
            .position(|slice| slice.service.name().as_str() == service)
    }

    /// Finds the slice of a service.
    #[must_use]
    pub fn slice(&self, service: &str) -> Option<&ServiceSlice> {
        self.position(service)
            .and_then(|position| self.slices.get(position))
    }

    /// Iterates every tool by registration order, then operation order.
    pub fn tools(&self) -> impl Iterator<Item = &Arc<Tool>> {
        self.slices.iter().flat_map(|slice| slice.tools.iter())
    }

    /// Returns the number of published tools.
    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.index.len()
    }

    /// Looks up a tool by its published name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&Arc<Tool>> {
        let (slice, tool) = self.index.get(name)?;
        self.slices.get(*slice)?.tools.get(*tool)
    }

    /// Returns a new snapshot with the tools of one slice replaced and the
    /// slice marked healthy.
    ///
    /// Returns `None` when `position` is out of range.
    ///
    /// # Errors
    ///
    /// Returns [`ToolNameConflict`] when a tool name is owned by another
    /// service. The current snapshot is never modified.
    pub fn with_discovered(
        &self,
        position: usize,
        discovered: DiscoveredTools,
    ) -> Result<Option<Self>, ToolNameConflict> {
        for tool in &discovered.tools {
            let owner = self
                .index
                .get(tool.name())
                .filter(|(slice, _)| *slice != position)
                .and_then(|(slice, _)| self.slices.get(*slice));
            if let Some(owner_slice) = owner {
                return Err(ToolNameConflict {
                    tool: tool.name().clone(),
                    owner: owner_slice.service.name().clone(),
                });
            }
        }

        let mut next = self.clone();
        let Some(slice) = next.slices.get_mut(position) else {
            return Ok(None);
        };
        slice.tools = discovered.tools;
        slice.health = ServiceHealthSnapshot::reachable(discovered.discovered_at);
        slice.fingerprint = Some(discovered.fingerprint);
        slice.discovered_at = Some(discovered.discovered_at);
        next.rebuild_index();
        next.version = self.version.saturating_add(1);
        Ok(Some(next))
    }

    /// Returns a new snapshot with only the health of one slice replaced.
    ///
    /// Returns `None` when `position` is out of range.
    #[must_use]
    pub fn with_health(&self, position: usize, health: ServiceHealthSnapshot) -> Option<Self> {
        let mut next = self.clone();
        next.slices.get_mut(position)?.health = health;
        next.version = self.version.saturating_add(1);
        Some(next)
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .slices
            .iter()
            .enumerate()
            .flat_map(|(slice_position, slice)| {
                slice
                    .tools
                    .iter()
                    .enumerate()
                    .map(move |(tool_position, tool)| {
                        (tool.name().clone(), (slice_position, tool_position))
                    })
            })
            .collect();
    }
}
