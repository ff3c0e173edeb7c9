//! Reachability of downstream services.
//!
//! Health is observed in two places: the health probe that precedes every
//! schema fetch, and the explicit probes behind `GET /health`. Both record a
//! [`ServiceHealthSnapshot`], which the health report embeds as its
//! `status`, `checkedAt` and `message` fields.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Reachability class of the last observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceHealthStatus {
    /// Not probed since the gateway started.
    Unknown,
    /// The health endpoint answered with a success status.
    Healthy,
    /// The health endpoint failed, timed out or was unreachable.
    Unhealthy,
}

impl ServiceHealthStatus {
    /// Returns the lower-case label used in health reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
        }
    }
}

impl fmt::Display for ServiceHealthStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Last health observation of one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealthSnapshot {
    status: ServiceHealthStatus,
    checked_at: DateTime<Utc>,
    message: Option<String>,
}

impl ServiceHealthSnapshot {
    /// Health of a service that has not been probed yet.
    #[must_use]
    pub const fn unknown(at: DateTime<Utc>) -> Self {
        Self {
            status: ServiceHealthStatus::Unknown,
            checked_at: at,
            message: None,
        }
    }

    /// A service that answered its probe or served its schema.
    #[must_use]
    pub const fn reachable(at: DateTime<Utc>) -> Self {
        Self {
            status: ServiceHealthStatus::Healthy,
            checked_at: at,
            message: None,
        }
    }

    /// A service that could not be reached; `reason` becomes the message.
    #[must_use]
    pub fn unreachable(at: DateTime<Utc>, reason: impl fmt::Display) -> Self {
        let message = reason.to_string();
        Self {
            status: ServiceHealthStatus::Unhealthy,
            checked_at: at,
            message: (!message.trim().is_empty()).then_some(message),
        }
    }

    /// Records the outcome of a health probe.
    #[must_use]
    pub fn from_probe<E: fmt::Display>(at: DateTime<Utc>, probe: &Result<(), E>) -> Self {
        probe
            .as_ref()
            .map_or_else(|err| Self::unreachable(at, err), |()| Self::reachable(at))
    }

    /// Returns the reachability class.
    #[must_use]
    pub const fn status(&self) -> ServiceHealthStatus {
        self.status
    }

    /// Returns when the observation was made.
    #[must_use]
    pub const fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }

    /// Returns the failure detail of an unreachable service.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}
