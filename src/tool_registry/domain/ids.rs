//! Validated-name types for downstream services and generated tools.

use super::ToolRegistryDomainError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Maximum length for a service name.
const MAX_SERVICE_NAME_LENGTH: usize = 100;

/// Validated logical name of a downstream service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceName(String);

impl ServiceName {
    /// Creates a validated service name.
    ///
    /// The input is trimmed and lowercased. Only characters in `[a-z0-9_]`
    /// are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError`] when validation fails.
    pub fn new(value: impl Into<String>) -> Result<Self, ToolRegistryDomainError> {
        let normalized = value.into().trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(ToolRegistryDomainError::EmptyServiceName);
        }

        let is_valid = normalized.chars().all(|character| {
            character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_'
        });
        if !is_valid {
            return Err(ToolRegistryDomainError::InvalidServiceName(normalized));
        }

        if normalized.len() > MAX_SERVICE_NAME_LENGTH {
            return Err(ToolRegistryDomainError::ServiceNameTooLong(normalized));
        }

        Ok(Self(normalized))
    }

    /// Returns the service name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Globally unique tool name of the form `{service}_{operationId}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolName(String);

impl ToolName {
    /// Creates a tool name from an already-formed string.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::EmptyToolName`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ToolRegistryDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(ToolRegistryDomainError::EmptyToolName);
        }
        Ok(Self(normalized))
    }

    /// Builds the tool name for an operation of a service.
    ///
    /// Every character outside `[A-Za-z0-9_]` is replaced with `_`.
    #[must_use]
    pub fn for_operation(service: &ServiceName, operation_id: &str) -> Self {
        Self(sanitize_identifier(&format!("{service}_{operation_id}")))
    }

    /// Returns the tool name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ToolName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for ToolName {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Replaces every character outside `[A-Za-z0-9_]` with `_`.
#[must_use]
pub fn sanitize_identifier(raw: &str) -> String {
    raw.chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() || character == '_' {
                character
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("customer", "customer")]
    #[case("  Order_2 ", "order_2")]
    fn service_name_normalizes(#[case] raw: &str, #[case] expected: &str) {
        let name = ServiceName::new(raw).expect("valid service name");
        assert_eq!(name.as_str(), expected);
    }

    #[rstest]
    #[case("", ToolRegistryDomainError::EmptyServiceName)]
    #[case("cust-api", ToolRegistryDomainError::InvalidServiceName("cust-api".to_owned()))]
    fn service_name_rejects_invalid_input(
        #[case] raw: &str,
        #[case] expected: ToolRegistryDomainError,
    ) {
        assert_eq!(ServiceName::new(raw), Err(expected));
    }

    #[test]
    fn service_name_rejects_overlong_input() {
        let raw = "a".repeat(101);
        assert!(matches!(
            ServiceName::new(raw),
            Err(ToolRegistryDomainError::ServiceNameTooLong(_))
        ));
    }

    #[test]
    fn tool_name_is_prefixed_and_sanitized() {
        let service = ServiceName::new("customer").expect("valid service name");
        let name = ToolName::for_operation(&service, "get-customer.v2");
        assert_eq!(name.as_str(), "customer_get_customer_v2");
    }
}
