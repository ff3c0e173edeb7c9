//! What came back from a downstream call.

use std::fmt;

/// Result of one outbound HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpOutcome {
    /// A response status line was received.
    Completed(UpstreamResponse),
    /// No response was received.
    Failed(TransportFailure),
}

/// A downstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body bytes, possibly cut short.
    pub body: Vec<u8>,
    /// Whether the body could not be read completely.
    pub truncated: bool,
}

impl UpstreamResponse {
    /// Creates a complete response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            truncated: false,
        }
    }

    /// Marks the body as truncated.
    #[must_use]
    pub const fn with_truncated_body(mut self) -> Self {
        self.truncated = true;
        self
    }
}

/// Category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailureKind {
    /// Connection refused or DNS failure.
    Connect,
    /// The service timeout elapsed.
    Timeout,
    /// Any other failure before a response arrived.
    Other,
}

/// Failure to obtain a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    /// Failure category.
    pub kind: TransportFailureKind,
    /// Diagnostic message.
    pub message: String,
}

impl TransportFailure {
    /// Creates a transport failure.
    #[must_use]
    pub fn new(kind: TransportFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            TransportFailureKind::Connect => "connection failed",
            TransportFailureKind::Timeout => "request timed out",
            TransportFailureKind::Other => "request failed",
        };
        write!(formatter, "{label}: {}", self.message)
    }
}
