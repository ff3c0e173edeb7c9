//! Concrete outbound HTTP request built from a tool call.

use crate::tool_registry::domain::HttpMethod;
use serde_json::Value;
use url::Url;

/// A fully materialized downstream request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Absolute URL including the encoded path and query.
    pub url: Url,
    /// Header parameters in declared order.
    pub headers: Vec<(String, String)>,
    /// JSON payload, with its media type.
    pub body: Option<RequestPayload>,
}

/// JSON request payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPayload {
    /// Declared media type, usually `application/json`.
    pub content_type: String,
    /// Body value.
    pub value: Value,
}
