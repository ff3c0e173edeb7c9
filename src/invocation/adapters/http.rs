//! Upstream client over HTTP using `reqwest`.

use crate::invocation::{
    domain::{HttpOutcome, HttpRequest, TransportFailure, TransportFailureKind, UpstreamResponse},
    ports::UpstreamClient,
};
use crate::tool_registry::domain::{HttpMethod, ServiceDescriptor};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

/// Default cap on downstream response bodies.
pub const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Sends tool calls to downstream services with a shared `reqwest` client.
///
/// The client should be built without redirect following so that 3xx
/// answers surface as malformed responses instead of silently changing the
/// target.
#[derive(Debug, Clone)]
pub struct ReqwestUpstreamClient {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl ReqwestUpstreamClient {
    /// Creates a client with the default body cap.
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Overrides the body cap; longer bodies are reported as truncated.
    #[must_use]
    pub const fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    async fn read_body(&self, mut response: reqwest::Response) -> (Vec<u8>, bool) {
        let mut body = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let remaining = self.max_body_bytes.saturating_sub(body.len());
                    if chunk.len() > remaining {
                        body.extend(chunk.iter().take(remaining));
                        return (body, true);
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => return (body, false),
                Err(_) => return (body, true),
            }
        }
    }
}

#[async_trait]
impl UpstreamClient for ReqwestUpstreamClient {
    async fn send(&self, service: &ServiceDescriptor, request: &HttpRequest) -> HttpOutcome {
        let mut builder = self
            .client
            .request(reqwest_method(request.method), request.url.clone())
            .timeout(service.timeout());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(payload) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, payload.content_type.as_str())
                .json(&payload.value);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => return HttpOutcome::Failed(transport_failure(&err)),
        };
        let status = response.status().as_u16();
        let (body, truncated) = self.read_body(response).await;

        HttpOutcome::Completed(UpstreamResponse {
            status,
            body,
            truncated,
        })
    }
}

fn transport_failure(err: &reqwest::Error) -> TransportFailure {
    let kind = if err.is_timeout() {
        TransportFailureKind::Timeout
    } else if err.is_connect() {
        TransportFailureKind::Connect
    } else {
        TransportFailureKind::Other
    };
    TransportFailure::new(kind, err.to_string())
}

const fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Options => reqwest::Method::OPTIONS,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Trace => reqwest::Method::TRACE,
    }
}
