//! Adapter implementations for the upstream client port.

mod http;
mod scripted;

pub use http::{DEFAULT_MAX_BODY_BYTES, ReqwestUpstreamClient};
pub use scripted::ScriptedUpstreamClient;
