//! Invocation of tools against downstream REST services.
//!
//! A call is validated and translated into an [`domain::HttpRequest`], sent
//! through an [`ports::UpstreamClient`], and the outcome is mapped onto an
//! [`domain::InvocationResult`]. Argument problems never reach the network.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
