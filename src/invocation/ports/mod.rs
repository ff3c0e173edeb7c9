//! Port contracts for outbound calls.

mod upstream;

pub use upstream::UpstreamClient;
