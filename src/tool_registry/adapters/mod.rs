//! Adapter implementations for the schema fetcher port.

mod http_fetcher;
mod memory;

pub use http_fetcher::ReqwestSchemaFetcher;
pub use memory::InMemorySchemaFetcher;
