//! Port contracts for schema discovery.

mod fetcher;

pub use fetcher::{FetchError, FetchResult, SchemaDocument, SchemaFetcher};
