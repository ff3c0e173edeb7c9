//! Compilation of OpenAPI 3 and Swagger 2 documents into operations.
//!
//! [`compile`] detects the document's [`Dialect`] and walks every path and
//! method in a fixed order, so identical documents always yield identical
//! operation lists. Local `$ref` pointers are inlined; remote references are
//! rejected.

mod compiler;
mod dialect;
mod error;
mod openapi3;
mod resolver;
mod swagger2;
mod types;

pub use dialect::Dialect;
pub use error::{CompileError, CompileResult, SchemaInvalidReason};

use crate::tool_registry::domain::{Operation, ServiceName};
use dialect::RawBody;
use resolver::RefResolver;
use serde_json::Value;
use tracing::debug;

/// Compiles a schema document of `service` into its operations.
///
/// # Errors
///
/// Returns [`CompileError::SchemaInvalid`] when the version is unsupported,
/// a reference cannot be resolved, a type is unrecognized, or the operation
/// contracts are inconsistent.
pub fn compile(document: &Value, service: &ServiceName) -> CompileResult<Vec<Operation>> {
    let wrap = |reason| CompileError::SchemaInvalid {
        service: service.clone(),
        reason,
    };
    let dialect = Dialect::detect(document).map_err(wrap)?;
    debug!(service = %service, dialect = dialect.as_str(), "compiling schema");
    compiler::compile_document(document, dialect).map_err(wrap)
}
