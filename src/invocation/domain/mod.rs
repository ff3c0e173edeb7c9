//! Domain model for turning tool calls into HTTP requests and back.

mod error;
mod mapper;
mod outcome;
mod request;
mod result;
mod translator;
mod value;

pub use error::{ToolError, ToolErrorKind, ValidationError};
pub use mapper::{EXCERPT_CHARS, map_outcome};
pub use outcome::{HttpOutcome, TransportFailure, TransportFailureKind, UpstreamResponse};
pub use request::{HttpRequest, RequestPayload};
pub use result::{InvocationRequest, InvocationResult};
pub use translator::translate;
pub use value::ArgumentValue;
