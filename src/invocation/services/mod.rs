//! Application services for tool invocation.

mod invoker;

pub use invoker::ToolInvoker;
