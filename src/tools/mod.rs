//! External tool invocation
//!
//! Every stage of the pipeline is an external executable. This module
//! provides the blocking invoker seam and the table of executables.

mod invoker;
mod paths;

pub use invoker::{Invocation, ProcessInvoker, ToolError, ToolInvoker, ToolOutput};
pub use paths::{resolve_program, ToolPaths};
