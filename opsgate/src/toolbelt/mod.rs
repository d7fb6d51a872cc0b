//! Toolbelt subsystem: the closed set of executable operations.
//!
//! This module provides:
//! - Operation contracts with typed argument declarations
//! - The handler trait operations implement
//! - The registry the validator and execution adapter resolve against
//! - The built-in net-ops operations

mod contract;
mod handler;
#[cfg(feature = "netops")]
pub mod netops;
mod registry;

pub use contract::{ArgKind, ArgSpec, ArgValue, Arguments, OperationContract};
pub use handler::{FnHandler, HandlerFn, OperationHandler};
pub use registry::ToolbeltRegistry;
