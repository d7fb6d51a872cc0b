//! The approval gate.
//!
//! Every proposal passes through an [`ApprovalGate`] before anything runs.
//! The gate holds one proposal at a time, waits for an explicit human
//! decision, executes approved proposals exactly once and keeps the result
//! until it is acknowledged.

mod machine;
mod state;

pub use machine::ApprovalGate;
pub use state::{Decision, GateState, ResolutionReport};
