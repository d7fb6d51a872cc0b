//! Event emission for gate observability.
//!
//! The gate reports every transition and execution through an
//! [`EventSink`]. Sinks are injected per gate rather than installed
//! globally, so independent sessions never share an event stream by
//! accident.

mod sink;

pub use sink::{CollectingEventSink, EventSink, NoOpEventSink, RecordedEvent};

/// A proposal entered the pending slot.
pub const GATE_SUBMITTED: &str = "gate.submitted";
/// The operator approved the pending proposal.
pub const GATE_APPROVED: &str = "gate.approved";
/// The operator rejected the pending proposal.
pub const GATE_REJECTED: &str = "gate.rejected";
/// The pending proposal was withdrawn without a decision.
pub const GATE_CANCELLED: &str = "gate.cancelled";
/// A resolved proposal was consumed and the gate returned to idle.
pub const GATE_ACKNOWLEDGED: &str = "gate.acknowledged";
/// A handler is about to run.
pub const EXECUTION_STARTED: &str = "execution.started";
/// A handler returned successfully.
pub const EXECUTION_COMPLETED: &str = "execution.completed";
/// A handler failed, panicked or timed out.
pub const EXECUTION_FAILED: &str = "execution.failed";
