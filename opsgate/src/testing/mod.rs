//! Testing utilities for gated operations.
//!
//! This module provides:
//! - Recording, failing, panicking and slow operation handlers
//! - A scripted proposer
//! - A fixture toolbelt and assertions for outcomes and gate state

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_gate_idle, assert_gate_state, assert_handler_failure, assert_outcome_failed_with,
    assert_outcome_succeeded,
};
pub use fixtures::OpsFixture;
pub use mocks::{FailingHandler, PanickingHandler, RecordingHandler, ScriptedProposer, SlowHandler};
