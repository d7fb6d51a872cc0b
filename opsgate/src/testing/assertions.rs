//! Test assertions for outcomes and gate state.

use crate::gate::ApprovalGate;
use crate::outcome::{ExecutionOutcome, HANDLER_FAILURE};

/// Asserts that the outcome indicates success.
pub fn assert_outcome_succeeded(outcome: &ExecutionOutcome) {
    assert!(
        outcome.success,
        "Expected success, got error: {:?}",
        outcome.error
    );
}

/// Asserts that the outcome failed with the given error kind.
pub fn assert_outcome_failed_with(outcome: &ExecutionOutcome, kind: &str) {
    assert!(!outcome.success, "Expected failure, got result: {:?}", outcome.result);
    assert_eq!(
        outcome.error_kind(),
        Some(kind),
        "Expected error kind {:?}, got {:?}",
        kind,
        outcome.error
    );
}

/// Asserts that the outcome is a handler failure.
pub fn assert_handler_failure(outcome: &ExecutionOutcome) {
    assert_outcome_failed_with(outcome, HANDLER_FAILURE);
}

/// Asserts that the gate is in the named state.
pub fn assert_gate_state(gate: &ApprovalGate, expected: &str) {
    let actual = gate.state_name();
    assert_eq!(
        actual, expected,
        "Expected gate state '{}', got '{}'",
        expected, actual
    );
}

/// Asserts that the gate is idle.
pub fn assert_gate_idle(gate: &ApprovalGate) {
    assert_gate_state(gate, "idle");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ErrorDescriptor;
    use crate::testing::OpsFixture;

    #[test]
    fn test_assert_outcome_succeeded() {
        assert_outcome_succeeded(&ExecutionOutcome::ok(serde_json::json!(1), 0.0));
    }

    #[test]
    #[should_panic(expected = "Expected success")]
    fn test_assert_outcome_succeeded_fails() {
        let outcome = ExecutionOutcome::fail(ErrorDescriptor::handler_failure("boom"), 0.0);
        assert_outcome_succeeded(&outcome);
    }

    #[test]
    fn test_assert_handler_failure() {
        let outcome = ExecutionOutcome::fail(ErrorDescriptor::handler_failure("boom"), 0.0);
        assert_handler_failure(&outcome);
    }

    #[test]
    #[should_panic(expected = "Expected error kind")]
    fn test_assert_outcome_failed_with_wrong_kind() {
        let outcome = ExecutionOutcome::fail(ErrorDescriptor::new("UnknownOperation", "gone"), 0.0);
        assert_handler_failure(&outcome);
    }

    #[test]
    fn test_assert_gate_idle() {
        assert_gate_idle(&OpsFixture::new().gate());
    }

    #[test]
    #[should_panic(expected = "Expected gate state 'pending'")]
    fn test_assert_gate_state_fails() {
        assert_gate_state(&OpsFixture::new().gate(), "pending");
    }
}
