//! The approval gate state machine.

use super::state::{Decision, GateState, ResolutionReport};
use crate::errors::GateError;
use crate::events::{
    EventSink, NoOpEventSink, GATE_ACKNOWLEDGED, GATE_APPROVED, GATE_CANCELLED, GATE_REJECTED,
    GATE_SUBMITTED,
};
use crate::executor::ExecutionAdapter;
use crate::outcome::{ErrorDescriptor, ExecutionOutcome};
use crate::proposal::Proposal;
use crate::toolbelt::ToolbeltRegistry;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Holds at most one proposal and moves it through
/// `Idle -> Pending -> Resolved -> Idle`.
///
/// Every transition is a compare-and-set under a short lock. The handler
/// of an approved proposal runs with the lock released, so readers and
/// competing deciders never wait on it; a second `approve` observes the
/// resolved state and fails.
pub struct ApprovalGate {
    state: Mutex<GateState>,
    executor: ExecutionAdapter,
    event_sink: Arc<dyn EventSink>,
    label: String,
}

impl ApprovalGate {
    /// Creates an idle gate executing against `registry`.
    #[must_use]
    pub fn new(registry: Arc<ToolbeltRegistry>) -> Self {
        Self::with_executor(ExecutionAdapter::new(registry))
    }

    /// Creates an idle gate around an existing adapter.
    #[must_use]
    pub fn with_executor(executor: ExecutionAdapter) -> Self {
        Self {
            state: Mutex::new(GateState::Idle),
            executor,
            event_sink: Arc::new(NoOpEventSink),
            label: String::new(),
        }
    }

    /// Sets the execution timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.executor = self.executor.with_timeout(timeout);
        self
    }

    /// Sets the event sink for gate and execution events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.executor = self.executor.with_event_sink(Arc::clone(&sink));
        self.event_sink = sink;
        self
    }

    /// Sets the label attached to logs and events, usually a session ID.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Returns the gate label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> GateState {
        self.state.lock().clone()
    }

    /// Returns the current state name.
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        self.state.lock().name()
    }

    /// Returns true if no proposal is in flight.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state.lock().is_idle()
    }

    /// Returns the pending proposal, if one awaits a decision.
    #[must_use]
    pub fn pending(&self) -> Option<Proposal> {
        match &*self.state.lock() {
            GateState::Pending { proposal } => Some(proposal.clone()),
            _ => None,
        }
    }

    /// Places a validated proposal in the pending slot.
    ///
    /// Fails with `GateBusy` unless the gate is idle; the current state is
    /// left untouched in that case.
    pub fn submit(&self, proposal: Proposal) -> Result<(), GateError> {
        let data = proposal_event(&self.label, &proposal);
        {
            let mut state = self.state.lock();
            if !state.is_idle() {
                let name = state.name();
                warn!(gate = %self.label, state = name, tool = %proposal.operation(), "Submit refused: gate busy");
                return Err(GateError::busy(name));
            }
            info!(
                gate = %self.label,
                proposal_id = %proposal.id(),
                tool = %proposal.operation(),
                "Proposal pending approval"
            );
            *state = GateState::Pending { proposal };
        }
        self.event_sink.try_emit(GATE_SUBMITTED, Some(data));
        Ok(())
    }

    /// Approves whatever proposal is pending and executes it.
    ///
    /// Returns the execution outcome, which is also attached to the
    /// resolved state. Handler failures are reported in the outcome, not
    /// as an error.
    pub async fn approve(&self) -> Result<ExecutionOutcome, GateError> {
        self.approve_inner(None).await
    }

    /// Approves the pending proposal only if its ID is `id`.
    pub async fn approve_proposal(&self, id: Uuid) -> Result<ExecutionOutcome, GateError> {
        self.approve_inner(Some(id)).await
    }

    async fn approve_inner(&self, expected: Option<Uuid>) -> Result<ExecutionOutcome, GateError> {
        let proposal = {
            let mut state = self.state.lock();
            let proposal = take_pending(&mut state, "approve", expected)?;
            *state = GateState::Resolved {
                proposal: proposal.clone(),
                decision: Decision::Approved,
                outcome: None,
            };
            proposal
        };

        info!(gate = %self.label, proposal_id = %proposal.id(), tool = %proposal.operation(), "Proposal approved");
        self.event_sink
            .try_emit(GATE_APPROVED, Some(proposal_event(&self.label, &proposal)));

        let mut slot = OutcomeSlot {
            state: &self.state,
            proposal_id: proposal.id(),
            filled: false,
        };
        let outcome = self.executor.execute(&proposal).await;
        slot.fill(outcome.clone());

        Ok(outcome)
    }

    /// Rejects whatever proposal is pending. Nothing is executed.
    pub fn reject(&self) -> Result<(), GateError> {
        self.reject_inner(None)
    }

    /// Rejects the pending proposal only if its ID is `id`.
    pub fn reject_proposal(&self, id: Uuid) -> Result<(), GateError> {
        self.reject_inner(Some(id))
    }

    fn reject_inner(&self, expected: Option<Uuid>) -> Result<(), GateError> {
        let data = {
            let mut state = self.state.lock();
            let proposal = take_pending(&mut state, "reject", expected)?;
            info!(gate = %self.label, proposal_id = %proposal.id(), tool = %proposal.operation(), "Proposal rejected");
            let data = proposal_event(&self.label, &proposal);
            *state = GateState::Resolved {
                proposal,
                decision: Decision::Rejected,
                outcome: None,
            };
            data
        };
        self.event_sink.try_emit(GATE_REJECTED, Some(data));
        Ok(())
    }

    /// Withdraws the pending proposal without a decision.
    ///
    /// The gate returns to idle and no report is produced. Returns the
    /// withdrawn proposal.
    pub fn cancel(&self) -> Result<Proposal, GateError> {
        let proposal = {
            let mut state = self.state.lock();
            take_pending(&mut state, "cancel", None)?
        };
        info!(gate = %self.label, proposal_id = %proposal.id(), "Proposal cancelled");
        self.event_sink
            .try_emit(GATE_CANCELLED, Some(proposal_event(&self.label, &proposal)));
        Ok(proposal)
    }

    /// Consumes the resolved proposal and returns the gate to idle.
    ///
    /// The report is produced exactly once. Fails while an approved
    /// proposal is still executing, and from idle or pending.
    pub fn acknowledge(&self) -> Result<ResolutionReport, GateError> {
        let report = {
            let mut state = self.state.lock();
            match std::mem::take(&mut *state) {
                GateState::Resolved {
                    proposal,
                    decision,
                    outcome,
                } if decision == Decision::Rejected || outcome.is_some() => {
                    ResolutionReport::new(&proposal, decision, outcome)
                }
                other => {
                    let name = other.name();
                    *state = other;
                    debug!(gate = %self.label, state = name, "Acknowledge refused");
                    return Err(GateError::invalid_transition("acknowledge", name));
                }
            }
        };

        info!(
            gate = %self.label,
            proposal_id = %report.proposal_id,
            decision = %report.decision,
            "Resolution acknowledged"
        );
        self.event_sink.try_emit(
            GATE_ACKNOWLEDGED,
            Some(serde_json::json!({
                "gate": self.label,
                "proposal_id": report.proposal_id.to_string(),
                "tool": report.tool,
                "decision": report.decision,
            })),
        );
        Ok(report)
    }
}

impl std::fmt::Debug for ApprovalGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalGate")
            .field("label", &self.label)
            .field("state", &self.state_name())
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

/// Moves the pending proposal out of `state`, leaving it idle.
///
/// On failure the state is restored unchanged.
fn take_pending(
    state: &mut GateState,
    action: &'static str,
    expected: Option<Uuid>,
) -> Result<Proposal, GateError> {
    match std::mem::take(state) {
        GateState::Pending { proposal } => match expected {
            Some(requested) if requested != proposal.id() => {
                let current = proposal.id();
                *state = GateState::Pending { proposal };
                Err(GateError::StaleProposal { requested, current })
            }
            _ => Ok(proposal),
        },
        other => {
            let name = other.name();
            *state = other;
            Err(GateError::invalid_transition(action, name))
        }
    }
}

fn proposal_event(label: &str, proposal: &Proposal) -> serde_json::Value {
    serde_json::json!({
        "gate": label,
        "proposal_id": proposal.id().to_string(),
        "tool": proposal.operation(),
    })
}

/// Attaches an outcome to the executing proposal.
///
/// If the approving future is dropped before the handler finishes, the
/// slot records a failure on drop so the gate can still be acknowledged.
struct OutcomeSlot<'a> {
    state: &'a Mutex<GateState>,
    proposal_id: Uuid,
    filled: bool,
}

impl OutcomeSlot<'_> {
    fn fill(&mut self, outcome: ExecutionOutcome) {
        let mut state = self.state.lock();
        if let GateState::Resolved {
            proposal,
            outcome: slot,
            ..
        } = &mut *state
        {
            if proposal.id() == self.proposal_id && slot.is_none() {
                *slot = Some(outcome);
            }
        }
        self.filled = true;
    }
}

impl Drop for OutcomeSlot<'_> {
    fn drop(&mut self) {
        if !self.filled {
            warn!(proposal_id = %self.proposal_id, "Execution abandoned before completion");
            self.fill(ExecutionOutcome::fail(
                ErrorDescriptor::handler_failure("execution abandoned before completion"),
                0.0,
            ));
        }
    }
}
