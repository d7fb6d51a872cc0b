//! Read-only views of a session's gate.

use crate::gate::{Decision, GateState};
use crate::outcome::ExecutionOutcome;
use crate::proposal::Proposal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A proposal as shown to the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalView {
    /// Proposal ID; pass it back to decide on exactly this proposal.
    pub id: Uuid,
    /// Operation name.
    pub tool: String,
    /// Validated arguments.
    pub args: serde_json::Value,
    /// Originating request text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// When the proposal was validated.
    pub created_at: DateTime<Utc>,
}

impl From<&Proposal> for ProposalView {
    fn from(proposal: &Proposal) -> Self {
        Self {
            id: proposal.id(),
            tool: proposal.operation().to_string(),
            args: proposal.arguments().to_json(),
            origin: proposal.origin().map(String::from),
            created_at: proposal.created_at(),
        }
    }
}

/// A serialisable snapshot of a gate, for rendering.
///
/// Building a view never mutates the gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateView {
    /// Owning session.
    pub session_id: String,
    /// State name: `idle`, `pending`, `executing` or `resolved`.
    pub state: String,
    /// The proposal in flight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposal: Option<ProposalView>,
    /// The decision, once made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
    /// The execution outcome, once available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ExecutionOutcome>,
    /// Whether a new request may be submitted.
    pub can_submit: bool,
    /// Whether approve and reject are available.
    pub can_decide: bool,
    /// Whether the resolution can be acknowledged.
    pub can_acknowledge: bool,
}

impl GateView {
    /// Builds a view of `state` for `session_id`.
    #[must_use]
    pub fn new(session_id: impl Into<String>, state: &GateState) -> Self {
        Self {
            session_id: session_id.into(),
            state: state.name().to_string(),
            proposal: state.proposal().map(ProposalView::from),
            decision: state.decision(),
            outcome: state.outcome().cloned(),
            can_submit: state.is_idle(),
            can_decide: state.is_pending(),
            can_acknowledge: state.is_resolved() && !state.is_executing(),
        }
    }
}
