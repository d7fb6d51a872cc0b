//! A single operator session.

use super::view::GateView;
use crate::config::GateConfig;
use crate::errors::{GateError, OpsGateError};
use crate::events::EventSink;
use crate::gate::{ApprovalGate, GateState, ResolutionReport};
use crate::outcome::ExecutionOutcome;
use crate::proposal::{Proposal, ProposerReply, RawProposal};
use crate::proposer::Proposer;
use crate::toolbelt::ToolbeltRegistry;
use crate::validator::{ProposalValidator, RawArguments};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

/// What a natural-language request turned into.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestOutcome {
    /// The proposer answered in text; the gate was not involved.
    Chat {
        /// The response text.
        response: String,
    },
    /// A validated proposal now awaits approval.
    Proposed {
        /// The pending proposal.
        proposal: Proposal,
    },
}

/// One operator's gate plus the validator that feeds it.
///
/// The view is a pure read. Only the explicit mutators change the gate,
/// so re-rendering a session any number of times never executes anything.
pub struct Session {
    id: String,
    gate: ApprovalGate,
    validator: ProposalValidator,
    created_at: DateTime<Utc>,
    last_activity: Mutex<Instant>,
}

impl Session {
    /// Creates a session with default settings.
    #[must_use]
    pub fn new(id: impl Into<String>, registry: Arc<ToolbeltRegistry>) -> Self {
        Self::from_config(id, registry, &GateConfig::default())
    }

    /// Creates a session using `config` for the execution timeout.
    #[must_use]
    pub fn from_config(
        id: impl Into<String>,
        registry: Arc<ToolbeltRegistry>,
        config: &GateConfig,
    ) -> Self {
        let id = id.into();
        let gate = ApprovalGate::new(Arc::clone(&registry))
            .with_timeout(config.execution_timeout())
            .with_label(id.clone());

        Self {
            id,
            gate,
            validator: ProposalValidator::new(registry),
            created_at: Utc::now(),
            last_activity: Mutex::new(Instant::now()),
        }
    }

    /// Sets the event sink for the session's gate.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.gate = self.gate.with_event_sink(sink);
        self
    }

    /// Returns the session ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns when the session was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns how long the session has gone without being viewed or changed.
    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    /// Returns the underlying gate.
    #[must_use]
    pub fn gate(&self) -> &ApprovalGate {
        &self.gate
    }

    /// Returns the validator.
    #[must_use]
    pub fn validator(&self) -> &ProposalValidator {
        &self.validator
    }

    /// Returns a snapshot of the gate state.
    #[must_use]
    pub fn state(&self) -> GateState {
        self.gate.state()
    }

    /// Returns a renderable view of the gate.
    ///
    /// Rendering counts as activity, so a session someone is looking at is
    /// not reaped.
    #[must_use]
    pub fn view(&self) -> GateView {
        self.touch();
        GateView::new(self.id.clone(), &self.gate.state())
    }

    /// Validates an operation request and places it in the gate.
    ///
    /// Validation runs first; an invalid request never touches the gate.
    /// Returns a copy of the pending proposal.
    pub fn submit(
        &self,
        name: &str,
        args: &RawArguments,
        origin: Option<&str>,
    ) -> Result<Proposal, OpsGateError> {
        self.touch();
        let proposal = self.validator.validate(name, args, origin).map_err(|e| {
            warn!(session_id = %self.id, tool = %name, error = %e, "Proposal rejected by validation");
            e
        })?;
        self.gate.submit(proposal.clone())?;
        Ok(proposal)
    }

    /// Validates and submits a raw proposal.
    pub fn submit_raw(&self, raw: &RawProposal) -> Result<Proposal, OpsGateError> {
        self.submit(&raw.operation, &raw.arguments, raw.origin.as_deref())
    }

    /// Turns free-form text into a pending proposal or a chat response.
    ///
    /// While a proposal is unresolved the request is refused with
    /// `GateBusy` and the proposer is not called.
    pub async fn handle_request(
        &self,
        text: &str,
        proposer: &dyn Proposer,
    ) -> Result<RequestOutcome, OpsGateError> {
        self.touch();
        let name = self.gate.state_name();
        if name != "idle" {
            return Err(GateError::busy(name).into());
        }

        let reply = proposer.propose(text).await.map_err(|e| {
            warn!(session_id = %self.id, error = %e, "Proposer failed");
            OpsGateError::Proposer(format!("{e:#}"))
        })?;

        match reply {
            ProposerReply::Chat { response } => {
                info!(session_id = %self.id, "Proposer answered in chat");
                Ok(RequestOutcome::Chat { response })
            }
            ProposerReply::Action(mut raw) => {
                if raw.origin.is_none() {
                    raw.origin = Some(text.to_string());
                }
                let proposal = self.submit_raw(&raw)?;
                Ok(RequestOutcome::Proposed { proposal })
            }
        }
    }

    /// Approves and executes the pending proposal.
    pub async fn approve(&self) -> Result<ExecutionOutcome, GateError> {
        self.touch();
        self.gate.approve().await
    }

    /// Approves the pending proposal if its ID is `id`.
    pub async fn approve_proposal(&self, id: Uuid) -> Result<ExecutionOutcome, GateError> {
        self.touch();
        self.gate.approve_proposal(id).await
    }

    /// Rejects the pending proposal.
    pub fn reject(&self) -> Result<(), GateError> {
        self.touch();
        self.gate.reject()
    }

    /// Rejects the pending proposal if its ID is `id`.
    pub fn reject_proposal(&self, id: Uuid) -> Result<(), GateError> {
        self.touch();
        self.gate.reject_proposal(id)
    }

    /// Withdraws the pending proposal.
    pub fn cancel(&self) -> Result<Proposal, GateError> {
        self.touch();
        self.gate.cancel()
    }

    /// Consumes the resolution and returns the gate to idle.
    pub fn acknowledge(&self) -> Result<ResolutionReport, GateError> {
        self.touch();
        self.gate.acknowledge()
    }

    /// Clears the gate: cancels a pending proposal or acknowledges a
    /// resolved one.
    ///
    /// Returns the report if a resolution was consumed. Fails while an
    /// approved proposal is still executing.
    pub fn reset(&self) -> Result<Option<ResolutionReport>, GateError> {
        self.touch();
        match self.gate.state() {
            GateState::Idle => Ok(None),
            GateState::Pending { .. } => self.gate.cancel().map(|_| None),
            GateState::Resolved { .. } => self.gate.acknowledge().map(Some),
        }
    }

    fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("gate", &self.gate)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
