//! Gate state and resolution report types.

use crate::outcome::ExecutionOutcome;
use crate::proposal::Proposal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The operator's decision on a pending proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The proposal was approved and executed.
    Approved,
    /// The proposal was rejected; nothing ran.
    Rejected,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// The single authoritative state of a gate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateState {
    /// No proposal in flight.
    #[default]
    Idle,
    /// A proposal awaits a human decision.
    Pending {
        /// The pending proposal.
        proposal: Proposal,
    },
    /// A decision was made; awaiting acknowledgement.
    ///
    /// An approved proposal whose outcome is still `None` is executing.
    Resolved {
        /// The decided proposal.
        proposal: Proposal,
        /// The decision.
        decision: Decision,
        /// The execution outcome, once available.
        #[serde(skip_serializing_if = "Option::is_none")]
        outcome: Option<ExecutionOutcome>,
    },
}

impl GateState {
    /// Returns the state name used in errors and views.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending { .. } => "pending",
            Self::Resolved { .. } if self.is_executing() => "executing",
            Self::Resolved { .. } => "resolved",
        }
    }

    /// Returns true if no proposal is in flight.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true if a proposal awaits a decision.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// Returns true if a decision has been made.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    /// Returns true while an approved proposal is running.
    #[must_use]
    pub fn is_executing(&self) -> bool {
        matches!(
            self,
            Self::Resolved {
                decision: Decision::Approved,
                outcome: None,
                ..
            }
        )
    }

    /// Returns the proposal in flight, if any.
    #[must_use]
    pub fn proposal(&self) -> Option<&Proposal> {
        match self {
            Self::Idle => None,
            Self::Pending { proposal } | Self::Resolved { proposal, .. } => Some(proposal),
        }
    }

    /// Returns the decision, if one was made.
    #[must_use]
    pub fn decision(&self) -> Option<Decision> {
        match self {
            Self::Resolved { decision, .. } => Some(*decision),
            _ => None,
        }
    }

    /// Returns the execution outcome, if one was produced.
    #[must_use]
    pub fn outcome(&self) -> Option<&ExecutionOutcome> {
        match self {
            Self::Resolved { outcome, .. } => outcome.as_ref(),
            _ => None,
        }
    }
}

/// What the session boundary surfaces once a proposal is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// The resolved proposal's ID.
    pub proposal_id: Uuid,
    /// The operation name.
    pub tool: String,
    /// The arguments the operation was proposed with.
    pub args: serde_json::Value,
    /// The operator's decision.
    pub decision: Decision,
    /// The execution outcome; absent for rejections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ExecutionOutcome>,
    /// The originating request text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl ResolutionReport {
    pub(crate) fn new(
        proposal: &Proposal,
        decision: Decision,
        outcome: Option<ExecutionOutcome>,
    ) -> Self {
        Self {
            proposal_id: proposal.id(),
            tool: proposal.operation().to_string(),
            args: proposal.arguments().to_json(),
            decision,
            outcome,
            origin: proposal.origin().map(String::from),
        }
    }

    /// Returns true if the operation was approved and succeeded.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.outcome.as_ref().is_some_and(|o| o.success)
    }

    /// A one-line operator-facing summary.
    #[must_use]
    pub fn summary(&self) -> String {
        match (self.decision, &self.outcome) {
            (Decision::Rejected, _) => {
                format!("Action `{}` was rejected by the operator.", self.tool)
            }
            (Decision::Approved, Some(outcome)) if outcome.success => {
                format!("Executed `{}`.", self.tool)
            }
            (Decision::Approved, Some(outcome)) => format!(
                "Execution of `{}` failed: {}",
                self.tool,
                outcome.error.as_ref().map_or("unknown error", |e| e.message.as_str())
            ),
            (Decision::Approved, None) => format!("Executing `{}`.", self.tool),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ErrorDescriptor;
    use crate::toolbelt::Arguments;
    use pretty_assertions::assert_eq;

    fn proposal() -> Proposal {
        Proposal::new(
            "restart_service".to_string(),
            Arguments::new().with("service_name", "billing-api").with("force", true),
            None,
        )
    }

    #[test]
    fn test_state_names() {
        let p = proposal();
        assert_eq!(GateState::Idle.name(), "idle");
        assert_eq!(GateState::Pending { proposal: p.clone() }.name(), "pending");

        let executing = GateState::Resolved {
            proposal: p.clone(),
            decision: Decision::Approved,
            outcome: None,
        };
        assert_eq!(executing.name(), "executing");
        assert!(executing.is_executing());

        let rejected = GateState::Resolved {
            proposal: p,
            decision: Decision::Rejected,
            outcome: None,
        };
        assert_eq!(rejected.name(), "resolved");
        assert!(!rejected.is_executing());
    }

    #[test]
    fn test_state_serialize_tagged() {
        let json = serde_json::to_value(GateState::Pending { proposal: proposal() }).unwrap();
        assert_eq!(json["state"], "pending");
        assert_eq!(json["proposal"]["operation"], "restart_service");

        let json = serde_json::to_value(GateState::Idle).unwrap();
        assert_eq!(json, serde_json::json!({"state": "idle"}));
    }

    #[test]
    fn test_report_shape() {
        let report = ResolutionReport::new(
            &proposal(),
            Decision::Approved,
            Some(ExecutionOutcome::ok(serde_json::json!({"status": "Success"}), 1.0)),
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["tool"], "restart_service");
        assert_eq!(json["decision"], "approved");
        assert_eq!(json["args"]["service_name"], "billing-api");
        assert_eq!(json["outcome"]["success"], true);
        assert!(report.succeeded());
        assert_eq!(report.summary(), "Executed `restart_service`.");
    }

    #[test]
    fn test_report_summaries() {
        let rejected = ResolutionReport::new(&proposal(), Decision::Rejected, None);
        assert_eq!(
            rejected.summary(),
            "Action `restart_service` was rejected by the operator."
        );
        assert!(!rejected.succeeded());

        let failed = ResolutionReport::new(
            &proposal(),
            Decision::Approved,
            Some(ExecutionOutcome::fail(ErrorDescriptor::handler_failure("timeout"), 0.0)),
        );
        assert_eq!(failed.summary(), "Execution of `restart_service` failed: timeout");
    }
}
