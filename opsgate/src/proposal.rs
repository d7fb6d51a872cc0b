//! Proposal types: raw proposer output and validated proposals.

use crate::toolbelt::Arguments;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An unvalidated operation request as produced by a proposer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProposal {
    /// The proposed operation name.
    #[serde(rename = "tool")]
    pub operation: String,
    /// The raw argument mapping.
    #[serde(rename = "args", default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
    /// The natural-language request this proposal came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl RawProposal {
    /// Creates a raw proposal.
    ///
    /// Non-object argument values are treated as an empty mapping.
    #[must_use]
    pub fn new(operation: impl Into<String>, arguments: serde_json::Value) -> Self {
        let arguments = match arguments {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Self {
            operation: operation.into(),
            arguments,
            origin: None,
        }
    }

    /// Sets the originating request text.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// What a proposer returns for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProposerReply {
    /// A structured operation proposal.
    Action(RawProposal),
    /// A plain textual response; the gate is not involved.
    Chat {
        /// The response text.
        response: String,
    },
}

impl ProposerReply {
    /// Creates an action reply.
    #[must_use]
    pub fn action(operation: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self::Action(RawProposal::new(operation, arguments))
    }

    /// Creates a chat reply.
    #[must_use]
    pub fn chat(response: impl Into<String>) -> Self {
        Self::Chat {
            response: response.into(),
        }
    }

    /// Returns true if this is an action reply.
    #[must_use]
    pub fn is_action(&self) -> bool {
        matches!(self, Self::Action(_))
    }
}

/// A validated, unexecuted operation request.
///
/// Proposals can only be created by the validator and are immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Proposal {
    id: Uuid,
    operation: String,
    arguments: Arguments,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<String>,
    created_at: DateTime<Utc>,
}

impl Proposal {
    pub(crate) fn new(operation: String, arguments: Arguments, origin: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            operation,
            arguments,
            origin,
            created_at: Utc::now(),
        }
    }

    /// Returns the proposal ID.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the operation name.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the validated arguments.
    #[must_use]
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Returns the originating request text, if known.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Returns when the proposal was validated.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
