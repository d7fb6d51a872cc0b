//! Error types for the approval gate.
//!
//! Validation errors are raised before a proposal ever reaches the gate.
//! Gate errors protect the state machine against misuse. Handler failures
//! are never errors at this level: the execution adapter turns them into
//! [`crate::outcome::ExecutionOutcome`] values.

use crate::toolbelt::ArgKind;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for opsgate operations.
#[derive(Debug, Error)]
pub enum OpsGateError {
    /// The toolbelt registry rejected an operation.
    #[error("{0}")]
    Registry(#[from] RegistryError),

    /// A raw proposal failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The gate refused a transition.
    #[error("{0}")]
    Gate(#[from] GateError),

    /// The proposer could not produce a reply.
    #[error("Proposer failed: {0}")]
    Proposer(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OpsGateError {
    /// Returns the stable error kind used in rendered reports.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Registry(e) => e.kind(),
            Self::Validation(e) => e.kind(),
            Self::Gate(e) => e.kind(),
            Self::Proposer(_) => "ProposerError",
            Self::Config(_) => "ConfigError",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        match self {
            Self::Registry(e) => e.to_dict(),
            Self::Validation(e) => e.to_dict(),
            Self::Gate(e) => e.to_dict(),
            Self::Proposer(_) | Self::Config(_) => base_dict(self.kind(), &self.to_string()),
        }
    }
}

/// Errors raised while building or querying the toolbelt registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// An operation with this name was already registered.
    #[error("Duplicate operation: {name}")]
    DuplicateOperation {
        /// The operation name.
        name: String,
    },

    /// No operation with this name exists.
    #[error("Unknown operation: {name}")]
    UnknownOperation {
        /// The operation name.
        name: String,
    },

    /// An optional argument declares a default of the wrong kind.
    #[error("Default for argument '{argument}' of operation '{operation}' is not a valid {expected}")]
    InvalidDefault {
        /// The operation name.
        operation: String,
        /// The argument whose default is wrong.
        argument: String,
        /// The declared kind.
        expected: ArgKind,
    },
}

impl RegistryError {
    /// Creates a duplicate operation error.
    #[must_use]
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateOperation { name: name.into() }
    }

    /// Creates an unknown operation error.
    #[must_use]
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownOperation { name: name.into() }
    }

    /// Creates an invalid default error.
    #[must_use]
    pub fn invalid_default(
        operation: impl Into<String>,
        argument: impl Into<String>,
        expected: ArgKind,
    ) -> Self {
        Self::InvalidDefault {
            operation: operation.into(),
            argument: argument.into(),
            expected,
        }
    }

    /// Returns the stable error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateOperation { .. } => "DuplicateOperation",
            Self::UnknownOperation { .. } => "UnknownOperation",
            Self::InvalidDefault { .. } => "InvalidDefault",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = base_dict(self.kind(), &self.to_string());
        match self {
            Self::DuplicateOperation { name } | Self::UnknownOperation { name } => {
                map.insert("name".to_string(), serde_json::json!(name));
            }
            Self::InvalidDefault {
                operation,
                argument,
                expected,
            } => {
                map.insert("operation".to_string(), serde_json::json!(operation));
                map.insert("argument".to_string(), serde_json::json!(argument));
                map.insert("expected".to_string(), serde_json::json!(expected));
            }
        }
        map
    }
}

/// Errors raised while validating a raw proposal against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The proposed operation is not part of the toolbelt.
    #[error("Unknown operation: {name}")]
    UnknownOperation {
        /// The operation name.
        name: String,
    },

    /// A required argument was not supplied.
    #[error("Missing argument '{argument}' for operation '{operation}'")]
    MissingArgument {
        /// The operation name.
        operation: String,
        /// The missing argument.
        argument: String,
    },

    /// An argument the contract does not declare was supplied.
    #[error("Unexpected argument '{argument}' for operation '{operation}'")]
    UnexpectedArgument {
        /// The operation name.
        operation: String,
        /// The unrecognized argument.
        argument: String,
    },

    /// An argument value does not match its declared kind.
    #[error("Invalid type for argument '{argument}' of operation '{operation}': expected {expected}")]
    InvalidArgumentType {
        /// The operation name.
        operation: String,
        /// The offending argument.
        argument: String,
        /// The declared kind.
        expected: ArgKind,
    },
}

impl ValidationError {
    /// Creates an unknown operation error.
    #[must_use]
    pub fn unknown_operation(name: impl Into<String>) -> Self {
        Self::UnknownOperation { name: name.into() }
    }

    /// Creates a missing argument error.
    #[must_use]
    pub fn missing_argument(operation: impl Into<String>, argument: impl Into<String>) -> Self {
        Self::MissingArgument {
            operation: operation.into(),
            argument: argument.into(),
        }
    }

    /// Creates an unexpected argument error.
    #[must_use]
    pub fn unexpected_argument(operation: impl Into<String>, argument: impl Into<String>) -> Self {
        Self::UnexpectedArgument {
            operation: operation.into(),
            argument: argument.into(),
        }
    }

    /// Creates an invalid argument type error.
    #[must_use]
    pub fn invalid_type(
        operation: impl Into<String>,
        argument: impl Into<String>,
        expected: ArgKind,
    ) -> Self {
        Self::InvalidArgumentType {
            operation: operation.into(),
            argument: argument.into(),
            expected,
        }
    }

    /// Returns the stable error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownOperation { .. } => "UnknownOperation",
            Self::MissingArgument { .. } => "MissingArgument",
            Self::UnexpectedArgument { .. } => "UnexpectedArgument",
            Self::InvalidArgumentType { .. } => "InvalidArgumentType",
        }
    }

    /// Returns the argument the error refers to, if any.
    #[must_use]
    pub fn argument(&self) -> Option<&str> {
        match self {
            Self::UnknownOperation { .. } => None,
            Self::MissingArgument { argument, .. }
            | Self::UnexpectedArgument { argument, .. }
            | Self::InvalidArgumentType { argument, .. } => Some(argument),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = base_dict(self.kind(), &self.to_string());
        match self {
            Self::UnknownOperation { name } => {
                map.insert("operation".to_string(), serde_json::json!(name));
            }
            Self::MissingArgument { operation, argument }
            | Self::UnexpectedArgument { operation, argument } => {
                map.insert("operation".to_string(), serde_json::json!(operation));
                map.insert("argument".to_string(), serde_json::json!(argument));
            }
            Self::InvalidArgumentType {
                operation,
                argument,
                expected,
            } => {
                map.insert("operation".to_string(), serde_json::json!(operation));
                map.insert("argument".to_string(), serde_json::json!(argument));
                map.insert("expected".to_string(), serde_json::json!(expected));
            }
        }
        map
    }
}

impl From<RegistryError> for ValidationError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownOperation { name } | RegistryError::DuplicateOperation { name } => {
                Self::UnknownOperation { name }
            }
            RegistryError::InvalidDefault {
                operation,
                argument,
                expected,
            } => Self::InvalidArgumentType {
                operation,
                argument,
                expected,
            },
        }
    }
}

/// Errors raised by the gate when a transition is not allowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// A proposal is already pending or awaiting acknowledgement.
    #[error("Gate busy: a proposal is {state}")]
    GateBusy {
        /// The current state name.
        state: &'static str,
    },

    /// The requested transition is not valid from the current state.
    #[error("Invalid transition: cannot {action} while {state}")]
    InvalidTransition {
        /// The attempted action.
        action: &'static str,
        /// The current state name.
        state: &'static str,
    },

    /// The decision targets a proposal that is no longer pending.
    #[error("Stale proposal: decision for {requested} but {current} is pending")]
    StaleProposal {
        /// The proposal the caller decided on.
        requested: Uuid,
        /// The proposal actually pending.
        current: Uuid,
    },
}

impl GateError {
    /// Creates a gate busy error.
    #[must_use]
    pub fn busy(state: &'static str) -> Self {
        Self::GateBusy { state }
    }

    /// Creates an invalid transition error.
    #[must_use]
    pub fn invalid_transition(action: &'static str, state: &'static str) -> Self {
        Self::InvalidTransition { action, state }
    }

    /// Returns the stable error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GateBusy { .. } => "GateBusy",
            Self::InvalidTransition { .. } => "InvalidTransition",
            Self::StaleProposal { .. } => "StaleProposal",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = base_dict(self.kind(), &self.to_string());
        match self {
            Self::GateBusy { state } => {
                map.insert("state".to_string(), serde_json::json!(state));
            }
            Self::InvalidTransition { action, state } => {
                map.insert("action".to_string(), serde_json::json!(action));
                map.insert("state".to_string(), serde_json::json!(state));
            }
            Self::StaleProposal { requested, current } => {
                map.insert("requested".to_string(), serde_json::json!(requested.to_string()));
                map.insert("current".to_string(), serde_json::json!(current.to_string()));
            }
        }
        map
    }
}

fn base_dict(kind: &str, message: &str) -> HashMap<String, serde_json::Value> {
    let mut map = HashMap::new();
    map.insert("type".to_string(), serde_json::json!(kind));
    map.insert("message".to_string(), serde_json::json!(message));
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_validation_error_kinds() {
        assert_eq!(ValidationError::unknown_operation("x").kind(), "UnknownOperation");
        assert_eq!(ValidationError::missing_argument("op", "a").kind(), "MissingArgument");
        assert_eq!(ValidationError::unexpected_argument("op", "a").kind(), "UnexpectedArgument");
        assert_eq!(
            ValidationError::invalid_type("op", "a", ArgKind::Boolean).kind(),
            "InvalidArgumentType"
        );
    }

    #[test]
    fn test_missing_argument_message() {
        let err = ValidationError::missing_argument("scale_cluster", "replicas");
        assert_eq!(
            err.to_string(),
            "Missing argument 'replicas' for operation 'scale_cluster'"
        );
        assert_eq!(err.argument(), Some("replicas"));
    }

    #[test]
    fn test_invalid_type_to_dict() {
        let err = ValidationError::invalid_type("restart_service", "force", ArgKind::Boolean);
        let dict = err.to_dict();

        assert_eq!(dict.get("type").unwrap(), "InvalidArgumentType");
        assert_eq!(dict.get("argument").unwrap(), "force");
        assert_eq!(dict.get("expected").unwrap(), "boolean");
    }

    #[test]
    fn test_registry_error_converts_to_validation() {
        let err: ValidationError = RegistryError::unknown("delete_database").into();
        assert_eq!(err, ValidationError::unknown_operation("delete_database"));
    }

    #[test]
    fn test_invalid_default_to_dict() {
        let err = RegistryError::invalid_default("scale_cluster", "replicas", ArgKind::Integer);
        let dict = err.to_dict();

        assert_eq!(err.kind(), "InvalidDefault");
        assert_eq!(dict.get("operation").unwrap(), "scale_cluster");
        assert_eq!(dict.get("expected").unwrap(), "integer");
        assert!(err.to_string().contains("not a valid integer"));
    }

    #[test]
    fn test_gate_error_to_dict() {
        let err = GateError::invalid_transition("approve", "idle");
        let dict = err.to_dict();

        assert_eq!(dict.get("type").unwrap(), "InvalidTransition");
        assert_eq!(dict.get("action").unwrap(), "approve");
        assert!(err.to_string().contains("cannot approve while idle"));
    }

    #[test]
    fn test_umbrella_kind_passthrough() {
        let err: OpsGateError = GateError::busy("pending").into();
        assert_eq!(err.kind(), "GateBusy");

        let err: OpsGateError = ValidationError::unknown_operation("x").into();
        assert_eq!(err.to_dict().get("type").unwrap(), "UnknownOperation");
    }
}
