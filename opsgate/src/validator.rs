//! Proposal validation against the toolbelt registry.

use crate::errors::ValidationError;
use crate::proposal::{Proposal, RawProposal};
use crate::toolbelt::{Arguments, OperationContract, ToolbeltRegistry};
use std::sync::Arc;
use tracing::debug;

/// Raw argument mapping as produced by a proposer.
pub type RawArguments = serde_json::Map<String, serde_json::Value>;

/// Validates raw proposals before they may enter the gate.
#[derive(Debug, Clone)]
pub struct ProposalValidator {
    registry: Arc<ToolbeltRegistry>,
}

impl ProposalValidator {
    /// Creates a validator over a registry.
    #[must_use]
    pub fn new(registry: Arc<ToolbeltRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolbeltRegistry> {
        &self.registry
    }

    /// Validates an operation name and raw arguments into a proposal.
    ///
    /// Checks run in a fixed order: the operation must exist, every
    /// required argument must be present, no undeclared argument may be
    /// present, and every value must match its declared kind. Omitted
    /// optional arguments are filled with their defaults so the proposal
    /// shows exactly what the handler will receive.
    pub fn validate(
        &self,
        raw_name: &str,
        raw_args: &RawArguments,
        origin: Option<&str>,
    ) -> Result<Proposal, ValidationError> {
        let contract = self.registry.lookup(raw_name)?;
        let arguments = check_arguments(contract, raw_args)?;

        debug!(operation = %raw_name, args = arguments.len(), "Proposal validated");
        Ok(Proposal::new(
            contract.name().to_string(),
            arguments,
            origin.map(String::from),
        ))
    }

    /// Validates a raw proposal.
    pub fn validate_raw(&self, raw: &RawProposal) -> Result<Proposal, ValidationError> {
        self.validate(&raw.operation, &raw.arguments, raw.origin.as_deref())
    }
}

/// Checks raw arguments against a contract, producing typed arguments.
pub(crate) fn check_arguments(
    contract: &OperationContract,
    raw_args: &RawArguments,
) -> Result<Arguments, ValidationError> {
    let operation = contract.name();
    let supplied = |name: &str| raw_args.get(name).filter(|v| !v.is_null());

    for spec in contract.args() {
        if spec.required && supplied(&spec.name).is_none() {
            return Err(ValidationError::missing_argument(operation, &spec.name));
        }
    }

    if let Some(extra) = raw_args.keys().find(|k| contract.arg(k).is_none()) {
        return Err(ValidationError::unexpected_argument(operation, extra));
    }

    let mut arguments = Arguments::new();
    for spec in contract.args() {
        match supplied(&spec.name) {
            Some(value) => {
                let typed = spec
                    .kind
                    .coerce(value)
                    .ok_or_else(|| ValidationError::invalid_type(operation, &spec.name, spec.kind))?;
                arguments.insert(spec.name.clone(), typed);
            }
            None => {
                if let Some(ref default) = spec.default {
                    arguments.insert(spec.name.clone(), default.clone());
                }
            }
        }
    }

    Ok(arguments)
}

/// Re-checks an already validated proposal against the current registry.
pub(crate) fn revalidate<'r>(
    registry: &'r ToolbeltRegistry,
    proposal: &Proposal,
) -> Result<(&'r OperationContract, Arguments), ValidationError> {
    let contract = registry.lookup(proposal.operation())?;
    let raw = match proposal.arguments().to_json() {
        serde_json::Value::Object(map) => map,
        _ => RawArguments::new(),
    };
    let arguments = check_arguments(contract, &raw)?;
    Ok((contract, arguments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolbelt::{ArgKind, ArgSpec, ArgValue, FnHandler};
    use pretty_assertions::assert_eq;

    fn registry() -> Arc<ToolbeltRegistry> {
        let handler = || Arc::new(FnHandler::new(|_| Ok(serde_json::json!({}))));
        let registry = ToolbeltRegistry::from_manifest(vec![
            OperationContract::new("restart_service", handler())
                .with_arg(ArgSpec::required("service_name", ArgKind::String))
                .with_arg(ArgSpec::required("force", ArgKind::Boolean)),
            OperationContract::new("scale_cluster", handler())
                .with_arg(ArgSpec::required("service_name", ArgKind::String))
                .with_arg(ArgSpec::required("replicas", ArgKind::Integer)),
            OperationContract::new("drain_node", handler())
                .with_arg(ArgSpec::required("node", ArgKind::String))
                .with_arg(ArgSpec::optional("grace_seconds", ArgKind::Number, 30.0)),
        ])
        .unwrap();
        Arc::new(registry)
    }

    fn args(value: serde_json::Value) -> RawArguments {
        match value {
            serde_json::Value::Object(map) => map,
            _ => RawArguments::new(),
        }
    }

    #[test]
    fn test_validate_success() {
        let validator = ProposalValidator::new(registry());
        let proposal = validator
            .validate(
                "restart_service",
                &args(serde_json::json!({"service_name": "billing-api", "force": true})),
                Some("restart billing hard"),
            )
            .unwrap();

        assert_eq!(proposal.operation(), "restart_service");
        assert_eq!(proposal.arguments().get("force"), Some(&ArgValue::Boolean(true)));
        assert_eq!(proposal.origin(), Some("restart billing hard"));
    }

    #[test]
    fn test_validate_unknown_operation() {
        let validator = ProposalValidator::new(registry());
        let err = validator
            .validate("delete_database", &RawArguments::new(), None)
            .unwrap_err();

        assert_eq!(err, ValidationError::unknown_operation("delete_database"));
    }

    #[test]
    fn test_validate_missing_argument() {
        let validator = ProposalValidator::new(registry());
        let err = validator
            .validate("scale_cluster", &args(serde_json::json!({"service_name": "x"})), None)
            .unwrap_err();

        assert_eq!(err, ValidationError::missing_argument("scale_cluster", "replicas"));
    }

    #[test]
    fn test_validate_null_counts_as_missing() {
        let validator = ProposalValidator::new(registry());
        let err = validator
            .validate(
                "scale_cluster",
                &args(serde_json::json!({"service_name": "x", "replicas": null})),
                None,
            )
            .unwrap_err();

        assert_eq!(err.kind(), "MissingArgument");
    }

    #[test]
    fn test_validate_unexpected_argument() {
        let validator = ProposalValidator::new(registry());
        let err = validator
            .validate(
                "restart_service",
                &args(serde_json::json!({"service_name": "a", "force": false, "region": "eu"})),
                None,
            )
            .unwrap_err();

        assert_eq!(err, ValidationError::unexpected_argument("restart_service", "region"));
    }

    #[test]
    fn test_missing_checked_before_unexpected() {
        let validator = ProposalValidator::new(registry());
        let err = validator
            .validate(
                "restart_service",
                &args(serde_json::json!({"service_name": "a", "region": "eu"})),
                None,
            )
            .unwrap_err();

        assert_eq!(err.kind(), "MissingArgument");
    }

    #[test]
    fn test_validate_invalid_type() {
        let validator = ProposalValidator::new(registry());
        let err = validator
            .validate(
                "restart_service",
                &args(serde_json::json!({"service_name": "a", "force": "yes"})),
                None,
            )
            .unwrap_err();

        assert_eq!(
            err,
            ValidationError::invalid_type("restart_service", "force", ArgKind::Boolean)
        );
    }

    #[test]
    fn test_validate_integer_from_float() {
        let validator = ProposalValidator::new(registry());
        let proposal = validator
            .validate(
                "scale_cluster",
                &args(serde_json::json!({"service_name": "east-1", "replicas": 10.0})),
                None,
            )
            .unwrap();

        assert_eq!(proposal.arguments().get("replicas"), Some(&ArgValue::Integer(10)));
    }

    #[test]
    fn test_validate_fills_defaults() {
        let validator = ProposalValidator::new(registry());
        let proposal = validator
            .validate("drain_node", &args(serde_json::json!({"node": "n1"})), None)
            .unwrap();

        assert_eq!(proposal.arguments().get("grace_seconds"), Some(&ArgValue::Number(30.0)));
    }

    #[test]
    fn test_validate_raw() {
        let validator = ProposalValidator::new(registry());
        let raw = RawProposal::new("drain_node", serde_json::json!({"node": "n2"}))
            .with_origin("drain n2");

        let proposal = validator.validate_raw(&raw).unwrap();
        assert_eq!(proposal.origin(), Some("drain n2"));
    }

    #[test]
    fn test_revalidate_round_trip() {
        let registry = registry();
        let validator = ProposalValidator::new(registry.clone());
        let proposal = validator
            .validate(
                "scale_cluster",
                &args(serde_json::json!({"service_name": "x", "replicas": 3})),
                None,
            )
            .unwrap();

        let (contract, arguments) = revalidate(&registry, &proposal).unwrap();
        assert_eq!(contract.name(), "scale_cluster");
        assert_eq!(&arguments, proposal.arguments());
    }
}
