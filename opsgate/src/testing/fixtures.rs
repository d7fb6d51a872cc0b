//! Test fixtures for gate testing.

use std::sync::Arc;

use super::mocks::RecordingHandler;
use crate::gate::ApprovalGate;
use crate::session::Session;
use crate::toolbelt::{ArgKind, ArgSpec, OperationContract, ToolbeltRegistry};
use crate::validator::ProposalValidator;

/// A small toolbelt with recording handlers.
///
/// - `restart_service(service_name: string, force: boolean)`
/// - `scale_cluster(service_name: string, replicas: integer)`
///
/// Each handler records its calls so tests can assert exactly what ran.
#[derive(Debug)]
pub struct OpsFixture {
    /// Handler behind `restart_service`.
    pub restart: Arc<RecordingHandler>,
    /// Handler behind `scale_cluster`.
    pub scale: Arc<RecordingHandler>,
    registry: Arc<ToolbeltRegistry>,
}

impl OpsFixture {
    /// Creates the fixture.
    ///
    /// # Panics
    ///
    /// Panics if the fixture contracts collide, which they never do.
    #[must_use]
    pub fn new() -> Self {
        let restart = Arc::new(RecordingHandler::new(serde_json::json!({
            "action": "restart",
            "status": "Success",
        })));
        let scale = Arc::new(RecordingHandler::new(serde_json::json!({"status": "Scaled"})));

        let registry = ToolbeltRegistry::from_manifest(vec![
            OperationContract::new("restart_service", restart.clone())
                .with_description("Restarts a service.")
                .with_arg(ArgSpec::required("service_name", ArgKind::String))
                .with_arg(ArgSpec::required("force", ArgKind::Boolean)),
            OperationContract::new("scale_cluster", scale.clone())
                .with_description("Scales a service's cluster.")
                .with_arg(ArgSpec::required("service_name", ArgKind::String))
                .with_arg(ArgSpec::required("replicas", ArgKind::Integer)),
        ])
        .unwrap_or_else(|e| panic!("fixture registry: {e}"));

        Self {
            restart,
            scale,
            registry: Arc::new(registry),
        }
    }

    /// Returns the shared registry.
    #[must_use]
    pub fn registry(&self) -> Arc<ToolbeltRegistry> {
        Arc::clone(&self.registry)
    }

    /// Returns a validator over the fixture registry.
    #[must_use]
    pub fn validator(&self) -> ProposalValidator {
        ProposalValidator::new(self.registry())
    }

    /// Returns an idle gate over the fixture registry.
    #[must_use]
    pub fn gate(&self) -> ApprovalGate {
        ApprovalGate::new(self.registry())
    }

    /// Returns a fresh session over the fixture registry.
    #[must_use]
    pub fn session(&self, id: &str) -> Session {
        Session::new(id, self.registry())
    }
}

impl Default for OpsFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_registry() {
        let fixture = OpsFixture::new();
        let registry = fixture.registry();

        assert_eq!(registry.names(), vec!["restart_service", "scale_cluster"]);
        assert!(fixture.gate().is_idle());
        assert_eq!(fixture.session("s1").id(), "s1");
    }

    #[test]
    fn test_fixture_validator_shares_registry() {
        let fixture = OpsFixture::new();
        let validator = fixture.validator();

        assert!(Arc::ptr_eq(validator.registry(), &fixture.registry()));
    }
}
