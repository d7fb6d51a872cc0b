//! Full request flow over the built-in net-ops toolbelt.

#![cfg(feature = "netops")]

use opsgate::prelude::*;
use opsgate::testing::{assert_gate_idle, assert_outcome_succeeded, ScriptedProposer};
use pretty_assertions::assert_eq;

fn store() -> SessionStore {
    let config = GateConfig::new().with_simulated_latency(false);
    let registry = Arc::new(netops_registry(config.simulated_latency).unwrap());
    SessionStore::new(registry, config)
}

#[tokio::test]
async fn request_to_report() {
    let store = store();
    let session = store.get_or_create("operator");
    let proposer = ScriptedProposer::new(vec![ProposerReply::action(
        "scale_cluster",
        serde_json::json!({"cluster_id": "east-1", "replicas": 10}),
    )]);

    let outcome = session
        .handle_request("scale east-1 to 10 replicas", &proposer)
        .await
        .unwrap();
    let RequestOutcome::Proposed { proposal } = outcome else {
        panic!("expected a proposal");
    };

    let view = session.view();
    assert!(view.can_decide);
    assert_eq!(view.proposal.as_ref().map(|p| p.id), Some(proposal.id()));

    let outcome = session.approve_proposal(proposal.id()).await.unwrap();
    assert_outcome_succeeded(&outcome);
    let result = outcome.result.unwrap();
    assert_eq!(result["cluster_id"], "east-1");
    assert_eq!(result["current_replicas"], 10);
    assert_eq!(result["status"], "Scaled");

    let report = session.acknowledge().unwrap();
    assert_eq!(report.decision, Decision::Approved);
    assert_eq!(report.origin.as_deref(), Some("scale east-1 to 10 replicas"));
    assert_gate_idle(session.gate());
}

#[tokio::test]
async fn optional_default_is_visible_before_approval() {
    let store = store();
    let session = store.get_or_create("operator");

    let proposal = session
        .submit_raw(&RawProposal::new(
            "restart_service",
            serde_json::json!({"service_name": "auth-service"}),
        ))
        .unwrap();

    assert!(!proposal.arguments().require_bool("force").unwrap());

    let outcome = session.approve().await.unwrap();
    let result = outcome.result.unwrap();
    assert_eq!(result["mode"], "graceful");
    assert_eq!(result["status"], "Success");
}

#[tokio::test]
async fn negative_replicas_is_handler_failure() {
    let store = store();
    let session = store.get_or_create("operator");
    session
        .submit_raw(&RawProposal::new(
            "scale_cluster",
            serde_json::json!({"cluster_id": "east-1", "replicas": -1}),
        ))
        .unwrap();

    let outcome = session.approve().await.unwrap();

    assert_eq!(outcome.error_kind(), Some("HandlerFailure"));
    assert!(session.acknowledge().is_ok());
}

#[tokio::test]
async fn chat_reply_does_not_touch_gate() {
    let store = store();
    let session = store.get_or_create("operator");
    let proposer = ScriptedProposer::new(vec![ProposerReply::chat(
        "I can check health, restart services and scale clusters.",
    )]);

    let outcome = session.handle_request("what can you do?", &proposer).await.unwrap();

    assert!(matches!(outcome, RequestOutcome::Chat { .. }));
    assert_gate_idle(session.gate());
    assert_eq!(proposer.requests(), vec!["what can you do?"]);
}

#[tokio::test]
async fn stale_click_cannot_approve_newer_proposal() {
    let store = store();
    let session = store.get_or_create("operator");
    let health = RawProposal::new("get_service_health", serde_json::json!({"service_name": "web"}));

    let old = session.submit_raw(&health).unwrap();
    session.reset().unwrap();
    let current = session.submit_raw(&health).unwrap();

    let err = session.approve_proposal(old.id()).await.unwrap_err();
    assert_eq!(err.kind(), "StaleProposal");
    assert_eq!(session.gate().pending(), Some(current));
}

#[test]
fn declarations_cover_the_toolbelt() {
    let registry = netops_registry(false).unwrap();
    let declarations = registry.declarations();

    let names: Vec<_> = declarations.iter().map(|d| d["name"].clone()).collect();
    assert_eq!(
        names,
        vec!["get_service_health", "restart_service", "scale_cluster"]
    );
}
