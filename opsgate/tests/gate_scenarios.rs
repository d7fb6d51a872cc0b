//! End-to-end approval scenarios against a recording toolbelt.

use opsgate::prelude::*;
use opsgate::testing::{
    assert_gate_idle, assert_gate_state, assert_handler_failure, assert_outcome_succeeded,
    FailingHandler, OpsFixture,
};
use pretty_assertions::assert_eq;

fn args(value: serde_json::Value) -> RawArguments {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn restart_service_round_trip() {
    let fixture = OpsFixture::new();
    let session = fixture.session("operator");

    let proposal = session
        .submit(
            "restart_service",
            &args(serde_json::json!({"service_name": "billing-api", "force": true})),
            Some("hard restart billing"),
        )
        .unwrap();
    assert_gate_state(session.gate(), "pending");
    assert_eq!(session.gate().pending(), Some(proposal.clone()));

    let outcome = session.approve().await.unwrap();
    assert_outcome_succeeded(&outcome);

    let calls = fixture.restart.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].require_str("service_name").unwrap(), "billing-api");
    assert!(calls[0].require_bool("force").unwrap());

    let view = session.view();
    assert_eq!(view.state, "resolved");
    assert_eq!(view.decision, Some(Decision::Approved));

    let report = session.acknowledge().unwrap();
    assert_eq!(report.proposal_id, proposal.id());
    assert_eq!(report.tool, "restart_service");
    assert_eq!(
        report.args,
        serde_json::json!({"service_name": "billing-api", "force": true})
    );
    assert_eq!(report.origin.as_deref(), Some("hard restart billing"));
    assert_gate_idle(session.gate());
}

#[test]
fn scale_cluster_missing_replicas() {
    let fixture = OpsFixture::new();
    let session = fixture.session("operator");

    let err = session
        .submit("scale_cluster", &args(serde_json::json!({"service_name": "x"})), None)
        .unwrap_err();

    match err {
        OpsGateError::Validation(ValidationError::MissingArgument { argument, .. }) => {
            assert_eq!(argument, "replicas");
        }
        other => panic!("expected MissingArgument, got {other:?}"),
    }
    assert_gate_idle(session.gate());
    assert_eq!(fixture.scale.call_count(), 0);
}

#[test]
fn unknown_operation_never_reaches_gate() {
    let fixture = OpsFixture::new();
    let session = fixture.session("operator");

    let err = session
        .submit("delete_database", &args(serde_json::json!({})), None)
        .unwrap_err();

    assert_eq!(err.kind(), "UnknownOperation");
    assert_gate_idle(session.gate());
}

#[test]
fn wrong_argument_type_is_rejected() {
    let fixture = OpsFixture::new();
    let session = fixture.session("operator");

    let err = session
        .submit(
            "restart_service",
            &args(serde_json::json!({"service_name": "web", "force": "yes"})),
            None,
        )
        .unwrap_err();

    assert_eq!(err.kind(), "InvalidArgumentType");
    assert_gate_idle(session.gate());
}

#[tokio::test]
async fn double_approve_runs_handler_once() {
    let fixture = OpsFixture::new();
    let session = fixture.session("operator");
    session
        .submit(
            "scale_cluster",
            &args(serde_json::json!({"service_name": "web", "replicas": 5.0})),
            None,
        )
        .unwrap();

    session.approve().await.unwrap();
    let err = session.approve().await.unwrap_err();

    assert_eq!(err, GateError::invalid_transition("approve", "resolved"));
    assert_eq!(fixture.scale.call_count(), 1);
    assert_eq!(
        fixture.scale.last_call().unwrap().require_i64("replicas").unwrap(),
        5
    );
}

#[test]
fn submit_while_pending_keeps_original() {
    let fixture = OpsFixture::new();
    let session = fixture.session("operator");
    let first = session
        .submit(
            "restart_service",
            &args(serde_json::json!({"service_name": "billing-api", "force": false})),
            None,
        )
        .unwrap();

    let err = session
        .submit(
            "scale_cluster",
            &args(serde_json::json!({"service_name": "web", "replicas": 2})),
            None,
        )
        .unwrap_err();

    assert_eq!(err.kind(), "GateBusy");
    assert_eq!(session.gate().pending(), Some(first));
}

#[test]
fn reject_then_acknowledge_returns_to_idle() {
    let fixture = OpsFixture::new();
    let session = fixture.session("operator");
    session
        .submit(
            "restart_service",
            &args(serde_json::json!({"service_name": "billing-api", "force": true})),
            None,
        )
        .unwrap();

    session.reject().unwrap();
    let report = session.acknowledge().unwrap();

    assert_eq!(report.decision, Decision::Rejected);
    assert!(report.outcome.is_none());
    assert_eq!(
        report.summary(),
        "Action `restart_service` was rejected by the operator."
    );
    assert_eq!(fixture.restart.call_count(), 0);
    assert_gate_idle(session.gate());
}

#[tokio::test]
async fn failing_handler_still_reaches_resolved() {
    let failing = Arc::new(FailingHandler::new("cluster API unreachable"));
    let registry = Arc::new(
        ToolbeltRegistry::from_manifest(vec![OperationContract::new(
            "scale_cluster",
            failing.clone(),
        )
        .with_arg(ArgSpec::required("service_name", ArgKind::String))
        .with_arg(ArgSpec::required("replicas", ArgKind::Integer))])
        .unwrap(),
    );
    let session = Session::new("operator", registry);
    session
        .submit(
            "scale_cluster",
            &args(serde_json::json!({"service_name": "web", "replicas": 3})),
            None,
        )
        .unwrap();

    let outcome = session.approve().await.unwrap();

    assert_handler_failure(&outcome);
    assert_gate_state(session.gate(), "resolved");
    let report = session.acknowledge().unwrap();
    assert_eq!(
        report.summary(),
        "Execution of `scale_cluster` failed: cluster API unreachable"
    );
    assert_eq!(failing.call_count(), 1);
}

#[tokio::test]
async fn events_follow_the_cycle() {
    let fixture = OpsFixture::new();
    let sink = Arc::new(CollectingEventSink::new());
    let store = SessionStore::new(fixture.registry(), GateConfig::default())
        .with_event_sink(sink.clone());
    let session = store.get_or_create("operator");

    session
        .submit(
            "restart_service",
            &args(serde_json::json!({"service_name": "web", "force": false})),
            None,
        )
        .unwrap();
    session.cancel().unwrap();
    session
        .submit(
            "restart_service",
            &args(serde_json::json!({"service_name": "web", "force": false})),
            None,
        )
        .unwrap();
    session.approve().await.unwrap();
    session.acknowledge().unwrap();

    assert_eq!(
        sink.event_types(),
        vec![
            "gate.submitted",
            "gate.cancelled",
            "gate.submitted",
            "gate.approved",
            "execution.started",
            "execution.completed",
            "gate.acknowledged",
        ]
    );
}
