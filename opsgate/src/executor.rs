//! Execution adapter: runs an approved proposal's handler and captures the
//! result as data.

use crate::events::{EventSink, NoOpEventSink, EXECUTION_COMPLETED, EXECUTION_FAILED, EXECUTION_STARTED};
use crate::observability::SpanTimer;
use crate::outcome::{ErrorDescriptor, ExecutionOutcome};
use crate::proposal::Proposal;
use crate::toolbelt::ToolbeltRegistry;
use crate::validator::revalidate;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default upper bound on a single handler run.
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Invokes operation handlers on behalf of the gate.
///
/// `execute` never fails: handler errors, panics and timeouts all become
/// unsuccessful [`ExecutionOutcome`]s so the approval cycle always
/// completes.
pub struct ExecutionAdapter {
    /// Registry the proposal is resolved against at execution time.
    registry: Arc<ToolbeltRegistry>,
    /// Upper bound on a single handler run.
    timeout: Duration,
    /// Event sink for execution events.
    event_sink: Arc<dyn EventSink>,
}

impl ExecutionAdapter {
    /// Creates a new adapter with the default timeout.
    #[must_use]
    pub fn new(registry: Arc<ToolbeltRegistry>) -> Self {
        Self {
            registry,
            timeout: DEFAULT_EXECUTION_TIMEOUT,
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the execution timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Returns the execution timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Executes a proposal.
    ///
    /// The contract is looked up again and the arguments re-checked before
    /// the handler runs. A handler that exceeds the timeout is dropped and
    /// reported as a `HandlerFailure`.
    pub async fn execute(&self, proposal: &Proposal) -> ExecutionOutcome {
        let timer = SpanTimer::start(proposal.operation());

        let (contract, arguments) = match revalidate(&self.registry, proposal) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(tool = %proposal.operation(), error = %e, "Proposal failed revalidation");
                let error = ErrorDescriptor::new(e.kind(), e.to_string());
                return self.failed(proposal, error, timer.finish());
            }
        };

        self.event_sink.try_emit(
            EXECUTION_STARTED,
            Some(serde_json::json!({
                "tool": proposal.operation(),
                "proposal_id": proposal.id().to_string(),
            })),
        );

        let handler = Arc::clone(contract.handler());
        let call = AssertUnwindSafe(handler.call(&arguments)).catch_unwind();

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(Ok(result))) => {
                let duration_ms = timer.finish();
                info!(tool = %proposal.operation(), duration_ms, "Operation executed");
                self.event_sink.try_emit(
                    EXECUTION_COMPLETED,
                    Some(serde_json::json!({
                        "tool": proposal.operation(),
                        "proposal_id": proposal.id().to_string(),
                        "duration_ms": duration_ms,
                    })),
                );
                ExecutionOutcome::ok(result, duration_ms)
            }
            Ok(Ok(Err(e))) => {
                let error = ErrorDescriptor::handler_failure(format!("{e:#}"));
                self.failed(proposal, error, timer.finish())
            }
            Ok(Err(panic)) => {
                let error = ErrorDescriptor::handler_failure(format!(
                    "handler panicked: {}",
                    panic_message(panic.as_ref())
                ));
                self.failed(proposal, error, timer.finish())
            }
            Err(_) => {
                let error = ErrorDescriptor::handler_failure(format!(
                    "handler timed out after {:.1}s",
                    self.timeout.as_secs_f64()
                ));
                self.failed(proposal, error, timer.finish())
            }
        }
    }

    fn failed(&self, proposal: &Proposal, error: ErrorDescriptor, duration_ms: f64) -> ExecutionOutcome {
        warn!(
            tool = %proposal.operation(),
            kind = %error.kind,
            message = %error.message,
            duration_ms,
            "Operation failed"
        );
        self.event_sink.try_emit(
            EXECUTION_FAILED,
            Some(serde_json::json!({
                "tool": proposal.operation(),
                "proposal_id": proposal.id().to_string(),
                "kind": error.kind,
                "message": error.message,
            })),
        );
        ExecutionOutcome::fail(error, duration_ms)
    }
}

impl std::fmt::Debug for ExecutionAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionAdapter")
            .field("registry", &self.registry)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
