//! Execution outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Error kind reported when a handler fails, panics or times out.
pub const HANDLER_FAILURE: &str = "HandlerFailure";

/// Structured description of a failed execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    /// Stable error kind, e.g. `HandlerFailure`.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
}

impl ErrorDescriptor {
    /// Creates a new error descriptor.
    #[must_use]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Creates a handler failure descriptor.
    #[must_use]
    pub fn handler_failure(message: impl Into<String>) -> Self {
        Self::new(HANDLER_FAILURE, message)
    }
}

/// The result of actually running an approved operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Whether the operation succeeded.
    pub success: bool,
    /// The handler's payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// The failure descriptor on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDescriptor>,
    /// Wall-clock execution time in milliseconds.
    pub duration_ms: f64,
    /// When execution finished.
    pub completed_at: DateTime<Utc>,
}

impl ExecutionOutcome {
    /// Creates a successful outcome.
    #[must_use]
    pub fn ok(result: serde_json::Value, duration_ms: f64) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            duration_ms,
            completed_at: Utc::now(),
        }
    }

    /// Creates a failed outcome.
    #[must_use]
    pub fn fail(error: ErrorDescriptor, duration_ms: f64) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error),
            duration_ms,
            completed_at: Utc::now(),
        }
    }

    /// Returns the error kind if the outcome is a failure.
    #[must_use]
    pub fn error_kind(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.kind.as_str())
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("success".to_string(), serde_json::json!(self.success));

        if let Some(ref result) = self.result {
            map.insert("result".to_string(), result.clone());
        }
        if let Some(ref error) = self.error {
            map.insert(
                "error".to_string(),
                serde_json::json!({"kind": error.kind, "message": error.message}),
            );
        }
        map.insert("duration_ms".to_string(), serde_json::json!(self.duration_ms));

        map
    }
}
