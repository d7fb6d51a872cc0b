//! Mock handlers and proposers for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

use crate::proposal::ProposerReply;
use crate::proposer::Proposer;
use crate::toolbelt::{Arguments, OperationHandler};

/// A handler that records every call and returns a fixed payload.
#[derive(Debug)]
pub struct RecordingHandler {
    result: serde_json::Value,
    delay: Option<Duration>,
    calls: Mutex<Vec<Arguments>>,
}

impl RecordingHandler {
    /// Creates a handler returning `result`.
    #[must_use]
    pub fn new(result: serde_json::Value) -> Self {
        Self {
            result,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sleeps for `delay` before returning, after recording the call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the number of times the handler ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the arguments of each call.
    #[must_use]
    pub fn calls(&self) -> Vec<Arguments> {
        self.calls.lock().clone()
    }

    /// Returns the arguments of the most recent call.
    #[must_use]
    pub fn last_call(&self) -> Option<Arguments> {
        self.calls.lock().last().cloned()
    }
}

#[async_trait]
impl OperationHandler for RecordingHandler {
    async fn call(&self, args: &Arguments) -> anyhow::Result<serde_json::Value> {
        self.calls.lock().push(args.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.result.clone())
    }
}

/// A handler that always returns an error.
#[derive(Debug)]
pub struct FailingHandler {
    error: String,
    calls: Mutex<usize>,
}

impl FailingHandler {
    /// Creates a failing handler.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            calls: Mutex::new(0),
        }
    }

    /// Returns the number of times the handler ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl OperationHandler for FailingHandler {
    async fn call(&self, _args: &Arguments) -> anyhow::Result<serde_json::Value> {
        *self.calls.lock() += 1;
        Err(anyhow::anyhow!("{}", self.error))
    }
}

/// A handler that panics.
#[derive(Debug)]
pub struct PanickingHandler {
    message: String,
}

impl PanickingHandler {
    /// Creates a panicking handler.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl OperationHandler for PanickingHandler {
    #[allow(clippy::panic)]
    async fn call(&self, _args: &Arguments) -> anyhow::Result<serde_json::Value> {
        panic!("{}", self.message);
    }
}

/// A handler that sleeps before succeeding.
#[derive(Debug)]
pub struct SlowHandler {
    delay: Duration,
}

impl SlowHandler {
    /// Creates a slow handler.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Creates a slow handler with delay in milliseconds.
    #[must_use]
    pub fn with_delay_ms(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

#[async_trait]
impl OperationHandler for SlowHandler {
    async fn call(&self, _args: &Arguments) -> anyhow::Result<serde_json::Value> {
        tokio::time::sleep(self.delay).await;
        Ok(serde_json::json!({"slept_ms": u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX)}))
    }
}

/// A proposer that replays scripted replies in order.
///
/// Once the script is exhausted every request fails.
#[derive(Debug, Default)]
pub struct ScriptedProposer {
    replies: Mutex<VecDeque<anyhow::Result<ProposerReply>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedProposer {
    /// Creates a proposer with a script of replies.
    #[must_use]
    pub fn new(replies: impl IntoIterator<Item = ProposerReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Appends a failure to the script.
    #[must_use]
    pub fn then_fail(self, error: impl Into<String>) -> Self {
        let error = error.into();
        self.replies.lock().push_back(Err(anyhow::anyhow!("{error}")));
        self
    }

    /// Returns the requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Proposer for ScriptedProposer {
    async fn propose(&self, request: &str) -> anyhow::Result<ProposerReply> {
        self.requests.lock().push(request.to_string());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted reply left")))
    }
}
