//! Operation handler trait.

use super::Arguments;
use async_trait::async_trait;

/// The side-effecting body of an operation.
///
/// Handlers receive arguments that have already been validated against the
/// operation's contract. Any error they return is captured by the execution
/// adapter and reported as a `HandlerFailure` outcome.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    /// Runs the operation.
    async fn call(&self, args: &Arguments) -> anyhow::Result<serde_json::Value>;
}

/// Boxed synchronous handler function.
pub type HandlerFn = Box<dyn Fn(&Arguments) -> anyhow::Result<serde_json::Value> + Send + Sync>;

/// Adapts a plain closure into an [`OperationHandler`].
pub struct FnHandler {
    func: HandlerFn,
}

impl FnHandler {
    /// Wraps a closure.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Arguments) -> anyhow::Result<serde_json::Value> + Send + Sync + 'static,
    {
        Self {
            func: Box::new(func),
        }
    }
}

#[async_trait]
impl OperationHandler for FnHandler {
    async fn call(&self, args: &Arguments) -> anyhow::Result<serde_json::Value> {
        (self.func)(args)
    }
}

impl std::fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}
