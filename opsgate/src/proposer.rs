//! The proposer seam: free-form text in, structured proposal or reply out.

use crate::proposal::ProposerReply;
use async_trait::async_trait;

/// Translates an operator request into a proposal or a plain response.
///
/// Implementations typically wrap a tool-calling language model that has
/// been given [`crate::toolbelt::ToolbeltRegistry::declarations`]. A failed
/// call surfaces from the session as [`crate::errors::OpsGateError::Proposer`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Proposer: Send + Sync {
    /// Interprets a request.
    async fn propose(&self, request: &str) -> anyhow::Result<ProposerReply>;
}
