//! # Opsgate
//!
//! An action proposal and human approval gate for side-effecting
//! operations.
//!
//! A proposer (typically a tool-calling language model) turns operator
//! requests into structured proposals. Nothing it proposes runs on its own:
//!
//! - **Closed toolbelt**: only operations registered up front can be proposed
//! - **Validation**: names and arguments are checked before anything is shown
//! - **Approval gate**: one proposal at a time, executed at most once, and
//!   only after an explicit human decision
//! - **Failures as data**: handler errors, panics and timeouts become
//!   outcomes rather than crashing the session
//! - **Session isolation**: every operator gets their own gate
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use opsgate::prelude::*;
//!
//! let registry = Arc::new(netops_registry(false)?);
//! let session = Session::new("operator-1", registry);
//!
//! let args = serde_json::json!({"service_name": "billing-api", "force": true});
//! session.submit("restart_service", args.as_object().unwrap(), None)?;
//!
//! // ... the operator reviews the proposal ...
//! let outcome = session.approve().await?;
//! let report = session.acknowledge()?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod errors;
pub mod events;
pub mod executor;
pub mod gate;
pub mod observability;
pub mod outcome;
pub mod proposal;
pub mod proposer;
pub mod session;
pub mod testing;
pub mod toolbelt;
pub mod validator;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::GateConfig;
    pub use crate::errors::{GateError, OpsGateError, RegistryError, ValidationError};
    pub use crate::events::{CollectingEventSink, EventSink, NoOpEventSink, RecordedEvent};
    pub use crate::executor::ExecutionAdapter;
    pub use crate::gate::{ApprovalGate, Decision, GateState, ResolutionReport};
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::outcome::{ErrorDescriptor, ExecutionOutcome};
    pub use crate::proposal::{Proposal, ProposerReply, RawProposal};
    pub use crate::proposer::Proposer;
    pub use crate::session::{GateView, RequestOutcome, Session, SessionStore};
    #[cfg(feature = "netops")]
    pub use crate::toolbelt::netops::{netops_manifest, netops_registry};
    pub use crate::toolbelt::{
        ArgKind, ArgSpec, ArgValue, Arguments, FnHandler, OperationContract, OperationHandler,
        ToolbeltRegistry,
    };
    pub use crate::validator::{ProposalValidator, RawArguments};
    pub use std::sync::Arc;
}
