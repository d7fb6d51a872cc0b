//! Session boundary.
//!
//! A [`Session`] owns exactly one gate. Hosts resolve sessions through a
//! [`SessionStore`], render them with [`GateView`] and change them only
//! through the session's explicit mutators.

mod operator;
mod store;
mod view;

pub use operator::{RequestOutcome, Session};
pub use store::SessionStore;
pub use view::{GateView, ProposalView};
