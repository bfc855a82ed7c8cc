// engagement/src/lifecycle/mod.rs

//! The engagement state machine: Job → Proposal → Order → Deliverables → Review.

pub mod actions;
pub mod board;
pub mod client;
pub mod guard;
pub mod rules;

pub use actions::{ActionCtx, ActionRequest, ACTION_FLOW};
pub use board::{ActionFailure, ActionKind, Board};
pub use client::Lifecycle;
pub use guard::{ActionKey, DispatchGuard, DispatchTicket};
pub use rules::AcceptOutcome;
