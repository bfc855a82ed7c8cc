// engagement/src/flow/mod.rs

//! Ordered, named-step action flows.
//!
//! Every lifecycle action runs as a `Flow`: a fixed list of steps, each with
//! async handlers that share one `Shared<TData>` context and decide whether
//! the flow continues or stops. Steps may be optional and may carry a
//! `skip_if` condition evaluated right before they run.

pub mod control;
pub mod definition;
pub mod execution;

pub use control::{FlowControl, FlowResult};
pub use definition::{Flow, Handler, SkipCondition, StepDef};
