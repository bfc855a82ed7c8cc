// engagement/src/model/mod.rs

//! Records owned by the external store. The client only ever holds read
//! projections of them.

pub mod job;
pub mod order;
pub mod proposal;

pub use job::{Budget, BudgetKind, Job, JobId, JobStatus, HOURS_PER_WEEK};
pub use order::{
  Deliverable, DeliverableId, DeliverableStatus, FileRef, Order, OrderId, OrderStatus, Review, Role, TimelineEvent,
  TimelineKind,
};
pub use proposal::{MilestonePlan, Proposal, ProposalId, ProposalStatus};
