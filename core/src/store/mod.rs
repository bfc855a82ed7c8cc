// engagement/src/store/mod.rs

//! Repository seams over the external store.
//!
//! The store owns every Job, Proposal and Order. The core lists and gets
//! records and requests mutations; it never edits a record in place. Each
//! trait has an in-memory fake (`InMemoryStore`) and a REST client
//! (`HttpStore`).

pub mod http;
pub mod memory;
pub mod policy;

use crate::error::EngagementResult;
use crate::model::{FileRef, Job, Order, OrderId, Proposal, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::HttpStore;
pub use memory::{InMemoryStore, InjectedFault};
pub use policy::RequestPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ProposalMutation {
  Accept,
  Reject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
  },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OrderMutation {
  Deliver {
    deliverable_id: String,
    files: Vec<FileRef>,
  },
  Approve {
    deliverable_id: String,
  },
  RequestRevision {
    deliverable_id: String,
    note: String,
  },
  SubmitReview {
    author_role: Role,
    rating: u8,
    text: String,
  },
  Cancel {
    actor: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
  },
}

/// What the store reports back from a mutation. Only Accept creates an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationReceipt {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub order_id: Option<OrderId>,
}

#[async_trait]
pub trait JobRepository: Send + Sync {
  async fn list_jobs(&self) -> EngagementResult<Vec<Job>>;

  async fn get_job(&self, job_id: &str) -> EngagementResult<Job>;
}

#[async_trait]
pub trait ProposalRepository: Send + Sync {
  async fn list_proposals(&self, job_id: &str) -> EngagementResult<Vec<Proposal>>;

  /// Accept is not idempotent: each success creates an order.
  async fn mutate_proposal(
    &self,
    job_id: &str,
    proposal_id: &str,
    mutation: ProposalMutation,
  ) -> EngagementResult<MutationReceipt>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
  async fn get_order(&self, order_id: &str) -> EngagementResult<Order>;

  async fn mutate_order(&self, order_id: &str, mutation: OrderMutation) -> EngagementResult<MutationReceipt>;
}

/// Everything the lifecycle needs from one backend.
pub trait Marketplace: JobRepository + ProposalRepository + OrderRepository {}

impl<T> Marketplace for T where T: JobRepository + ProposalRepository + OrderRepository {}
