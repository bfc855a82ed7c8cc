// engagement/src/model/order.rs

use super::job::JobId;
use super::proposal::ProposalId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type OrderId = String;
pub type DeliverableId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Client,
  Freelancer,
}

impl std::fmt::Display for Role {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Role::Client => f.write_str("client"),
      Role::Freelancer => f.write_str("freelancer"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Pending,
  InProgress,
  Delivered,
  Completed,
  Cancelled,
}

impl OrderStatus {
  pub fn is_terminal(self) -> bool {
    matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliverableStatus {
  Pending,
  InProgress,
  Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
  pub name: String,
  pub url: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub size_bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deliverable {
  pub id: DeliverableId,
  pub order_id: OrderId,
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub status: DeliverableStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub delivered_at: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub approved_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub files: Vec<FileRef>,
  #[serde(default)]
  pub revision_count: u32,
}

impl Deliverable {
  pub fn is_completed(&self) -> bool {
    self.status == DeliverableStatus::Completed
  }

  pub fn is_approved(&self) -> bool {
    self.is_completed() && self.approved_at.is_some()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKind {
  OrderCreated,
  DeliverableSubmitted,
  DeliverableApproved,
  RevisionRequested,
  OrderDelivered,
  OrderCompleted,
  OrderCancelled,
  ReviewSubmitted,
}

/// Append-only audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
  pub id: String,
  pub order_id: OrderId,
  #[serde(rename = "type")]
  pub kind: TimelineKind,
  pub title: String,
  #[serde(default)]
  pub description: String,
  pub timestamp: DateTime<Utc>,
  pub actor: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
  pub order_id: OrderId,
  pub author_role: Role,
  pub rating: u8,
  pub text: String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: OrderId,
  pub job_id: JobId,
  pub proposal_id: ProposalId,
  pub freelancer_id: String,
  pub client_id: String,
  pub base_price: u64,
  pub service_fee: u64,
  pub total: u64,
  pub created_at: DateTime<Utc>,
  pub deadline: DateTime<Utc>,
  pub status: OrderStatus,
  #[serde(default)]
  pub deliverables: Vec<Deliverable>,
  #[serde(default)]
  pub timeline: Vec<TimelineEvent>,
  #[serde(default)]
  pub reviews: Vec<Review>,
}

impl Order {
  pub fn deliverable(&self, deliverable_id: &str) -> Option<&Deliverable> {
    self.deliverables.iter().find(|d| d.id == deliverable_id)
  }

  pub fn deliverable_mut(&mut self, deliverable_id: &str) -> Option<&mut Deliverable> {
    self.deliverables.iter_mut().find(|d| d.id == deliverable_id)
  }

  pub fn review_by(&self, role: Role) -> Option<&Review> {
    self.reviews.iter().find(|r| r.author_role == role)
  }
}
