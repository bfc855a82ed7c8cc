// engagement/src/model/proposal.rs

use super::job::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ProposalId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
  Pending,
  Accepted,
  Rejected,
}

/// A unit of work the freelancer commits to. Becomes a deliverable on acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestonePlan {
  pub name: String,
  #[serde(default)]
  pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
  pub id: ProposalId,
  pub job_id: JobId,
  pub freelancer_id: String,
  pub bid_amount: u64,
  pub delivery_time_days: u32,
  #[serde(default)]
  pub cover_letter: String,
  pub submitted_at: DateTime<Utc>,
  pub status: ProposalStatus,
  /// Free text kept for audit only.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rejection_reason: Option<String>,
  #[serde(default)]
  pub milestones: Vec<MilestonePlan>,
}

impl Proposal {
  pub fn is_pending(&self) -> bool {
    self.status == ProposalStatus::Pending
  }
}
