// engagement/src/model/job.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type JobId = String;

/// Hourly budgets are compared against fixed ones as one 40-hour work week.
pub const HOURS_PER_WEEK: u64 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetKind {
  Fixed,
  Hourly,
}

impl std::str::FromStr for BudgetKind {
  type Err = crate::error::EngagementError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "fixed" => Ok(BudgetKind::Fixed),
      "hourly" => Ok(BudgetKind::Hourly),
      other => Err(crate::error::EngagementError::validation(
        "jobType",
        format!("unknown job type '{}'", other),
      )),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub kind: Option<BudgetKind>,
  pub min: u64,
  pub max: u64,
}

impl Budget {
  pub fn fixed(min: u64, max: u64) -> Self {
    Self {
      kind: Some(BudgetKind::Fixed),
      min,
      max,
    }
  }

  pub fn hourly(min: u64, max: u64) -> Self {
    Self {
      kind: Some(BudgetKind::Hourly),
      min,
      max,
    }
  }

  fn scale(amount: u64, kind: Option<BudgetKind>) -> u64 {
    match kind {
      Some(BudgetKind::Hourly) => amount.saturating_mul(HOURS_PER_WEEK),
      _ => amount,
    }
  }

  /// Upper end of the range, with hourly rates expanded to a work week.
  ///
  /// `kind` is the job's effective type, which may differ from `self.kind`.
  pub fn effective_max(&self, kind: Option<BudgetKind>) -> u64 {
    Self::scale(self.min.max(self.max), kind)
  }

  pub fn effective_min(&self, kind: Option<BudgetKind>) -> u64 {
    Self::scale(self.min.min(self.max), kind)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
  Open,
  Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
  pub id: JobId,
  pub client_id: String,
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub category: String,
  #[serde(default)]
  pub skills: Vec<String>,
  /// Explicit job type. When absent the budget's own type is used.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub job_type: Option<BudgetKind>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub budget: Option<Budget>,
  /// Free-text bucket label such as "1-3 months" or "Less than a week".
  #[serde(default)]
  pub duration: String,
  pub posted_at: DateTime<Utc>,
  #[serde(default)]
  pub proposal_count: u32,
  pub status: JobStatus,
}

impl Job {
  pub fn is_open(&self) -> bool {
    self.status == JobStatus::Open
  }

  pub fn effective_kind(&self) -> Option<BudgetKind> {
    self.job_type.or_else(|| self.budget.as_ref().and_then(|b| b.kind))
  }

  /// Budgets are scaled by the same type the job-type filter sees.
  pub fn effective_max_budget(&self) -> Option<u64> {
    let kind = self.effective_kind();
    self.budget.as_ref().map(|b| b.effective_max(kind))
  }

  pub fn effective_min_budget(&self) -> Option<u64> {
    let kind = self.effective_kind();
    self.budget.as_ref().map(|b| b.effective_min(kind))
  }
}
