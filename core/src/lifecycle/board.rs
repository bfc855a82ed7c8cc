// engagement/src/lifecycle/board.rs

//! The lifecycle's read projection: the jobs, proposals and orders the client
//! currently knows about, plus the most recent failed action.

use super::guard::ActionKey;
use crate::error::EngagementError;
use crate::events::{MarketEvent, Projection};
use crate::model::{Job, JobId, Order, OrderId, Proposal, ProposalId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
  Accept,
  Reject,
  Deliver,
  Approve,
  RequestRevision,
  SubmitReview,
  Cancel,
}

/// A failed action, kept so the UI can show a specific error with the action still offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionFailure {
  pub action: ActionKind,
  pub key: ActionKey,
  pub message: String,
  pub retryable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
  pub jobs: BTreeMap<JobId, Job>,
  pub proposals: BTreeMap<ProposalId, Proposal>,
  pub orders: BTreeMap<OrderId, Order>,
  pub last_failure: Option<ActionFailure>,
}

impl Board {
  pub fn job(&self, job_id: &str) -> Option<&Job> {
    self.jobs.get(job_id)
  }

  pub fn order(&self, order_id: &str) -> Option<&Order> {
    self.orders.get(order_id)
  }

  pub fn proposal(&self, proposal_id: &str) -> Option<&Proposal> {
    self.proposals.get(proposal_id)
  }

  pub fn proposals_for<'a>(&'a self, job_id: &'a str) -> impl Iterator<Item = &'a Proposal> + 'a {
    self.proposals.values().filter(move |p| p.job_id == job_id)
  }

  pub fn upsert_job(&mut self, job: Job) {
    self.jobs.insert(job.id.clone(), job);
  }

  pub fn upsert_proposal(&mut self, proposal: Proposal) {
    self.proposals.insert(proposal.id.clone(), proposal);
  }

  pub fn upsert_order(&mut self, order: Order) {
    self.orders.insert(order.id.clone(), order);
  }

  /// Replaces the job and its whole proposal set with a fresh read.
  pub fn replace_job(&mut self, job: Job, proposals: Vec<Proposal>) {
    let job_id = job.id.clone();
    self.proposals.retain(|_, p| p.job_id != job_id);
    for proposal in proposals {
      self.upsert_proposal(proposal);
    }
    self.upsert_job(job);
  }

  /// Drops the job and its proposals so the next read goes to the store.
  pub fn invalidate_job(&mut self, job_id: &str) {
    self.jobs.remove(job_id);
    self.proposals.retain(|_, p| p.job_id != job_id);
  }

  pub fn invalidate_order(&mut self, order_id: &str) {
    self.orders.remove(order_id);
  }

  /// `sealed` is whether the key can never be dispatched again.
  pub fn record_failure(&mut self, action: ActionKind, key: &ActionKey, error: &EngagementError, sealed: bool) {
    let retryable = match error {
      EngagementError::DuplicateDispatch { .. } => !sealed,
      other => other.is_transient(),
    };
    self.last_failure = Some(ActionFailure {
      action,
      key: key.clone(),
      message: error.to_string(),
      retryable,
    });
  }

  pub fn clear_failure(&mut self, key: &ActionKey) {
    if self.last_failure.as_ref().is_some_and(|f| &f.key == key) {
      self.last_failure = None;
    }
  }
}

impl Projection for Board {
  fn fold(&mut self, event: &MarketEvent) {
    match event {
      MarketEvent::JobCreated(job) | MarketEvent::JobUpdated(job) => self.upsert_job(job.clone()),
      MarketEvent::JobDeleted { job_id } => self.invalidate_job(job_id),
      MarketEvent::ProposalUpdated(proposal) => self.upsert_proposal(proposal.clone()),
      MarketEvent::OrderUpdated(order) => self.upsert_order(order.clone()),
    }
  }
}
