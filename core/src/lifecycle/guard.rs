// engagement/src/lifecycle/guard.rs

//! In-flight guard that keeps a lifecycle action from being dispatched twice.

use crate::error::{EngagementError, EngagementResult};
use crate::model::{JobId, OrderId, ProposalId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{event, Level};

/// What an action locks while it is in flight.
///
/// Accept and Reject share the proposal key, so one proposal never has two
/// decisions racing. Every order action shares the order key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ActionKey {
  Proposal { job_id: JobId, proposal_id: ProposalId },
  Order { order_id: OrderId },
}

impl ActionKey {
  pub fn proposal(job_id: impl Into<JobId>, proposal_id: impl Into<ProposalId>) -> Self {
    ActionKey::Proposal {
      job_id: job_id.into(),
      proposal_id: proposal_id.into(),
    }
  }

  pub fn order(order_id: impl Into<OrderId>) -> Self {
    ActionKey::Order {
      order_id: order_id.into(),
    }
  }
}

impl std::fmt::Display for ActionKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ActionKey::Proposal { job_id, proposal_id } => write!(f, "job {} / proposal {}", job_id, proposal_id),
      ActionKey::Order { order_id } => write!(f, "order {}", order_id),
    }
  }
}

#[derive(Debug, Default)]
struct GuardState {
  in_flight: HashSet<ActionKey>,
  /// Keys whose action succeeded and must never be dispatched again.
  sealed: HashSet<ActionKey>,
}

#[derive(Debug, Clone, Default)]
pub struct DispatchGuard {
  state: Arc<Mutex<GuardState>>,
}

impl DispatchGuard {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn try_claim(&self, key: ActionKey) -> EngagementResult<DispatchTicket> {
    let mut state = self.state.lock();
    if state.sealed.contains(&key) || state.in_flight.contains(&key) {
      event!(Level::WARN, key = %key, "Refusing duplicate dispatch.");
      return Err(EngagementError::DuplicateDispatch { key: key.to_string() });
    }
    state.in_flight.insert(key.clone());
    event!(Level::TRACE, key = %key, "Dispatch slot claimed.");
    Ok(DispatchTicket {
      key,
      state: Arc::clone(&self.state),
      settled: false,
    })
  }

  /// Whether a new dispatch for `key` would be accepted right now.
  pub fn is_available(&self, key: &ActionKey) -> bool {
    let state = self.state.lock();
    !state.in_flight.contains(key) && !state.sealed.contains(key)
  }

  pub fn is_in_flight(&self, key: &ActionKey) -> bool {
    self.state.lock().in_flight.contains(key)
  }

  pub fn is_sealed(&self, key: &ActionKey) -> bool {
    self.state.lock().sealed.contains(key)
  }
}

/// Holds a claimed key. Dropping an unsettled ticket (failure or cancellation)
/// frees the key so the action can be retried.
#[derive(Debug)]
pub struct DispatchTicket {
  key: ActionKey,
  state: Arc<Mutex<GuardState>>,
  settled: bool,
}

impl DispatchTicket {
  pub fn key(&self) -> &ActionKey {
    &self.key
  }

  /// Success for a repeatable action: the key is free again.
  pub fn release(mut self) {
    self.settled = true;
    self.state.lock().in_flight.remove(&self.key);
  }

  /// Success for a one-shot action: the key stays blocked for good.
  pub fn seal(mut self) {
    self.settled = true;
    let mut state = self.state.lock();
    state.in_flight.remove(&self.key);
    state.sealed.insert(self.key.clone());
  }
}

impl Drop for DispatchTicket {
  fn drop(&mut self) {
    if !self.settled {
      self.state.lock().in_flight.remove(&self.key);
      event!(Level::DEBUG, key = %self.key, "Dispatch slot released after failure.");
    }
  }
}
