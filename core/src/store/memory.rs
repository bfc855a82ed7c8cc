// engagement/src/store/memory.rs

//! `InMemoryStore`: an authoritative store held in process.
//!
//! It applies the same transition rules a real backend enforces, publishes a
//! `MarketEvent` for every record it changes, and can be told to fail or
//! stall so callers can exercise their failure paths.

use super::{JobRepository, MutationReceipt, OrderMutation, OrderRepository, ProposalMutation, ProposalRepository};
use crate::error::{EngagementError, EngagementResult};
use crate::events::{EventHub, MarketEvent};
use crate::lifecycle::rules;
use crate::model::{Job, Order, OrderId, Proposal};
use crate::pricing::FeeRule;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{event, Level};
use uuid::Uuid;

/// A failure the store serves to the next call, in FIFO order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedFault {
  Network,
  Conflict(String),
  /// An opaque backend failure.
  Unavailable,
  /// Hold the call for this long before answering normally.
  Stall(Duration),
}

#[derive(Debug, Default)]
struct MemoryState {
  jobs: Vec<Job>,
  proposals: Vec<Proposal>,
  orders: BTreeMap<OrderId, Order>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
  state: RwLock<MemoryState>,
  faults: Mutex<VecDeque<InjectedFault>>,
  latency: Mutex<Option<Duration>>,
  fee_rule: FeeRule,
  hub: Option<EventHub>,
  calls: AtomicU64,
  mutations: AtomicU64,
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_fee_rule(mut self, fee_rule: FeeRule) -> Self {
    self.fee_rule = fee_rule;
    self
  }

  /// Publishes every change to `hub`.
  pub fn with_event_hub(mut self, hub: EventHub) -> Self {
    self.hub = Some(hub);
    self
  }

  // --- Seeding ---

  pub fn insert_job(&self, job: Job) {
    let mut state = self.state.write();
    state.jobs.retain(|j| j.id != job.id);
    state.jobs.push(job.clone());
    drop(state);
    self.publish(vec![MarketEvent::JobCreated(job)]);
  }

  /// Adds a proposal and bumps its job's `proposal_count`.
  pub fn insert_proposal(&self, proposal: Proposal) -> EngagementResult<()> {
    let job = {
      let mut state = self.state.write();
      let job = state
        .jobs
        .iter_mut()
        .find(|j| j.id == proposal.job_id)
        .ok_or_else(|| EngagementError::not_found("job", proposal.job_id.as_str()))?;
      job.proposal_count += 1;
      let job = job.clone();
      state.proposals.push(proposal.clone());
      job
    };
    self.publish(vec![MarketEvent::JobUpdated(job), MarketEvent::ProposalUpdated(proposal)]);
    Ok(())
  }

  pub fn insert_order(&self, order: Order) {
    self.state.write().orders.insert(order.id.clone(), order.clone());
    self.publish(vec![MarketEvent::OrderUpdated(order)]);
  }

  // --- Test controls ---

  pub fn inject_fault(&self, fault: InjectedFault) {
    self.faults.lock().push_back(fault);
  }

  /// Delay applied to every call before it is answered.
  pub fn set_latency(&self, latency: Option<Duration>) {
    *self.latency.lock() = latency;
  }

  /// Every call received, reads included.
  pub fn call_count(&self) -> u64 {
    self.calls.load(Ordering::SeqCst)
  }

  /// Mutations that changed state.
  pub fn mutation_count(&self) -> u64 {
    self.mutations.load(Ordering::SeqCst)
  }

  // --- Inspection ---

  pub fn job(&self, job_id: &str) -> Option<Job> {
    self.state.read().jobs.iter().find(|j| j.id == job_id).cloned()
  }

  pub fn proposal(&self, proposal_id: &str) -> Option<Proposal> {
    self.state.read().proposals.iter().find(|p| p.id == proposal_id).cloned()
  }

  pub fn orders(&self) -> Vec<Order> {
    self.state.read().orders.values().cloned().collect()
  }

  pub fn orders_for_job(&self, job_id: &str) -> Vec<Order> {
    self
      .state
      .read()
      .orders
      .values()
      .filter(|o| o.job_id == job_id)
      .cloned()
      .collect()
  }

  // --- Internals ---

  /// Counts the call, waits out any latency, then serves the next injected fault.
  async fn enter(&self, operation: &'static str) -> EngagementResult<()> {
    self.calls.fetch_add(1, Ordering::SeqCst);

    let latency = *self.latency.lock();
    if let Some(latency) = latency {
      tokio::time::sleep(latency).await;
    }

    let fault = self.faults.lock().pop_front();
    match fault {
      None => Ok(()),
      Some(InjectedFault::Stall(duration)) => {
        event!(Level::DEBUG, operation, stall_ms = duration.as_millis() as u64, "Stalling call.");
        tokio::time::sleep(duration).await;
        Ok(())
      }
      Some(InjectedFault::Network) => {
        event!(Level::DEBUG, operation, "Serving injected network failure.");
        Err(EngagementError::network(format!("connection reset during {}", operation)))
      }
      Some(InjectedFault::Conflict(message)) => Err(EngagementError::conflict(message)),
      Some(InjectedFault::Unavailable) => Err(anyhow::anyhow!("store unavailable during {}", operation).into()),
    }
  }

  fn publish(&self, events: Vec<MarketEvent>) {
    if let Some(hub) = &self.hub {
      for market_event in events {
        hub.publish(market_event);
      }
    }
  }

  fn committed(&self, events: Vec<MarketEvent>) {
    self.mutations.fetch_add(1, Ordering::SeqCst);
    self.publish(events);
  }

  fn accept(&self, job_id: &str, proposal_id: &str) -> EngagementResult<(MutationReceipt, Vec<MarketEvent>)> {
    let mut state = self.state.write();
    let job_idx = state
      .jobs
      .iter()
      .position(|j| j.id == job_id)
      .ok_or_else(|| EngagementError::not_found("job", job_id))?;

    // Work on copies; nothing is committed unless every rule passes.
    let mut job = state.jobs[job_idx].clone();
    let mut proposals: Vec<Proposal> = state.proposals.iter().filter(|p| p.job_id == job_id).cloned().collect();
    let order_id = format!("ord-{}", Uuid::new_v4().simple());
    let outcome = rules::accept(&mut job, &mut proposals, proposal_id, &self.fee_rule, order_id, Utc::now())?;

    let mut events = vec![MarketEvent::JobUpdated(job.clone())];
    state.jobs[job_idx] = job;
    for updated in proposals {
      if updated.id == proposal_id || outcome.rejected.contains(&updated.id) {
        events.push(MarketEvent::ProposalUpdated(updated.clone()));
      }
      if let Some(slot) = state.proposals.iter_mut().find(|p| p.id == updated.id) {
        *slot = updated;
      }
    }
    let order_id = outcome.order.id.clone();
    events.push(MarketEvent::OrderUpdated(outcome.order.clone()));
    state.orders.insert(order_id.clone(), outcome.order);

    event!(Level::INFO, job_id, proposal_id, order_id = %order_id, rejected = outcome.rejected.len(), "Proposal accepted.");
    Ok((
      MutationReceipt {
        order_id: Some(order_id),
      },
      events,
    ))
  }

  fn reject(&self, job_id: &str, proposal_id: &str, reason: Option<String>) -> EngagementResult<Vec<MarketEvent>> {
    let mut state = self.state.write();
    let proposal = state
      .proposals
      .iter_mut()
      .find(|p| p.id == proposal_id && p.job_id == job_id)
      .ok_or_else(|| EngagementError::not_found("proposal", proposal_id))?;
    let changed = rules::reject(proposal, reason)?;
    if changed {
      Ok(vec![MarketEvent::ProposalUpdated(proposal.clone())])
    } else {
      Ok(Vec::new())
    }
  }
}

#[async_trait]
impl JobRepository for InMemoryStore {
  async fn list_jobs(&self) -> EngagementResult<Vec<Job>> {
    self.enter("list_jobs").await?;
    Ok(self.state.read().jobs.clone())
  }

  async fn get_job(&self, job_id: &str) -> EngagementResult<Job> {
    self.enter("get_job").await?;
    self.job(job_id).ok_or_else(|| EngagementError::not_found("job", job_id))
  }
}

#[async_trait]
impl ProposalRepository for InMemoryStore {
  async fn list_proposals(&self, job_id: &str) -> EngagementResult<Vec<Proposal>> {
    self.enter("list_proposals").await?;
    let state = self.state.read();
    if !state.jobs.iter().any(|j| j.id == job_id) {
      return Err(EngagementError::not_found("job", job_id));
    }
    Ok(state.proposals.iter().filter(|p| p.job_id == job_id).cloned().collect())
  }

  async fn mutate_proposal(
    &self,
    job_id: &str,
    proposal_id: &str,
    mutation: ProposalMutation,
  ) -> EngagementResult<MutationReceipt> {
    self.enter("mutate_proposal").await?;
    match mutation {
      ProposalMutation::Accept => {
        let (receipt, events) = self.accept(job_id, proposal_id)?;
        self.committed(events);
        Ok(receipt)
      }
      ProposalMutation::Reject { reason } => {
        let events = self.reject(job_id, proposal_id, reason)?;
        if !events.is_empty() {
          self.committed(events);
        }
        Ok(MutationReceipt::default())
      }
    }
  }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
  async fn get_order(&self, order_id: &str) -> EngagementResult<Order> {
    self.enter("get_order").await?;
    self
      .state
      .read()
      .orders
      .get(order_id)
      .cloned()
      .ok_or_else(|| EngagementError::not_found("order", order_id))
  }

  async fn mutate_order(&self, order_id: &str, mutation: OrderMutation) -> EngagementResult<MutationReceipt> {
    self.enter("mutate_order").await?;
    let updated = {
      let mut state = self.state.write();
      let current = state
        .orders
        .get(order_id)
        .ok_or_else(|| EngagementError::not_found("order", order_id))?;
      let mut updated = current.clone();
      rules::apply_order_mutation(&mut updated, mutation, Utc::now())?;
      state.orders.insert(updated.id.clone(), updated.clone());
      updated
    };
    event!(Level::DEBUG, order_id, status = ?updated.status, "Order mutated.");
    self.committed(vec![MarketEvent::OrderUpdated(updated)]);
    Ok(MutationReceipt::default())
  }
}
