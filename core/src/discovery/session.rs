// engagement/src/discovery/session.rs

//! A discovery screen's state: the open jobs last fetched, the active query
//! and the derived results.

use super::query::Query;
use super::search::search;
use crate::error::EngagementResult;
use crate::events::{MarketEvent, Projection};
use crate::model::Job;
use crate::shared::Shared;
use crate::store::{JobRepository, RequestPolicy};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{event, instrument, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "count", rename_all = "snake_case")]
pub enum SearchOutcome {
  Matches(usize),
  NoMatches,
  /// A newer run or a cancel replaced this one; its result was dropped.
  Superseded,
}

impl SearchOutcome {
  fn from_count(count: usize) -> Self {
    if count == 0 {
      SearchOutcome::NoMatches
    } else {
      SearchOutcome::Matches(count)
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryState {
  pub query: Query,
  /// Open jobs only, in store order.
  pub jobs: Vec<Job>,
  pub results: Vec<Job>,
  pub generation: u64,
  pub outcome: Option<SearchOutcome>,
  pub last_error: Option<String>,
}

impl DiscoveryState {
  fn replace_jobs(&mut self, jobs: Vec<Job>) {
    self.jobs = jobs.into_iter().filter(Job::is_open).collect();
  }

  fn rederive(&mut self) -> SearchOutcome {
    self.results = search(&self.jobs, &self.query);
    let outcome = SearchOutcome::from_count(self.results.len());
    self.outcome = Some(outcome);
    outcome
  }

  fn upsert_job(&mut self, job: &Job) {
    let existing = self.jobs.iter().position(|j| j.id == job.id);
    match (existing, job.is_open()) {
      (Some(idx), true) => self.jobs[idx] = job.clone(),
      (Some(idx), false) => {
        self.jobs.remove(idx);
      }
      (None, true) => self.jobs.push(job.clone()),
      (None, false) => {}
    }
  }
}

impl Projection for DiscoveryState {
  fn fold(&mut self, event: &MarketEvent) {
    match event {
      MarketEvent::JobCreated(job) | MarketEvent::JobUpdated(job) => self.upsert_job(job),
      MarketEvent::JobDeleted { job_id } => self.jobs.retain(|j| &j.id != job_id),
      MarketEvent::ProposalUpdated(_) | MarketEvent::OrderUpdated(_) => return,
    }
    self.rederive();
  }
}

pub struct DiscoverySession<R: JobRepository + 'static> {
  repo: Arc<R>,
  state: Shared<DiscoveryState>,
  current: Arc<AtomicU64>,
  refinements: AtomicU64,
  policy: RequestPolicy,
}

impl<R: JobRepository + 'static> DiscoverySession<R> {
  pub fn new(repo: Arc<R>, policy: RequestPolicy) -> Self {
    Self {
      repo,
      state: Shared::default(),
      current: Arc::new(AtomicU64::new(0)),
      refinements: AtomicU64::new(0),
      policy,
    }
  }

  /// The projection a view renders from. Also the target for `events::follow`.
  pub fn state(&self) -> Shared<DiscoveryState> {
    self.state.clone()
  }

  pub fn results(&self) -> Vec<Job> {
    self.state.read().results.clone()
  }

  fn next_generation(&self) -> u64 {
    self.current.fetch_add(1, Ordering::SeqCst) + 1
  }

  fn is_current(&self, generation: u64) -> bool {
    self.current.load(Ordering::SeqCst) == generation
  }

  /// Fetches the job list and filters it under `query`.
  ///
  /// If another `run` or a `cancel` starts before the fetch returns, the
  /// fetched list is dropped and `Superseded` is returned. A `refine` in the
  /// meantime does not drop it: the jobs are installed and filtered under the
  /// refined query instead of `query`. On error the previous results stay in
  /// place.
  #[instrument(name = "DiscoverySession::run", skip_all, fields(generation = tracing::field::Empty), err(Display))]
  pub async fn run(&self, query: Query) -> EngagementResult<SearchOutcome> {
    let generation = self.next_generation();
    tracing::Span::current().record("generation", generation);
    let refinements_at_start = self.refinements.load(Ordering::SeqCst);

    let fetched = self.policy.read("list_jobs", || self.repo.list_jobs()).await;
    if !self.is_current(generation) {
      event!(Level::DEBUG, "Discarding superseded discovery result.");
      return Ok(SearchOutcome::Superseded);
    }

    match fetched {
      Ok(jobs) => {
        let outcome = self.state.update(|state| {
          state.replace_jobs(jobs);
          if self.refinements.load(Ordering::SeqCst) == refinements_at_start {
            state.query = query;
          } else {
            event!(Level::DEBUG, "Keeping the newer refined query.");
          }
          state.generation = generation;
          state.last_error = None;
          state.rederive()
        });
        event!(Level::INFO, ?outcome, "Discovery run finished.");
        Ok(outcome)
      }
      Err(e) => {
        self.state.update(|state| state.last_error = Some(e.to_string()));
        Err(e)
      }
    }
  }

  /// Re-filters the cached jobs under a new query without a network call.
  ///
  /// An in-flight `run` is left alone; when it lands it re-derives under this query.
  pub fn refine(&self, query: Query) -> SearchOutcome {
    self.state.update(|state| {
      self.refinements.fetch_add(1, Ordering::SeqCst);
      state.query = query;
      state.rederive()
    })
  }

  /// Drops the result of any in-flight `run`.
  pub fn cancel(&self) {
    let generation = self.next_generation();
    event!(Level::DEBUG, generation, "Discovery run cancelled.");
  }

  /// Folds one realtime event into the cached jobs and re-derives the results.
  pub fn apply_event(&self, event: &MarketEvent) {
    self.state.write().fold(event);
  }
}
