// engagement/src/events.rs

//! Realtime change feed.
//!
//! The store side publishes a `MarketEvent` for every record it changes.
//! Client projections subscribe and fold events in, independent of whatever
//! transport (socket, webhook, pub/sub) delivered them.

use crate::model::{Job, JobId, Order, Proposal};
use crate::shared::Shared;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{event, Level};

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MarketEvent {
  JobCreated(Job),
  JobUpdated(Job),
  JobDeleted {
    #[serde(rename = "jobId")]
    job_id: JobId,
  },
  ProposalUpdated(Proposal),
  OrderUpdated(Order),
}

/// A state value that can absorb market events.
pub trait Projection: Send + Sync + 'static {
  fn fold(&mut self, event: &MarketEvent);
}

#[derive(Debug, Clone)]
pub struct EventHub {
  sender: broadcast::Sender<MarketEvent>,
}

impl Default for EventHub {
  fn default() -> Self {
    Self::new(DEFAULT_CAPACITY)
  }
}

impl EventHub {
  pub fn new(capacity: usize) -> Self {
    let (sender, _) = broadcast::channel(capacity.max(1));
    Self { sender }
  }

  /// Returns how many subscribers received the event. Zero subscribers is not an error.
  pub fn publish(&self, event: MarketEvent) -> usize {
    self.sender.send(event).unwrap_or(0)
  }

  pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
    self.sender.subscribe()
  }
}

/// Folds every event from `rx` into `target` until the hub is dropped.
/// Returns the number of events applied.
pub async fn follow<P: Projection>(mut rx: broadcast::Receiver<MarketEvent>, target: Shared<P>) -> u64 {
  let mut applied = 0;
  loop {
    match rx.recv().await {
      Ok(market_event) => {
        target.write().fold(&market_event);
        applied += 1;
      }
      Err(RecvError::Lagged(skipped)) => {
        // The projection is now behind the store; callers should re-fetch.
        event!(Level::WARN, skipped, "Projection lagged behind the event hub.");
      }
      Err(RecvError::Closed) => break,
    }
  }
  event!(Level::DEBUG, applied, "Event feed closed.");
  applied
}
