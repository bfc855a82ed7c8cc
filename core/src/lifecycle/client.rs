// engagement/src/lifecycle/client.rs

//! `Lifecycle<S>`: the client-facing action functions over a `Marketplace` store.

use super::actions::{build_action_flow, ActionCtx, ActionRequest};
use super::board::Board;
use super::guard::{ActionKey, DispatchGuard};
use crate::config::EngagementConfig;
use crate::error::{EngagementError, EngagementResult};
use crate::flow::{Flow, FlowResult};
use crate::model::{FileRef, Job, Order, OrderId, Role};
use crate::progress::{compute_progress, Progress};
use crate::shared::Shared;
use crate::store::{Marketplace, MutationReceipt, OrderMutation, RequestPolicy};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{event, instrument, Level};

pub struct Lifecycle<S: Marketplace + 'static> {
  store: Arc<S>,
  board: Shared<Board>,
  guard: DispatchGuard,
  policy: RequestPolicy,
  flow: Flow<ActionCtx, EngagementError>,
}

impl<S: Marketplace + 'static> Lifecycle<S> {
  pub fn new(store: Arc<S>, config: &EngagementConfig) -> Self {
    Self::with_policy(store, RequestPolicy::from_config(config))
  }

  pub fn with_policy(store: Arc<S>, policy: RequestPolicy) -> Self {
    let board = Shared::new(Board::default());
    let guard = DispatchGuard::new();
    let flow = build_action_flow(Arc::clone(&store), board.clone(), guard.clone(), policy);
    Self {
      store,
      board,
      guard,
      policy,
      flow,
    }
  }

  /// The projection handed to the presentation layer.
  pub fn board(&self) -> Shared<Board> {
    self.board.clone()
  }

  pub fn guard(&self) -> &DispatchGuard {
    &self.guard
  }

  /// False while the action for `key` is in flight, or forever after a successful Accept.
  pub fn can_dispatch(&self, key: &ActionKey) -> bool {
    self.guard.is_available(key)
  }

  pub fn order(&self, order_id: &str) -> Option<Order> {
    self.board.read().order(order_id).cloned()
  }

  pub fn progress(&self, order_id: &str, now: DateTime<Utc>) -> Option<Progress> {
    self.board.read().order(order_id).map(|order| compute_progress(order, now))
  }

  // --- Reads ---

  #[instrument(name = "Lifecycle::load_job", skip(self), err(Display))]
  pub async fn load_job(&self, job_id: &str) -> EngagementResult<Job> {
    let job = self.policy.read("get_job", || self.store.get_job(job_id)).await?;
    let proposals = self
      .policy
      .read("list_proposals", || self.store.list_proposals(job_id))
      .await?;
    event!(Level::DEBUG, proposals = proposals.len(), "Job loaded.");
    self.board.update(|board| board.replace_job(job.clone(), proposals));
    Ok(job)
  }

  #[instrument(name = "Lifecycle::load_order", skip(self), err(Display))]
  pub async fn load_order(&self, order_id: &str) -> EngagementResult<Order> {
    let order = self.policy.read("get_order", || self.store.get_order(order_id)).await?;
    self.board.update(|board| board.upsert_order(order.clone()));
    Ok(order)
  }

  // --- Proposal decisions ---

  /// Accepts a proposal and returns the id of the order the store created.
  ///
  /// A confirmation without an order id is an error, but the acceptance stands
  /// and its key stays sealed.
  #[instrument(name = "Lifecycle::accept", skip(self), err(Display))]
  pub async fn accept(&self, job_id: &str, proposal_id: &str) -> EngagementResult<OrderId> {
    let receipt = self
      .run(ActionRequest::Accept {
        job_id: job_id.to_string(),
        proposal_id: proposal_id.to_string(),
      })
      .await?;
    receipt
      .order_id
      .ok_or_else(|| EngagementError::from(anyhow::anyhow!("accept for proposal {} was confirmed without an order id", proposal_id)))
  }

  #[instrument(name = "Lifecycle::reject", skip(self), err(Display))]
  pub async fn reject(&self, job_id: &str, proposal_id: &str, reason: Option<String>) -> EngagementResult<()> {
    self
      .run(ActionRequest::Reject {
        job_id: job_id.to_string(),
        proposal_id: proposal_id.to_string(),
        reason,
      })
      .await
      .map(|_| ())
  }

  // --- Order actions ---

  #[instrument(name = "Lifecycle::deliver", skip(self, files), fields(files = files.len()), err(Display))]
  pub async fn deliver(&self, order_id: &str, deliverable_id: &str, files: Vec<FileRef>) -> EngagementResult<()> {
    self
      .order_action(
        order_id,
        OrderMutation::Deliver {
          deliverable_id: deliverable_id.to_string(),
          files,
        },
      )
      .await
  }

  #[instrument(name = "Lifecycle::approve", skip(self), err(Display))]
  pub async fn approve(&self, order_id: &str, deliverable_id: &str) -> EngagementResult<()> {
    self
      .order_action(
        order_id,
        OrderMutation::Approve {
          deliverable_id: deliverable_id.to_string(),
        },
      )
      .await
  }

  #[instrument(name = "Lifecycle::request_revision", skip(self, note), err(Display))]
  pub async fn request_revision(&self, order_id: &str, deliverable_id: &str, note: &str) -> EngagementResult<()> {
    self
      .order_action(
        order_id,
        OrderMutation::RequestRevision {
          deliverable_id: deliverable_id.to_string(),
          note: note.to_string(),
        },
      )
      .await
  }

  #[instrument(name = "Lifecycle::submit_review", skip(self, text), err(Display))]
  pub async fn submit_review(&self, order_id: &str, author_role: Role, rating: u8, text: &str) -> EngagementResult<()> {
    self
      .order_action(
        order_id,
        OrderMutation::SubmitReview {
          author_role,
          rating,
          text: text.to_string(),
        },
      )
      .await
  }

  #[instrument(name = "Lifecycle::cancel", skip(self), err(Display))]
  pub async fn cancel(&self, order_id: &str, actor: Role, reason: Option<String>) -> EngagementResult<()> {
    self.order_action(order_id, OrderMutation::Cancel { actor, reason }).await
  }

  async fn order_action(&self, order_id: &str, mutation: OrderMutation) -> EngagementResult<()> {
    self
      .run(ActionRequest::Order {
        order_id: order_id.to_string(),
        mutation,
      })
      .await
      .map(|_| ())
  }

  /// Runs one action through the flow. On failure the board keeps its
  /// previous records and only `last_failure` changes.
  async fn run(&self, request: ActionRequest) -> EngagementResult<MutationReceipt> {
    let kind = request.kind();
    let key = request.key();
    let ctx = Shared::new(ActionCtx::new(request));

    match self.flow.run(ctx.clone()).await {
      Ok(FlowResult::Completed) | Ok(FlowResult::Stopped) => {
        let receipt = ctx.write().receipt.take().unwrap_or_default();
        Ok(receipt)
      }
      Err(e) => {
        // Dropping `ctx` below drops any unsettled ticket and re-enables the action.
        let sealed = self.guard.is_sealed(&key);
        self.board.update(|board| board.record_failure(kind, &key, &e, sealed));
        Err(e)
      }
    }
  }
}
