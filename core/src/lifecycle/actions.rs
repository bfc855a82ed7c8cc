// engagement/src/lifecycle/actions.rs

//! The action flow every lifecycle mutation runs through:
//!
//! 1. `validate` – local input checks, before anything is sent.
//! 2. `claim_dispatch_slot` – the in-flight guard for the action's key.
//! 3. `dispatch` – one bounded, never retried store mutation.
//! 4. `reconcile_job` – re-read the job and its proposals (Accept/Reject).
//! 5. `reconcile_order` – re-read the order (Accept and order actions).
//! 6. `record_outcome` – settle the guard and clear the recorded failure.
//!
//! The board is only written by the reconcile steps, which run after the
//! store confirmed the mutation.

use super::board::{ActionKind, Board};
use super::guard::{ActionKey, DispatchGuard, DispatchTicket};
use super::rules;
use crate::error::{EngagementError, EngagementResult};
use crate::flow::{Flow, FlowControl, SkipCondition};
use crate::model::{JobId, ProposalId};
use crate::shared::Shared;
use crate::store::{Marketplace, MutationReceipt, OrderMutation, ProposalMutation, RequestPolicy};
use std::sync::Arc;
use tracing::{event, Level};

pub const ACTION_FLOW: &str = "engagement_action";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
  Accept {
    job_id: JobId,
    proposal_id: ProposalId,
  },
  Reject {
    job_id: JobId,
    proposal_id: ProposalId,
    reason: Option<String>,
  },
  Order {
    order_id: String,
    mutation: OrderMutation,
  },
}

impl ActionRequest {
  pub fn kind(&self) -> ActionKind {
    match self {
      ActionRequest::Accept { .. } => ActionKind::Accept,
      ActionRequest::Reject { .. } => ActionKind::Reject,
      ActionRequest::Order { mutation, .. } => match mutation {
        OrderMutation::Deliver { .. } => ActionKind::Deliver,
        OrderMutation::Approve { .. } => ActionKind::Approve,
        OrderMutation::RequestRevision { .. } => ActionKind::RequestRevision,
        OrderMutation::SubmitReview { .. } => ActionKind::SubmitReview,
        OrderMutation::Cancel { .. } => ActionKind::Cancel,
      },
    }
  }

  pub fn key(&self) -> ActionKey {
    match self {
      ActionRequest::Accept { job_id, proposal_id } | ActionRequest::Reject { job_id, proposal_id, .. } => {
        ActionKey::proposal(job_id.as_str(), proposal_id.as_str())
      }
      ActionRequest::Order { order_id, .. } => ActionKey::order(order_id.as_str()),
    }
  }

  fn job_id(&self) -> Option<&str> {
    match self {
      ActionRequest::Accept { job_id, .. } | ActionRequest::Reject { job_id, .. } => Some(job_id),
      ActionRequest::Order { .. } => None,
    }
  }
}

/// Per-run flow context.
#[derive(Debug)]
pub struct ActionCtx {
  pub request: ActionRequest,
  pub ticket: Option<DispatchTicket>,
  pub receipt: Option<MutationReceipt>,
}

impl ActionCtx {
  pub fn new(request: ActionRequest) -> Self {
    Self {
      request,
      ticket: None,
      receipt: None,
    }
  }

  /// The order the reconcile step should re-read, if any.
  fn order_to_reconcile(&self) -> Option<String> {
    match &self.request {
      ActionRequest::Order { order_id, .. } => Some(order_id.clone()),
      ActionRequest::Accept { .. } => self.receipt.as_ref().and_then(|r| r.order_id.clone()),
      ActionRequest::Reject { .. } => None,
    }
  }
}

struct StepDeps<S: Marketplace + 'static> {
  store: Arc<S>,
  board: Shared<Board>,
  guard: DispatchGuard,
  policy: RequestPolicy,
}

// Manual impl: a derive would require `S: Clone`.
impl<S: Marketplace + 'static> Clone for StepDeps<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      board: self.board.clone(),
      guard: self.guard.clone(),
      policy: self.policy,
    }
  }
}

pub(crate) fn build_action_flow<S: Marketplace + 'static>(
  store: Arc<S>,
  board: Shared<Board>,
  guard: DispatchGuard,
  policy: RequestPolicy,
) -> Flow<ActionCtx, EngagementError> {
  let not_proposal_scoped: SkipCondition<ActionCtx> = Arc::new(|ctx: &ActionCtx| ctx.request.job_id().is_none());
  let no_order_to_reconcile: SkipCondition<ActionCtx> =
    Arc::new(|ctx: &ActionCtx| ctx.order_to_reconcile().is_none());

  let mut flow = Flow::<ActionCtx, EngagementError>::new(
    ACTION_FLOW,
    &[
      ("validate", false, None),
      ("claim_dispatch_slot", false, None),
      ("dispatch", false, None),
      ("reconcile_job", false, Some(not_proposal_scoped)),
      ("reconcile_order", false, Some(no_order_to_reconcile)),
      ("record_outcome", false, None),
    ],
  );

  let deps = StepDeps {
    store,
    board,
    guard,
    policy,
  };

  flow.on("validate", validate_step);

  let d = deps.clone();
  flow.on("claim_dispatch_slot", move |ctx| claim_step(ctx, d.guard.clone()));

  let d = deps.clone();
  flow.on("dispatch", move |ctx| dispatch_step(ctx, d.clone()));

  let d = deps.clone();
  flow.on("reconcile_job", move |ctx| reconcile_job_step(ctx, d.clone()));

  let d = deps.clone();
  flow.on("reconcile_order", move |ctx| reconcile_order_step(ctx, d.clone()));

  let d = deps;
  flow.on("record_outcome", move |ctx| record_outcome_step(ctx, d.board.clone()));

  flow
}

async fn validate_step(ctx: Shared<ActionCtx>) -> EngagementResult<FlowControl> {
  let request = ctx.read().request.clone();
  match &request {
    ActionRequest::Accept { job_id, proposal_id } | ActionRequest::Reject { job_id, proposal_id, .. } => {
      rules::validate_id("jobId", job_id)?;
      rules::validate_id("proposalId", proposal_id)?;
    }
    ActionRequest::Order { order_id, mutation } => {
      rules::validate_id("orderId", order_id)?;
      rules::validate_order_mutation(mutation)?;
    }
  }
  Ok(FlowControl::Continue)
}

async fn claim_step(ctx: Shared<ActionCtx>, guard: DispatchGuard) -> EngagementResult<FlowControl> {
  let key = ctx.read().request.key();
  let ticket = guard.try_claim(key)?;
  ctx.write().ticket = Some(ticket);
  Ok(FlowControl::Continue)
}

async fn dispatch_step<S: Marketplace + 'static>(ctx: Shared<ActionCtx>, deps: StepDeps<S>) -> EngagementResult<FlowControl> {
  let request = ctx.read().request.clone();
  let kind = request.kind();

  let receipt = match request {
    ActionRequest::Accept { job_id, proposal_id } => {
      let receipt = deps
        .policy
        .bounded(
          "accept_proposal",
          deps.store.mutate_proposal(&job_id, &proposal_id, ProposalMutation::Accept),
        )
        .await?;
      // An order now exists. Seal before anything else can fail so the
      // action is never offered again.
      let ticket = ctx.write().ticket.take();
      if let Some(ticket) = ticket {
        ticket.seal();
      }
      receipt
    }
    ActionRequest::Reject {
      job_id,
      proposal_id,
      reason,
    } => {
      deps
        .policy
        .bounded(
          "reject_proposal",
          deps.store.mutate_proposal(&job_id, &proposal_id, ProposalMutation::Reject { reason }),
        )
        .await?
    }
    ActionRequest::Order { order_id, mutation } => {
      deps
        .policy
        .bounded("mutate_order", deps.store.mutate_order(&order_id, mutation))
        .await?
    }
  };

  event!(Level::INFO, action = ?kind, order_id = ?receipt.order_id, "Store confirmed mutation.");
  ctx.write().receipt = Some(receipt);
  Ok(FlowControl::Continue)
}

async fn reconcile_job_step<S: Marketplace + 'static>(
  ctx: Shared<ActionCtx>,
  deps: StepDeps<S>,
) -> EngagementResult<FlowControl> {
  let job_id = ctx.read().request.job_id().map(str::to_string);
  let Some(job_id) = job_id else {
    return Ok(FlowControl::Continue);
  };

  let fresh = async {
    let job = deps.policy.read("get_job", || deps.store.get_job(&job_id)).await?;
    let proposals = deps
      .policy
      .read("list_proposals", || deps.store.list_proposals(&job_id))
      .await?;
    Ok::<_, EngagementError>((job, proposals))
  }
  .await;

  match fresh {
    Ok((job, proposals)) => deps.board.update(|board| board.replace_job(job, proposals)),
    Err(e) => {
      // The mutation already happened; drop the stale copy instead of failing the action.
      event!(Level::WARN, job_id = %job_id, error = %e, "Re-read after mutation failed; invalidating job.");
      deps.board.update(|board| board.invalidate_job(&job_id));
    }
  }
  Ok(FlowControl::Continue)
}

async fn reconcile_order_step<S: Marketplace + 'static>(
  ctx: Shared<ActionCtx>,
  deps: StepDeps<S>,
) -> EngagementResult<FlowControl> {
  let order_id = ctx.read().order_to_reconcile();
  let Some(order_id) = order_id else {
    return Ok(FlowControl::Continue);
  };

  match deps.policy.read("get_order", || deps.store.get_order(&order_id)).await {
    Ok(order) => deps.board.update(|board| board.upsert_order(order)),
    Err(e) => {
      event!(Level::WARN, order_id = %order_id, error = %e, "Re-read after mutation failed; invalidating order.");
      deps.board.update(|board| board.invalidate_order(&order_id));
    }
  }
  Ok(FlowControl::Continue)
}

async fn record_outcome_step(ctx: Shared<ActionCtx>, board: Shared<Board>) -> EngagementResult<FlowControl> {
  let (key, ticket) = {
    let mut guard = ctx.write();
    (guard.request.key(), guard.ticket.take())
  };
  if let Some(ticket) = ticket {
    ticket.release();
  }
  board.update(|b| b.clear_failure(&key));
  Ok(FlowControl::Continue)
}
