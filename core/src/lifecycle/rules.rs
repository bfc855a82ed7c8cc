// engagement/src/lifecycle/rules.rs

//! Transition rules of the engagement state machine.
//!
//! These are pure functions over owned records. The authoritative store
//! applies them; the client applies the validation half before dispatching.

use crate::error::{EngagementError, EngagementResult};
use crate::model::{
  Deliverable, DeliverableStatus, FileRef, Job, JobStatus, Order, OrderId, OrderStatus, Proposal, ProposalId,
  ProposalStatus, Review, Role, TimelineEvent, TimelineKind,
};
use crate::pricing::FeeRule;
use crate::store::OrderMutation;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
pub const DEFAULT_DELIVERABLE_NAME: &str = "Final delivery";
const SIBLING_REJECTION_REASON: &str = "Another proposal was accepted for this job";

#[derive(Debug, Clone, PartialEq)]
pub struct AcceptOutcome {
  pub order: Order,
  /// Siblings forced from Pending to Rejected by this acceptance.
  pub rejected: Vec<ProposalId>,
}

// --- Validation ---

pub fn validate_id(field: &str, value: &str) -> EngagementResult<()> {
  if value.trim().is_empty() {
    return Err(EngagementError::validation(field, "must not be empty"));
  }
  Ok(())
}

pub fn validate_rating(rating: u8) -> EngagementResult<()> {
  if !(MIN_RATING..=MAX_RATING).contains(&rating) {
    return Err(EngagementError::validation(
      "rating",
      format!("must be between {} and {}, got {}", MIN_RATING, MAX_RATING, rating),
    ));
  }
  Ok(())
}

fn validate_text(field: &str, text: &str) -> EngagementResult<()> {
  if text.trim().is_empty() {
    return Err(EngagementError::validation(field, "must not be blank"));
  }
  Ok(())
}

pub fn validate_files(files: &[FileRef]) -> EngagementResult<()> {
  for file in files {
    validate_text("files.name", &file.name)?;
    validate_text("files.url", &file.url)?;
  }
  Ok(())
}

/// Input checks that need no record state. Runs before any request is sent.
pub fn validate_order_mutation(mutation: &OrderMutation) -> EngagementResult<()> {
  match mutation {
    OrderMutation::Deliver { deliverable_id, files } => {
      validate_id("deliverableId", deliverable_id)?;
      validate_files(files)
    }
    OrderMutation::Approve { deliverable_id } => validate_id("deliverableId", deliverable_id),
    OrderMutation::RequestRevision { deliverable_id, note } => {
      validate_id("deliverableId", deliverable_id)?;
      validate_text("note", note)
    }
    OrderMutation::SubmitReview { rating, text, .. } => {
      validate_rating(*rating)?;
      validate_text("text", text)
    }
    OrderMutation::Cancel { .. } => Ok(()),
  }
}

// --- Proposal transitions ---

/// Accepts `proposal_id` on `job`, rejects its pending siblings, closes the
/// job and builds the order. Only proposals whose `job_id` matches are touched.
pub fn accept(
  job: &mut Job,
  proposals: &mut [Proposal],
  proposal_id: &str,
  fee_rule: &FeeRule,
  order_id: OrderId,
  now: DateTime<Utc>,
) -> EngagementResult<AcceptOutcome> {
  if job.status == JobStatus::Closed {
    return Err(EngagementError::conflict(format!(
      "job {} is closed; no further proposals can be accepted",
      job.id
    )));
  }

  let target_idx = proposals
    .iter()
    .position(|p| p.id == proposal_id && p.job_id == job.id)
    .ok_or_else(|| EngagementError::not_found("proposal", proposal_id))?;

  if proposals[target_idx].status != ProposalStatus::Pending {
    return Err(EngagementError::conflict(format!(
      "proposal {} is {:?}, only pending proposals can be accepted",
      proposal_id, proposals[target_idx].status
    )));
  }

  let mut rejected = Vec::new();
  for (idx, proposal) in proposals.iter_mut().enumerate() {
    if proposal.job_id != job.id {
      continue;
    }
    if idx == target_idx {
      proposal.status = ProposalStatus::Accepted;
    } else if proposal.status == ProposalStatus::Pending {
      proposal.status = ProposalStatus::Rejected;
      proposal.rejection_reason = Some(SIBLING_REJECTION_REASON.to_string());
      rejected.push(proposal.id.clone());
    }
  }
  job.status = JobStatus::Closed;

  let order = build_order(job, &proposals[target_idx], fee_rule, order_id, now);
  Ok(AcceptOutcome { order, rejected })
}

/// Rejects a pending proposal. Returns `false` when it was already rejected.
pub fn reject(proposal: &mut Proposal, reason: Option<String>) -> EngagementResult<bool> {
  match proposal.status {
    ProposalStatus::Rejected => Ok(false),
    ProposalStatus::Accepted => Err(EngagementError::conflict(format!(
      "proposal {} is already accepted",
      proposal.id
    ))),
    ProposalStatus::Pending => {
      proposal.status = ProposalStatus::Rejected;
      proposal.rejection_reason = reason;
      Ok(true)
    }
  }
}

pub fn build_order(job: &Job, proposal: &Proposal, fee_rule: &FeeRule, order_id: OrderId, now: DateTime<Utc>) -> Order {
  let price = fee_rule.compute_total(proposal.bid_amount);

  let deliverables = if proposal.milestones.is_empty() {
    vec![new_deliverable(&order_id, 1, DEFAULT_DELIVERABLE_NAME, &job.title)]
  } else {
    proposal
      .milestones
      .iter()
      .enumerate()
      .map(|(idx, m)| new_deliverable(&order_id, idx + 1, &m.name, &m.description))
      .collect()
  };

  let mut order = Order {
    id: order_id,
    job_id: job.id.clone(),
    proposal_id: proposal.id.clone(),
    freelancer_id: proposal.freelancer_id.clone(),
    client_id: job.client_id.clone(),
    base_price: price.base_price,
    service_fee: price.service_fee,
    total: price.total,
    created_at: now,
    deadline: now + Duration::days(i64::from(proposal.delivery_time_days)),
    status: OrderStatus::Pending,
    deliverables,
    timeline: Vec::new(),
    reviews: Vec::new(),
  };
  let description = format!("Proposal {} accepted for \"{}\"", proposal.id, job.title);
  append_event(&mut order, TimelineKind::OrderCreated, "Order created", description, Role::Client, now);
  order
}

fn new_deliverable(order_id: &str, seq: usize, name: &str, description: &str) -> Deliverable {
  Deliverable {
    id: format!("{}-d{}", order_id, seq),
    order_id: order_id.to_string(),
    name: name.to_string(),
    description: description.to_string(),
    status: DeliverableStatus::Pending,
    delivered_at: None,
    approved_at: None,
    files: Vec::new(),
    revision_count: 0,
  }
}

// --- Order transitions ---

pub fn apply_order_mutation(order: &mut Order, mutation: OrderMutation, now: DateTime<Utc>) -> EngagementResult<()> {
  validate_order_mutation(&mutation)?;
  match mutation {
    OrderMutation::Deliver { deliverable_id, files } => deliver(order, &deliverable_id, files, now),
    OrderMutation::Approve { deliverable_id } => approve(order, &deliverable_id, now).map(|_| ()),
    OrderMutation::RequestRevision { deliverable_id, note } => request_revision(order, &deliverable_id, &note, now),
    OrderMutation::SubmitReview {
      author_role,
      rating,
      text,
    } => submit_review(order, author_role, rating, &text, now),
    OrderMutation::Cancel { actor, reason } => cancel(order, actor, reason, now),
  }
}

pub fn deliver(order: &mut Order, deliverable_id: &str, files: Vec<FileRef>, now: DateTime<Utc>) -> EngagementResult<()> {
  if !matches!(order.status, OrderStatus::Pending | OrderStatus::InProgress) {
    return Err(EngagementError::conflict(format!(
      "order {} is {:?}; work can only be delivered while pending or in progress",
      order.id, order.status
    )));
  }

  let name = {
    let deliverable = order
      .deliverable_mut(deliverable_id)
      .ok_or_else(|| EngagementError::not_found("deliverable", deliverable_id))?;
    if deliverable.is_completed() {
      return Err(EngagementError::conflict(format!(
        "deliverable {} is already completed",
        deliverable_id
      )));
    }
    deliverable.status = DeliverableStatus::Completed;
    deliverable.delivered_at = Some(now);
    deliverable.approved_at = None;
    deliverable.files = files;
    deliverable.name.clone()
  };

  if order.status == OrderStatus::Pending {
    order.status = OrderStatus::InProgress;
  }
  append_event(
    order,
    TimelineKind::DeliverableSubmitted,
    "Deliverable submitted",
    format!("\"{}\" was delivered", name),
    Role::Freelancer,
    now,
  );

  if order.deliverables.iter().all(Deliverable::is_completed) {
    order.status = OrderStatus::Delivered;
    append_event(
      order,
      TimelineKind::OrderDelivered,
      "All work delivered",
      "Every deliverable has been submitted",
      Role::Freelancer,
      now,
    );
  }
  Ok(())
}

/// Approves a completed deliverable. Re-approving is a no-op and returns `false`.
pub fn approve(order: &mut Order, deliverable_id: &str, now: DateTime<Utc>) -> EngagementResult<bool> {
  let deliverable = order
    .deliverable(deliverable_id)
    .ok_or_else(|| EngagementError::not_found("deliverable", deliverable_id))?;
  if deliverable.is_approved() {
    return Ok(false);
  }
  if !deliverable.is_completed() {
    return Err(EngagementError::conflict(format!(
      "deliverable {} has not been delivered",
      deliverable_id
    )));
  }
  if !matches!(order.status, OrderStatus::InProgress | OrderStatus::Delivered) {
    return Err(EngagementError::conflict(format!(
      "order {} is {:?}; deliverables cannot be approved",
      order.id, order.status
    )));
  }

  let name = deliverable.name.clone();
  if let Some(deliverable) = order.deliverable_mut(deliverable_id) {
    deliverable.approved_at = Some(now);
  }
  append_event(
    order,
    TimelineKind::DeliverableApproved,
    "Deliverable approved",
    format!("\"{}\" was approved", name),
    Role::Client,
    now,
  );

  if order.deliverables.iter().all(Deliverable::is_approved) {
    order.status = OrderStatus::Completed;
    append_event(
      order,
      TimelineKind::OrderCompleted,
      "Order completed",
      "All deliverables approved",
      Role::Client,
      now,
    );
  }
  Ok(true)
}

/// Sends a delivered item back to work. The order never drops below InProgress.
pub fn request_revision(order: &mut Order, deliverable_id: &str, note: &str, now: DateTime<Utc>) -> EngagementResult<()> {
  validate_text("note", note)?;
  if !matches!(order.status, OrderStatus::InProgress | OrderStatus::Delivered) {
    return Err(EngagementError::conflict(format!(
      "order {} is {:?}; revisions cannot be requested",
      order.id, order.status
    )));
  }

  let name = {
    let deliverable = order
      .deliverable_mut(deliverable_id)
      .ok_or_else(|| EngagementError::not_found("deliverable", deliverable_id))?;
    if !deliverable.is_completed() {
      return Err(EngagementError::conflict(format!(
        "deliverable {} has not been delivered",
        deliverable_id
      )));
    }
    if deliverable.approved_at.is_some() {
      return Err(EngagementError::conflict(format!(
        "deliverable {} is already approved",
        deliverable_id
      )));
    }
    deliverable.status = DeliverableStatus::InProgress;
    deliverable.revision_count += 1;
    deliverable.name.clone()
  };

  if order.status == OrderStatus::Delivered {
    order.status = OrderStatus::InProgress;
  }
  append_event(
    order,
    TimelineKind::RevisionRequested,
    format!("Revision requested: {}", name),
    note.trim(),
    Role::Client,
    now,
  );
  Ok(())
}

pub fn submit_review(order: &mut Order, author_role: Role, rating: u8, text: &str, now: DateTime<Utc>) -> EngagementResult<()> {
  validate_rating(rating)?;
  validate_text("text", text)?;
  if order.status != OrderStatus::Completed {
    return Err(EngagementError::conflict(format!(
      "order {} is {:?}; reviews open once it is completed",
      order.id, order.status
    )));
  }
  if order.review_by(author_role).is_some() {
    return Err(EngagementError::conflict(format!(
      "a {} review already exists for order {}",
      author_role, order.id
    )));
  }

  order.reviews.push(Review {
    order_id: order.id.clone(),
    author_role,
    rating,
    text: text.trim().to_string(),
    created_at: now,
  });
  append_event(
    order,
    TimelineKind::ReviewSubmitted,
    "Review submitted",
    format!("{} rated {}/{}", author_role, rating, MAX_RATING),
    author_role,
    now,
  );
  Ok(())
}

pub fn cancel(order: &mut Order, actor: Role, reason: Option<String>, now: DateTime<Utc>) -> EngagementResult<()> {
  if order.status.is_terminal() {
    return Err(EngagementError::conflict(format!(
      "order {} is already {:?}",
      order.id, order.status
    )));
  }
  order.status = OrderStatus::Cancelled;
  append_event(
    order,
    TimelineKind::OrderCancelled,
    "Order cancelled",
    reason.unwrap_or_default(),
    actor,
    now,
  );
  Ok(())
}

fn append_event(
  order: &mut Order,
  kind: TimelineKind,
  title: impl Into<String>,
  description: impl Into<String>,
  actor: Role,
  now: DateTime<Utc>,
) {
  order.timeline.push(TimelineEvent {
    id: Uuid::new_v4().to_string(),
    order_id: order.id.clone(),
    kind,
    title: title.into(),
    description: description.into(),
    timestamp: now,
    actor,
  });
}
