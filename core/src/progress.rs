// engagement/src/progress.rs

//! Derived completion figures for an order. Nothing here is cached: every call
//! recomputes from the deliverables and the deadline it is handed.

use crate::model::{Order, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
  OnTrack,
  Overdue,
  /// Completed or cancelled; the deadline no longer applies.
  Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
  pub percent: u8,
  pub completed: usize,
  pub approved: usize,
  pub total: usize,
  pub days_remaining: i64,
  pub schedule: Schedule,
}

/// Share of completed deliverables, rounded half-up. Zero deliverables is 0 %.
pub fn completion_percent(completed: usize, total: usize) -> u8 {
  if total == 0 {
    return 0;
  }
  let completed = completed.min(total);
  ((completed * 100 + total / 2) / total) as u8
}

/// `ceil((deadline - now) / 1 day)`; negative once the deadline has passed by a full day.
pub fn days_remaining(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
  let secs = (deadline - now).num_seconds();
  let days = secs.div_euclid(SECONDS_PER_DAY);
  if secs.rem_euclid(SECONDS_PER_DAY) != 0 {
    days + 1
  } else {
    days
  }
}

pub fn compute_progress(order: &Order, now: DateTime<Utc>) -> Progress {
  let total = order.deliverables.len();
  let completed = order.deliverables.iter().filter(|d| d.is_completed()).count();
  let approved = order.deliverables.iter().filter(|d| d.is_approved()).count();
  let days_remaining = days_remaining(order.deadline, now);

  let schedule = match order.status {
    OrderStatus::Completed | OrderStatus::Cancelled => Schedule::Closed,
    _ if now > order.deadline => Schedule::Overdue,
    _ => Schedule::OnTrack,
  };

  Progress {
    percent: completion_percent(completed, total),
    completed,
    approved,
    total,
    days_remaining,
    schedule,
  }
}
