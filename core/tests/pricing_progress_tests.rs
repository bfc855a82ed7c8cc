// tests/pricing_progress_tests.rs
mod common;

use chrono::Duration;
use common::*;
use engagement::model::{DeliverableStatus, OrderStatus};
use engagement::progress::{completion_percent, days_remaining};
use engagement::{compute_progress, compute_total, EngagementError, FeeRule, Schedule};

// --- Pricing ---

#[test]
fn test_default_fee_is_five_percent() {
  let price = compute_total(64_000);
  assert_eq!(price.base_price, 64_000);
  assert_eq!(price.service_fee, 3_200);
  assert_eq!(price.total, 67_200);
}

#[test]
fn test_fee_rounds_half_up() {
  // 5 % of 10 = 0.5 → 1; 5 % of 9 = 0.45 → 0.
  assert_eq!(compute_total(10).service_fee, 1);
  assert_eq!(compute_total(9).service_fee, 0);
  assert_eq!(compute_total(0).total, 0);
}

#[test]
fn test_total_is_base_plus_fee_and_fee_is_monotone() {
  let mut previous_fee = 0;
  for base in (0..200_000u64).step_by(997) {
    let price = compute_total(base);
    assert_eq!(price.total, price.base_price + price.service_fee);
    assert!(price.service_fee >= previous_fee, "fee dropped at base {}", base);
    assert_eq!(compute_total(base), price);
    previous_fee = price.service_fee;
  }
}

#[test]
fn test_custom_fee_rule_and_bounds() {
  let rule = FeeRule::new(1_250).unwrap();
  assert_eq!(rule.compute_total(80_000).service_fee, 10_000);
  assert_eq!(FeeRule::new(0).unwrap().compute_total(5_000).total, 5_000);
  assert!(matches!(FeeRule::new(10_001), Err(EngagementError::Validation { .. })));

  let max = FeeRule::new(10_000).unwrap().compute_total(u64::MAX);
  assert_eq!(max.total, u64::MAX);
}

// --- Progress ---

#[test]
fn test_zero_deliverables_is_zero_percent() {
  let order = order("ord-1", OrderStatus::Pending, Vec::new());
  let progress = compute_progress(&order, t0());
  assert_eq!(progress.percent, 0);
  assert_eq!(progress.total, 0);
  assert_eq!(completion_percent(0, 0), 0);
}

#[test]
fn test_one_of_three_completed_and_approved_is_33_percent() {
  let deliverables = vec![
    deliverable("ord-1", 1, DeliverableStatus::Completed, true),
    deliverable("ord-1", 2, DeliverableStatus::InProgress, false),
    deliverable("ord-1", 3, DeliverableStatus::Pending, false),
  ];
  let order = order("ord-1", OrderStatus::InProgress, deliverables);
  let progress = compute_progress(&order, t0());
  assert_eq!(progress.percent, 33);
  assert_eq!(progress.completed, 1);
  assert_eq!(progress.approved, 1);
  assert_eq!(progress.total, 3);
}

#[test]
fn test_percent_rounds_half_up() {
  assert_eq!(completion_percent(2, 3), 67);
  assert_eq!(completion_percent(1, 8), 13); // 12.5
  assert_eq!(completion_percent(3, 3), 100);
}

#[test]
fn test_days_remaining_rounds_up_partial_days() {
  let deadline = days_after_t0(14);
  assert_eq!(days_remaining(deadline, t0()), 14);
  assert_eq!(days_remaining(deadline, t0() + Duration::hours(1)), 14);
  assert_eq!(days_remaining(deadline, deadline), 0);
  assert_eq!(days_remaining(deadline, deadline + Duration::hours(1)), 0);
  assert_eq!(days_remaining(deadline, deadline + Duration::days(2)), -2);
}

#[test]
fn test_schedule_states() {
  let active = order("ord-1", OrderStatus::InProgress, Vec::new());
  assert_eq!(compute_progress(&active, t0()).schedule, Schedule::OnTrack);

  let late = compute_progress(&active, days_after_t0(15));
  assert_eq!(late.schedule, Schedule::Overdue);
  assert_eq!(late.days_remaining, -1);

  let done = order("ord-2", OrderStatus::Completed, Vec::new());
  assert_eq!(compute_progress(&done, days_after_t0(30)).schedule, Schedule::Closed);
  let cancelled = order("ord-3", OrderStatus::Cancelled, Vec::new());
  assert_eq!(compute_progress(&cancelled, t0()).schedule, Schedule::Closed);
}
