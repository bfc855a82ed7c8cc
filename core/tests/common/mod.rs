// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset

use chrono::{DateTime, Duration, TimeZone, Utc};
use engagement::model::{
  Budget, BudgetKind, Deliverable, DeliverableStatus, Job, JobStatus, MilestonePlan, Order, OrderStatus, Proposal,
  ProposalStatus,
};
use engagement::store::{InMemoryStore, RequestPolicy};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::Level;

// --- Tracing ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Fixed clock ---
pub fn t0() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

pub fn days_after_t0(days: i64) -> DateTime<Utc> {
  t0() + Duration::days(days)
}

// --- Job fixtures ---
pub fn job(id: &str, title: &str) -> Job {
  Job {
    id: id.to_string(),
    client_id: "client-1".to_string(),
    title: title.to_string(),
    description: format!("Description for {}", title),
    category: "web-development".to_string(),
    skills: vec!["rust".to_string()],
    job_type: None,
    budget: Some(Budget::fixed(1_000, 2_000)),
    duration: "1-3 months".to_string(),
    posted_at: t0(),
    proposal_count: 0,
    status: JobStatus::Open,
  }
}

pub fn job_with_budget(id: &str, budget: Option<Budget>) -> Job {
  Job {
    budget,
    ..job(id, &format!("Job {}", id))
  }
}

/// A small, varied catalog used by the discovery tests.
pub fn catalog() -> Vec<Job> {
  vec![
    Job {
      title: "Rust backend for payments".to_string(),
      description: "Build an async settlement service".to_string(),
      skills: vec!["Rust".to_string(), "Tokio".to_string()],
      category: "web-development".to_string(),
      job_type: Some(BudgetKind::Fixed),
      budget: Some(Budget::fixed(40_000, 60_000)),
      duration: "1-3 months".to_string(),
      posted_at: days_after_t0(-3),
      proposal_count: 7,
      ..job("job-1", "")
    },
    Job {
      title: "Logo refresh".to_string(),
      description: "A modern mark for a coffee brand".to_string(),
      skills: vec!["Illustrator".to_string()],
      category: "design".to_string(),
      job_type: None,
      budget: Some(Budget::fixed(20_000, 30_000)),
      duration: "Less than a week".to_string(),
      posted_at: days_after_t0(-1),
      proposal_count: 2,
      ..job("job-2", "")
    },
    Job {
      title: "Data pipeline maintenance".to_string(),
      description: "Keep our ETL jobs healthy, written in rust and python".to_string(),
      skills: vec!["Python".to_string(), "Airflow".to_string()],
      category: "data".to_string(),
      job_type: None,
      budget: Some(Budget::hourly(1_500, 2_500)),
      duration: "Ongoing".to_string(),
      posted_at: days_after_t0(-2),
      proposal_count: 0,
      ..job("job-3", "")
    },
    Job {
      title: "Mobile app MVP".to_string(),
      description: "Cross-platform prototype".to_string(),
      skills: vec!["Flutter".to_string()],
      category: "mobile".to_string(),
      job_type: Some(BudgetKind::Fixed),
      budget: Some(Budget::fixed(300_000, 600_000)),
      duration: "3-6 months".to_string(),
      posted_at: days_after_t0(-5),
      proposal_count: 12,
      ..job("job-4", "")
    },
    Job {
      title: "Copy review".to_string(),
      description: "Proofread a landing page".to_string(),
      skills: vec!["Writing".to_string()],
      category: "writing".to_string(),
      job_type: None,
      budget: None,
      duration: "2-3 months".to_string(),
      posted_at: days_after_t0(-4),
      proposal_count: 1,
      ..job("job-5", "")
    },
  ]
}

// --- Proposal fixtures ---
pub fn proposal(id: &str, job_id: &str, freelancer_id: &str, bid_amount: u64) -> Proposal {
  Proposal {
    id: id.to_string(),
    job_id: job_id.to_string(),
    freelancer_id: freelancer_id.to_string(),
    bid_amount,
    delivery_time_days: 14,
    cover_letter: format!("{} can do this", freelancer_id),
    submitted_at: t0(),
    status: ProposalStatus::Pending,
    rejection_reason: None,
    milestones: Vec::new(),
  }
}

pub fn proposal_with_milestones(id: &str, job_id: &str, names: &[&str]) -> Proposal {
  Proposal {
    milestones: names
      .iter()
      .map(|name| MilestonePlan {
        name: (*name).to_string(),
        description: format!("{} milestone", name),
      })
      .collect(),
    ..proposal(id, job_id, "fl-milestones", 90_000)
  }
}

// --- Order fixtures ---
pub fn deliverable(order_id: &str, seq: usize, status: DeliverableStatus, approved: bool) -> Deliverable {
  Deliverable {
    id: format!("{}-d{}", order_id, seq),
    order_id: order_id.to_string(),
    name: format!("Deliverable {}", seq),
    description: String::new(),
    status,
    delivered_at: (status == DeliverableStatus::Completed).then(t0),
    approved_at: approved.then(t0),
    files: Vec::new(),
    revision_count: 0,
  }
}

pub fn order(id: &str, status: OrderStatus, deliverables: Vec<Deliverable>) -> Order {
  Order {
    id: id.to_string(),
    job_id: "job-x".to_string(),
    proposal_id: "prop-x".to_string(),
    freelancer_id: "fl-1".to_string(),
    client_id: "client-1".to_string(),
    base_price: 100_000,
    service_fee: 5_000,
    total: 105_000,
    created_at: t0(),
    deadline: days_after_t0(14),
    status,
    deliverables,
    timeline: Vec::new(),
    reviews: Vec::new(),
  }
}

// --- Seeded store ---

/// One open job ("job-1") with three pending proposals from different freelancers.
pub fn seeded_store() -> Arc<InMemoryStore> {
  let store = InMemoryStore::new();
  store.insert_job(job("job-1", "Rust backend for payments"));
  for (id, freelancer, bid) in [("prop-a", "fl-a", 50_000), ("prop-b", "fl-b", 64_000), ("prop-c", "fl-c", 71_000)] {
    store
      .insert_proposal(proposal(id, "job-1", freelancer, bid))
      .expect("seed proposal");
  }
  Arc::new(store)
}

/// Short timeouts and backoff so failure tests stay fast.
pub fn fast_policy() -> RequestPolicy {
  RequestPolicy {
    timeout: std::time::Duration::from_millis(200),
    read_retries: 2,
    backoff: std::time::Duration::from_millis(1),
  }
}
