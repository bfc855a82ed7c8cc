// demos/marketplace_app/src/seed.rs

use chrono::{Duration, Utc};
use engagement::model::{Budget, BudgetKind, Job, JobStatus, MilestonePlan, Proposal, ProposalStatus};
use engagement::store::InMemoryStore;
use engagement::EngagementResult;

pub const FEATURED_JOB: &str = "job-ledger";

struct JobSeed {
  id: &'static str,
  title: &'static str,
  category: &'static str,
  skills: &'static [&'static str],
  job_type: Option<BudgetKind>,
  budget: Option<Budget>,
  duration: &'static str,
  age_days: i64,
}

fn job_seeds() -> Vec<JobSeed> {
  vec![
    JobSeed {
      id: FEATURED_JOB,
      title: "Double-entry ledger service in Rust",
      category: "web-development",
      skills: &["Rust", "PostgreSQL", "Axum"],
      job_type: Some(BudgetKind::Fixed),
      budget: Some(Budget::fixed(60_000, 90_000)),
      duration: "1-3 months",
      age_days: 1,
    },
    JobSeed {
      id: "job-brand",
      title: "Brand identity for a bakery",
      category: "design",
      skills: &["Illustrator", "Branding"],
      job_type: None,
      budget: Some(Budget::fixed(15_000, 30_000)),
      duration: "Less than a week",
      age_days: 2,
    },
    JobSeed {
      id: "job-etl",
      title: "Maintain ETL jobs",
      category: "data",
      skills: &["Python", "Rust"],
      job_type: None,
      budget: Some(Budget::hourly(1_800, 2_400)),
      duration: "Ongoing",
      age_days: 4,
    },
    JobSeed {
      id: "job-docs",
      title: "API documentation review",
      category: "writing",
      skills: &["Technical writing"],
      job_type: None,
      budget: None,
      duration: "2-3 months",
      age_days: 6,
    },
  ]
}

/// Fills `store` with a few jobs and three competing proposals on the featured one.
pub fn populate(store: &InMemoryStore) -> EngagementResult<()> {
  let now = Utc::now();
  for seed in job_seeds() {
    store.insert_job(Job {
      id: seed.id.to_string(),
      client_id: "client-acme".to_string(),
      title: seed.title.to_string(),
      description: format!("{} for a growing team.", seed.title),
      category: seed.category.to_string(),
      skills: seed.skills.iter().map(|s| s.to_string()).collect(),
      job_type: seed.job_type,
      budget: seed.budget,
      duration: seed.duration.to_string(),
      posted_at: now - Duration::days(seed.age_days),
      proposal_count: 0,
      status: JobStatus::Open,
    });
  }

  let bids: [(&str, &str, u64, u32, &[&str]); 3] = [
    ("prop-ana", "fl-ana", 72_000, 30, &["Schema and migrations", "Posting API", "Reconciliation reports"]),
    ("prop-bo", "fl-bo", 64_000, 45, &[]),
    ("prop-cy", "fl-cy", 88_000, 21, &["Prototype", "Production hardening"]),
  ];
  for (id, freelancer, bid, days, milestones) in bids {
    store.insert_proposal(Proposal {
      id: id.to_string(),
      job_id: FEATURED_JOB.to_string(),
      freelancer_id: freelancer.to_string(),
      bid_amount: bid,
      delivery_time_days: days,
      cover_letter: format!("{} has shipped ledgers before.", freelancer),
      submitted_at: now,
      status: ProposalStatus::Pending,
      rejection_reason: None,
      milestones: milestones
        .iter()
        .map(|name| MilestonePlan {
          name: name.to_string(),
          description: String::new(),
        })
        .collect(),
    })?;
  }
  Ok(())
}
