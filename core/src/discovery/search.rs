// engagement/src/discovery/search.rs

//! `search`: conjunctive filtering followed by a stable sort.

use super::query::{Query, SortKey};
use crate::model::Job;
use std::cmp::Ordering;

/// Filters `jobs` by every predicate present in `query`, then orders the
/// survivors by `query.sort_key`. Equal keys keep their input order.
pub fn search(jobs: &[Job], query: &Query) -> Vec<Job> {
  let needle = query.text_needle();
  let mut hits: Vec<Job> = jobs
    .iter()
    .filter(|job| matches_prepared(job, query, needle.as_deref()))
    .cloned()
    .collect();
  sort_jobs(&mut hits, query.sort_key);
  hits
}

pub fn matches(job: &Job, query: &Query) -> bool {
  matches_prepared(job, query, query.text_needle().as_deref())
}

fn matches_prepared(job: &Job, query: &Query, needle: Option<&str>) -> bool {
  if let Some(needle) = needle {
    if !matches_text(job, needle) {
      return false;
    }
  }

  if let Some(category) = &query.category {
    if job.category != *category {
      return false;
    }
  }

  if let Some(kind) = query.job_type {
    // No explicit type and no budget type: the job cannot satisfy a type filter.
    if job.effective_kind() != Some(kind) {
      return false;
    }
  }

  if let Some(bucket) = query.budget_bucket {
    match job.effective_max_budget() {
      Some(max) if bucket.contains(max) => {}
      _ => return false,
    }
  }

  if let Some(bucket) = query.duration_bucket {
    if !bucket.matches(&job.duration) {
      return false;
    }
  }

  true
}

fn matches_text(job: &Job, needle: &str) -> bool {
  job.title.to_lowercase().contains(needle)
    || job.description.to_lowercase().contains(needle)
    || job.skills.iter().any(|skill| skill.to_lowercase().contains(needle))
}

/// Stable sort; jobs with no budget go last under both budget orders.
pub fn sort_jobs(jobs: &mut [Job], key: SortKey) {
  match key {
    SortKey::Latest => jobs.sort_by(|a, b| b.posted_at.cmp(&a.posted_at)),
    SortKey::BudgetHigh => {
      jobs.sort_by(|a, b| budget_last(a.effective_max_budget(), b.effective_max_budget(), |x, y| y.cmp(&x)))
    }
    SortKey::BudgetLow => {
      jobs.sort_by(|a, b| budget_last(a.effective_min_budget(), b.effective_min_budget(), |x, y| x.cmp(&y)))
    }
    SortKey::FewestProposals => jobs.sort_by_key(|job| job.proposal_count),
  }
}

fn budget_last(a: Option<u64>, b: Option<u64>, order: impl Fn(u64, u64) -> Ordering) -> Ordering {
  match (a, b) {
    (Some(x), Some(y)) => order(x, y),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}
