// tests/discovery_tests.rs
mod common;

use common::*;
use engagement::discovery::{matches, sort_jobs};
use engagement::model::{Budget, BudgetKind, JobStatus};
use engagement::store::{InMemoryStore, InjectedFault};
use engagement::{search, BudgetBucket, DiscoverySession, DurationBucket, EngagementError, MarketEvent, Query, SearchOutcome, SortKey};
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;

fn ids(jobs: &[engagement::model::Job]) -> Vec<&str> {
  jobs.iter().map(|j| j.id.as_str()).collect()
}

// --- search ---

#[test]
fn test_empty_query_returns_all_jobs_latest_first() {
  setup_tracing();
  let results = search(&catalog(), &Query::new());
  assert_eq!(ids(&results), vec!["job-2", "job-3", "job-1", "job-5", "job-4"]);
}

#[test]
fn test_text_matches_title_description_or_skill_case_insensitively() {
  setup_tracing();
  let results = search(&catalog(), &Query::new().text("RUST"));
  // job-1 by title and skill, job-3 by description only.
  assert_eq!(ids(&results), vec!["job-3", "job-1"]);

  let by_skill = search(&catalog(), &Query::new().text("airflow"));
  assert_eq!(ids(&by_skill), vec!["job-3"]);
}

#[test]
fn test_blank_text_does_not_filter() {
  setup_tracing();
  let results = search(&catalog(), &Query::new().text("   "));
  assert_eq!(results.len(), catalog().len());
}

#[test]
fn test_category_is_exact() {
  setup_tracing();
  assert_eq!(ids(&search(&catalog(), &Query::new().category("design"))), vec!["job-2"]);
  assert!(search(&catalog(), &Query::new().category("Design")).is_empty());
}

#[test]
fn test_job_type_falls_back_to_budget_type() {
  setup_tracing();
  let fixed = search(&catalog(), &Query::new().job_type(BudgetKind::Fixed));
  // job-2 has no explicit jobType but a fixed budget; job-5 has neither.
  assert_eq!(ids(&fixed), vec!["job-2", "job-1", "job-4"]);

  let hourly = search(&catalog(), &Query::new().job_type(BudgetKind::Hourly));
  assert_eq!(ids(&hourly), vec!["job-3"]);
}

#[test]
fn test_explicit_job_type_wins_over_budget_type() {
  setup_tracing();
  let mut job = job("job-x", "Mixed");
  job.job_type = Some(BudgetKind::Hourly);
  job.budget = Some(Budget::fixed(10, 20));
  assert!(matches(&job, &Query::new().job_type(BudgetKind::Hourly)));
  assert!(!matches(&job, &Query::new().job_type(BudgetKind::Fixed)));
}

#[test]
fn test_fixed_40k_to_60k_budget_is_in_500_1000_not_under_500() {
  setup_tracing();
  let job = job_with_budget("job-b", Some(Budget::fixed(40_000, 60_000)));
  assert!(matches(&job, &Query::new().budget_bucket(BudgetBucket::From50kTo100k)));
  assert!(!matches(&job, &Query::new().budget_bucket(BudgetBucket::Under50k)));
}

#[test]
fn test_budget_bucket_boundaries_are_lower_inclusive() {
  setup_tracing();
  assert_eq!(BudgetBucket::classify(0), BudgetBucket::Under50k);
  assert_eq!(BudgetBucket::classify(49_999), BudgetBucket::Under50k);
  assert_eq!(BudgetBucket::classify(50_000), BudgetBucket::From50kTo100k);
  assert_eq!(BudgetBucket::classify(99_999), BudgetBucket::From50kTo100k);
  assert_eq!(BudgetBucket::classify(100_000), BudgetBucket::From100kTo250k);
  assert_eq!(BudgetBucket::classify(250_000), BudgetBucket::From250kTo500k);
  assert_eq!(BudgetBucket::classify(500_000), BudgetBucket::Above500k);
  assert_eq!(BudgetBucket::classify(u64::MAX), BudgetBucket::Above500k);

  for amount in [0, 49_999, 50_000, 100_000, 249_999, 250_000, 499_999, 500_000, 7_000_000] {
    let holders = BudgetBucket::ALL.iter().filter(|b| b.contains(amount)).count();
    assert_eq!(holders, 1, "amount {} must land in exactly one bucket", amount);
  }
}

#[test]
fn test_hourly_budget_is_scaled_to_a_work_week() {
  setup_tracing();
  // 2 500/h × 40 = 100 000, the lower edge of 1000-2500.
  let results = search(&catalog(), &Query::new().budget_bucket(BudgetBucket::From100kTo250k));
  assert_eq!(ids(&results), vec!["job-3"]);
}

#[test]
fn test_explicit_hourly_type_scales_an_untyped_budget() {
  setup_tracing();
  let mut job = job("job-h", "Hourly by jobType only");
  job.job_type = Some(BudgetKind::Hourly);
  job.budget = Some(Budget {
    kind: None,
    min: 1_500,
    max: 2_500,
  });

  assert!(matches(&job, &Query::new().job_type(BudgetKind::Hourly)));
  assert_eq!(job.effective_max_budget(), Some(100_000));
  assert_eq!(job.effective_min_budget(), Some(60_000));
  assert!(matches(&job, &Query::new().budget_bucket(BudgetBucket::From100kTo250k)));
  assert!(!matches(&job, &Query::new().budget_bucket(BudgetBucket::Under50k)));
}

#[test]
fn test_jobs_without_budget_never_match_a_budget_bucket() {
  setup_tracing();
  let no_budget = job_with_budget("job-n", None);
  for bucket in BudgetBucket::ALL {
    assert!(!matches(&no_budget, &Query::new().budget_bucket(bucket)));
  }
}

#[test]
fn test_duration_buckets_match_loosely() {
  setup_tracing();
  let cases = [
    (DurationBucket::LessThanMonth, vec!["job-2"]),
    (DurationBucket::OneToThreeMonths, vec!["job-1", "job-5"]),
    (DurationBucket::ThreeToSixMonths, vec!["job-4"]),
    (DurationBucket::Ongoing, vec!["job-3"]),
  ];
  for (bucket, expected) in cases {
    let results = search(&catalog(), &Query::new().duration_bucket(bucket));
    assert_eq!(ids(&results), expected, "bucket {}", bucket.label());
  }
}

#[test]
fn test_predicates_are_conjunctive() {
  setup_tracing();
  let query = Query::new()
    .text("rust")
    .category("web-development")
    .job_type(BudgetKind::Fixed)
    .budget_bucket(BudgetBucket::From50kTo100k)
    .duration_bucket(DurationBucket::OneToThreeMonths);
  let results = search(&catalog(), &query);
  assert_eq!(ids(&results), vec!["job-1"]);
  assert!(results.iter().all(|job| matches(job, &query)));

  let contradiction = Query::new().text("rust").category("design");
  assert!(search(&catalog(), &contradiction).is_empty());
}

#[test]
fn test_sort_keys() {
  setup_tracing();
  let cases = [
    (SortKey::BudgetHigh, vec!["job-4", "job-3", "job-1", "job-2", "job-5"]),
    (SortKey::BudgetLow, vec!["job-2", "job-1", "job-3", "job-4", "job-5"]),
    (SortKey::FewestProposals, vec!["job-3", "job-5", "job-2", "job-1", "job-4"]),
  ];
  for (key, expected) in cases {
    let results = search(&catalog(), &Query::new().sort_by(key));
    assert_eq!(ids(&results), expected, "sort {:?}", key);
  }
}

#[test]
fn test_sort_is_stable_on_ties() {
  setup_tracing();
  let mut jobs = vec![job("a", "A"), job("b", "B"), job("c", "C")];
  sort_jobs(&mut jobs, SortKey::Latest);
  assert_eq!(ids(&jobs), vec!["a", "b", "c"]);
  sort_jobs(&mut jobs, SortKey::FewestProposals);
  assert_eq!(ids(&jobs), vec!["a", "b", "c"]);
}

#[test]
fn test_labels_parse_and_unknown_labels_are_validation_errors() {
  setup_tracing();
  assert_eq!("500-1000".parse::<BudgetBucket>().unwrap(), BudgetBucket::From50kTo100k);
  assert_eq!("Ongoing".parse::<DurationBucket>().unwrap(), DurationBucket::Ongoing);
  assert_eq!("budget-low".parse::<SortKey>().unwrap(), SortKey::BudgetLow);
  assert_eq!("hourly".parse::<BudgetKind>().unwrap(), BudgetKind::Hourly);

  assert!(matches!(
    "1000-9999".parse::<BudgetBucket>(),
    Err(EngagementError::Validation { .. })
  ));
  assert!(matches!("soonish".parse::<DurationBucket>(), Err(EngagementError::Validation { .. })));
  assert!(matches!("cheapest".parse::<SortKey>(), Err(EngagementError::Validation { .. })));
}

#[test]
fn test_query_serializes_with_wire_labels() {
  setup_tracing();
  let query = Query::new()
    .budget_bucket(BudgetBucket::Above500k)
    .duration_bucket(DurationBucket::LessThanMonth)
    .sort_by(SortKey::FewestProposals);
  let json = serde_json::to_value(&query).unwrap();
  assert_eq!(json["budgetBucket"], "above-5000");
  assert_eq!(json["durationBucket"], "less-than-month");
  assert_eq!(json["sortKey"], "fewest-proposals");
  assert!(json.get("text").is_none());
}

// --- DiscoverySession ---

fn catalog_store() -> Arc<InMemoryStore> {
  let store = InMemoryStore::new();
  for job in catalog() {
    store.insert_job(job);
  }
  Arc::new(store)
}

#[tokio::test]
#[serial]
async fn test_session_run_filters_fetched_open_jobs() {
  setup_tracing();
  let store = catalog_store();
  let mut closed = job("job-closed", "Rust audit");
  closed.status = JobStatus::Closed;
  store.insert_job(closed);

  let session = DiscoverySession::new(Arc::clone(&store), fast_policy());
  let outcome = session.run(Query::new().text("rust")).await.unwrap();

  assert_eq!(outcome, SearchOutcome::Matches(2));
  assert_eq!(ids(&session.results()), vec!["job-3", "job-1"]);
  let state = session.state().snapshot();
  assert_eq!(state.jobs.len(), 5);
  assert_eq!(state.outcome, Some(SearchOutcome::Matches(2)));
  assert_eq!(state.query.text.as_deref(), Some("rust"));
}

#[tokio::test]
#[serial]
async fn test_session_reports_no_matches() {
  setup_tracing();
  let session = DiscoverySession::new(catalog_store(), fast_policy());
  let outcome = session.run(Query::new().text("cobol")).await.unwrap();
  assert_eq!(outcome, SearchOutcome::NoMatches);
  assert!(session.results().is_empty());
}

#[tokio::test]
#[serial]
async fn test_session_refine_works_offline() {
  setup_tracing();
  let store = catalog_store();
  let session = DiscoverySession::new(Arc::clone(&store), fast_policy());
  session.run(Query::new()).await.unwrap();
  let calls_after_run = store.call_count();

  let outcome = session.refine(Query::new().category("mobile"));
  assert_eq!(outcome, SearchOutcome::Matches(1));
  assert_eq!(ids(&session.results()), vec!["job-4"]);
  assert_eq!(store.call_count(), calls_after_run);
}

#[tokio::test(start_paused = true)]
#[serial]
async fn test_refine_during_run_filters_the_late_fetch_under_the_refined_query() {
  setup_tracing();
  let store = catalog_store();
  store.set_latency(Some(Duration::from_millis(100)));
  let session = DiscoverySession::new(Arc::clone(&store), fast_policy());

  let (slow, _) = tokio::join!(session.run(Query::new().text("rust")), async {
    tokio::time::sleep(Duration::from_millis(10)).await;
    session.refine(Query::new().category("design"));
  });

  assert_eq!(slow.unwrap(), SearchOutcome::Matches(1));
  let state = session.state().snapshot();
  assert_eq!(state.query.category.as_deref(), Some("design"));
  assert_eq!(state.query.text, None);
  assert_eq!(state.jobs.len(), 5);
  assert_eq!(ids(&state.results), vec!["job-2"]);
  assert_eq!(state.outcome, Some(SearchOutcome::Matches(1)));
}

#[tokio::test(start_paused = true)]
#[serial]
async fn test_newer_run_supersedes_older_run() {
  setup_tracing();
  let store = catalog_store();
  store.set_latency(Some(Duration::from_millis(100)));
  let session = DiscoverySession::new(Arc::clone(&store), fast_policy());

  let (older, newer) = tokio::join!(session.run(Query::new().category("design")), async {
    tokio::time::sleep(Duration::from_millis(10)).await;
    session.run(Query::new().category("mobile")).await
  });

  assert_eq!(older.unwrap(), SearchOutcome::Superseded);
  assert_eq!(newer.unwrap(), SearchOutcome::Matches(1));
  assert_eq!(ids(&session.results()), vec!["job-4"]);
}

#[tokio::test(start_paused = true)]
#[serial]
async fn test_cancel_discards_in_flight_run() {
  setup_tracing();
  let store = catalog_store();
  store.set_latency(Some(Duration::from_millis(100)));
  let session = DiscoverySession::new(Arc::clone(&store), fast_policy());

  let (cancelled, _) = tokio::join!(session.run(Query::new()), async {
    tokio::time::sleep(Duration::from_millis(10)).await;
    session.cancel();
  });

  assert_eq!(cancelled.unwrap(), SearchOutcome::Superseded);
  assert!(session.results().is_empty());
  assert_eq!(session.state().snapshot().outcome, None);
}

#[tokio::test]
#[serial]
async fn test_session_retries_transient_list_failures() {
  setup_tracing();
  let store = catalog_store();
  store.inject_fault(InjectedFault::Network);
  store.inject_fault(InjectedFault::Network);
  let session = DiscoverySession::new(Arc::clone(&store), fast_policy());

  let outcome = session.run(Query::new()).await.unwrap();
  assert_eq!(outcome, SearchOutcome::Matches(5));
  assert_eq!(store.call_count(), 3);
}

#[tokio::test]
#[serial]
async fn test_failed_run_keeps_previous_results() {
  setup_tracing();
  let store = catalog_store();
  let session = DiscoverySession::new(Arc::clone(&store), fast_policy());
  session.run(Query::new().category("design")).await.unwrap();

  store.inject_fault(InjectedFault::Unavailable);
  let err = session.run(Query::new()).await.unwrap_err();
  assert!(matches!(err, EngagementError::Store { .. }));

  let state = session.state().snapshot();
  assert_eq!(ids(&state.results), vec!["job-2"]);
  assert_eq!(state.query.category.as_deref(), Some("design"));
  assert!(state.last_error.is_some());
}

#[tokio::test]
#[serial]
async fn test_realtime_events_update_results_without_fetching() {
  setup_tracing();
  let store = catalog_store();
  let session = DiscoverySession::new(Arc::clone(&store), fast_policy());
  session.run(Query::new().text("rust")).await.unwrap();
  let calls = store.call_count();

  session.apply_event(&MarketEvent::JobCreated(job("job-new", "Rust CLI tooling")));
  assert_eq!(ids(&session.results()), vec!["job-new", "job-3", "job-1"]);

  let mut closed = job("job-new", "Rust CLI tooling");
  closed.status = JobStatus::Closed;
  session.apply_event(&MarketEvent::JobUpdated(closed));
  assert_eq!(ids(&session.results()), vec!["job-3", "job-1"]);

  session.apply_event(&MarketEvent::JobDeleted {
    job_id: "job-1".to_string(),
  });
  assert_eq!(ids(&session.results()), vec!["job-3"]);
  assert_eq!(store.call_count(), calls);
}
