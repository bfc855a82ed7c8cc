// demos/marketplace_app/src/main.rs

//! Walks one engagement end to end against the in-memory store: discovery,
//! accepting a proposal, the delivery and revision loop, and reviews.

mod seed;

use anyhow::Context;
use chrono::Utc;
use engagement::model::{FileRef, Role};
use engagement::store::{InMemoryStore, RequestPolicy};
use engagement::{
  follow, BudgetBucket, DiscoverySession, EngagementConfig, EventHub, Lifecycle, Query, SearchOutcome, SortKey,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // RUST_LOG override
    .with_span_events(FmtSpan::CLOSE)
    .init();

  let config = match EngagementConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      tracing::error!(error = %e, "Failed to load engagement configuration.");
      return Err(e.into());
    }
  };

  let hub = EventHub::default();
  let store = Arc::new(
    InMemoryStore::new()
      .with_fee_rule(config.fee_rule)
      .with_event_hub(hub.clone()),
  );

  let discovery = DiscoverySession::new(Arc::clone(&store), RequestPolicy::from_config(&config));
  let lifecycle = Lifecycle::new(Arc::clone(&store), &config);
  tokio::spawn(follow(hub.subscribe(), discovery.state()));
  tokio::spawn(follow(hub.subscribe(), lifecycle.board()));

  seed::populate(&store).context("seeding the in-memory store")?;

  // --- Discovery ---
  let query = Query::new()
    .text("rust")
    .budget_bucket(BudgetBucket::From50kTo100k)
    .sort_by(SortKey::BudgetHigh);
  match discovery.run(query).await? {
    SearchOutcome::Matches(count) => {
      for job in discovery.results() {
        tracing::info!(job_id = %job.id, title = %job.title, proposals = job.proposal_count, "Match.");
      }
      tracing::info!(count, "Discovery finished.");
    }
    other => tracing::warn!(outcome = ?other, "Nothing to engage with."),
  }

  // --- Proposal decision ---
  let job = lifecycle.load_job(seed::FEATURED_JOB).await?;
  tracing::info!(job_id = %job.id, proposals = job.proposal_count, "Reviewing proposals.");
  lifecycle
    .reject(seed::FEATURED_JOB, "prop-cy", Some("Over budget".to_string()))
    .await?;
  let order_id = lifecycle.accept(seed::FEATURED_JOB, "prop-ana").await?;

  // Give the feed a moment to carry the job's closing to the discovery view.
  tokio::time::sleep(Duration::from_millis(20)).await;
  tracing::info!(remaining = discovery.results().len(), "Discovery results after acceptance.");

  // --- Delivery loop ---
  let order = lifecycle.order(&order_id).context("order missing after accept")?;
  tracing::info!(
    order_id = %order.id,
    base = order.base_price,
    fee = order.service_fee,
    total = order.total,
    "Order created."
  );
  let deliverable_ids: Vec<String> = order.deliverables.iter().map(|d| d.id.clone()).collect();

  for (idx, deliverable_id) in deliverable_ids.iter().enumerate() {
    let files = vec![FileRef {
      name: format!("milestone-{}.zip", idx + 1),
      url: format!("https://files.example.com/{}/{}.zip", order_id, deliverable_id),
      size_bytes: Some(48_000),
    }];
    lifecycle.deliver(&order_id, deliverable_id, files).await?;
    report_progress(&lifecycle, &order_id);
  }

  if let Some(first) = deliverable_ids.first() {
    lifecycle
      .request_revision(&order_id, first, "Please add the missing index on postings.")
      .await?;
    report_progress(&lifecycle, &order_id);
    let files = vec![FileRef {
      name: "milestone-1-rev.zip".to_string(),
      url: format!("https://files.example.com/{}/{}-rev.zip", order_id, first),
      size_bytes: None,
    }];
    lifecycle.deliver(&order_id, first, files).await?;
  }

  for deliverable_id in &deliverable_ids {
    lifecycle.approve(&order_id, deliverable_id).await?;
  }
  report_progress(&lifecycle, &order_id);

  // --- Reviews ---
  lifecycle
    .submit_review(&order_id, Role::Client, 5, "Clean code and clear communication.")
    .await?;
  lifecycle
    .submit_review(&order_id, Role::Freelancer, 5, "Precise requirements, fast feedback.")
    .await?;

  let order = lifecycle.order(&order_id).context("order missing after reviews")?;
  for timeline_event in &order.timeline {
    tracing::info!(kind = ?timeline_event.kind, actor = %timeline_event.actor, "{}", timeline_event.title);
  }
  tracing::info!(order = %serde_json::to_string_pretty(&order)?, "Final order.");
  Ok(())
}

fn report_progress(lifecycle: &Lifecycle<InMemoryStore>, order_id: &str) {
  if let Some(progress) = lifecycle.progress(order_id, Utc::now()) {
    tracing::info!(
      percent = progress.percent,
      approved = progress.approved,
      total = progress.total,
      days_remaining = progress.days_remaining,
      schedule = ?progress.schedule,
      "Order progress."
    );
  }
}
