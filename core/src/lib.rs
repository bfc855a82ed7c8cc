// src/lib.rs

//! Engagement: the job discovery and engagement lifecycle core of a
//! freelance marketplace client.
//!
//! It covers:
//!  - Conjunctive job search with budget, duration and type buckets, and stable ranking.
//!  - The Job → Proposal → Order → Deliverable → Review state machine.
//!  - Service-fee pricing and order progress derived from deliverables.
//!  - Guarded, optimistic lifecycle actions that re-read the store after each mutation.
//!  - Repository seams with an in-memory store and a REST client.
//!  - A realtime event hub that projections fold into.

pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod flow;
pub mod lifecycle;
pub mod model;
pub mod pricing;
pub mod progress;
pub mod shared;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::config::EngagementConfig;
pub use crate::error::{EngagementError, EngagementResult};
pub use crate::shared::Shared;

pub use crate::discovery::{search, BudgetBucket, DiscoverySession, DurationBucket, Query, SearchOutcome, SortKey};
pub use crate::lifecycle::{ActionKey, Board, Lifecycle};
pub use crate::pricing::{compute_total, FeeRule, PriceBreakdown};
pub use crate::progress::{compute_progress, Progress, Schedule};

pub use crate::events::{follow, EventHub, MarketEvent, Projection};
pub use crate::store::{HttpStore, InMemoryStore, Marketplace};

/*
    Typical wiring:
    1. Load `EngagementConfig::from_env()`.
    2. Pick a store: `HttpStore::new(&config)` or an `InMemoryStore`.
    3. `DiscoverySession::new(store, policy).run(query)` to list and filter jobs.
    4. `Lifecycle::new(store, &config)` and call `accept`, `deliver`, `approve`, ...
       Each action validates, claims its dispatch slot, sends one mutation and
       re-reads the affected records into `lifecycle.board()`.
    5. Render progress with `lifecycle.progress(order_id, Utc::now())`.
*/
