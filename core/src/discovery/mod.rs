// engagement/src/discovery/mod.rs

//! Job discovery: predicate filtering and ranking over a job collection.

pub mod query;
pub mod search;
pub mod session;

pub use query::{BudgetBucket, DurationBucket, Query, SortKey};
pub use search::{matches, search, sort_jobs};
pub use session::{DiscoverySession, DiscoveryState, SearchOutcome};
