// engagement/src/store/policy.rs

use crate::config::EngagementConfig;
use crate::error::{EngagementError, EngagementResult};
use std::future::Future;
use std::time::Duration;
use tracing::{event, Level};

const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Timeout and retry rules for store calls.
///
/// Every call is bounded by `timeout`. Reads may be retried on transient
/// failures; mutations go through [`RequestPolicy::bounded`] only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestPolicy {
  pub timeout: Duration,
  pub read_retries: u32,
  pub backoff: Duration,
}

impl Default for RequestPolicy {
  fn default() -> Self {
    Self::from_config(&EngagementConfig::default())
  }
}

impl RequestPolicy {
  pub fn from_config(config: &EngagementConfig) -> Self {
    Self {
      timeout: config.request_timeout,
      read_retries: config.read_retries,
      backoff: RETRY_BACKOFF,
    }
  }

  pub async fn bounded<T, F>(&self, operation: &str, fut: F) -> EngagementResult<T>
  where
    F: Future<Output = EngagementResult<T>>,
  {
    match tokio::time::timeout(self.timeout, fut).await {
      Ok(result) => result,
      Err(_) => {
        event!(Level::WARN, operation, timeout_ms = self.timeout.as_millis() as u64, "Store call timed out.");
        Err(EngagementError::Timeout {
          operation: operation.to_string(),
          timeout: self.timeout,
        })
      }
    }
  }

  /// A bounded read, re-issued up to `read_retries` times while it fails transiently.
  pub async fn read<T, F, Fut>(&self, operation: &str, mut call: F) -> EngagementResult<T>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = EngagementResult<T>>,
  {
    let mut attempt: u32 = 0;
    loop {
      match self.bounded(operation, call()).await {
        Ok(value) => return Ok(value),
        Err(e) if e.is_transient() && attempt < self.read_retries => {
          attempt += 1;
          event!(Level::WARN, operation, attempt, error = %e, "Transient read failure, retrying.");
          tokio::time::sleep(self.backoff * attempt).await;
        }
        Err(e) => return Err(e),
      }
    }
  }
}
