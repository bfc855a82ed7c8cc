// engagement/src/config.rs

//! Runtime configuration for store access and pricing, loaded from the environment.

use crate::error::{EngagementError, EngagementResult};
use crate::pricing::FeeRule;
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080/api";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_READ_RETRIES: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngagementConfig {
  pub api_base_url: String,
  /// Client-side bound on every store request.
  pub request_timeout: Duration,
  /// Extra attempts for reads that fail transiently. Mutations are never retried.
  pub read_retries: u32,
  pub fee_rule: FeeRule,
}

impl Default for EngagementConfig {
  fn default() -> Self {
    Self {
      api_base_url: DEFAULT_API_BASE_URL.to_string(),
      request_timeout: DEFAULT_REQUEST_TIMEOUT,
      read_retries: DEFAULT_READ_RETRIES,
      fee_rule: FeeRule::default(),
    }
  }
}

impl EngagementConfig {
  pub fn from_env() -> EngagementResult<Self> {
    dotenv().ok(); // .env is optional

    let defaults = Self::default();

    let api_base_url = env::var("ENGAGEMENT_API_BASE_URL")
      .map(|url| url.trim_end_matches('/').to_string())
      .unwrap_or(defaults.api_base_url);
    if api_base_url.is_empty() {
      return Err(config_error("ENGAGEMENT_API_BASE_URL", "must not be empty"));
    }

    let request_timeout = match read_number::<u64>("ENGAGEMENT_REQUEST_TIMEOUT_MS")? {
      Some(0) => return Err(config_error("ENGAGEMENT_REQUEST_TIMEOUT_MS", "must be greater than zero")),
      Some(ms) => Duration::from_millis(ms),
      None => defaults.request_timeout,
    };

    let read_retries = read_number::<u32>("ENGAGEMENT_READ_RETRIES")?.unwrap_or(defaults.read_retries);

    let fee_rule = match read_number::<u32>("ENGAGEMENT_SERVICE_FEE_BPS")? {
      Some(bps) => FeeRule::new(bps).map_err(|e| config_error("ENGAGEMENT_SERVICE_FEE_BPS", e.to_string()))?,
      None => defaults.fee_rule,
    };

    tracing::info!(
      api_base_url = %api_base_url,
      timeout_ms = request_timeout.as_millis() as u64,
      read_retries,
      fee_bps = fee_rule.rate_bps(),
      "Engagement configuration loaded."
    );

    Ok(Self {
      api_base_url,
      request_timeout,
      read_retries,
      fee_rule,
    })
  }
}

fn read_number<N>(var_name: &str) -> EngagementResult<Option<N>>
where
  N: std::str::FromStr,
  N::Err: std::fmt::Display,
{
  match env::var(var_name) {
    Ok(raw) => raw
      .trim()
      .parse::<N>()
      .map(Some)
      .map_err(|e| config_error(var_name, format!("invalid value '{}': {}", raw, e))),
    Err(_) => Ok(None),
  }
}

fn config_error(field: &str, message: impl Into<String>) -> EngagementError {
  EngagementError::Config {
    field: field.to_string(),
    message: message.into(),
  }
}
