// tests/config_tests.rs
mod common;

use common::*;
use engagement::config::{DEFAULT_API_BASE_URL, DEFAULT_READ_RETRIES, DEFAULT_REQUEST_TIMEOUT};
use engagement::store::RequestPolicy;
use engagement::{EngagementConfig, EngagementError};
use serial_test::serial;
use std::env;
use std::time::Duration;

const VARS: [&str; 4] = [
  "ENGAGEMENT_API_BASE_URL",
  "ENGAGEMENT_REQUEST_TIMEOUT_MS",
  "ENGAGEMENT_READ_RETRIES",
  "ENGAGEMENT_SERVICE_FEE_BPS",
];

fn clear_env() {
  for var in VARS {
    env::remove_var(var);
  }
}

#[test]
#[serial]
fn test_defaults_when_unset() {
  setup_tracing();
  clear_env();
  let config = EngagementConfig::from_env().unwrap();
  assert_eq!(config, EngagementConfig::default());
  assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
  assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
  assert_eq!(config.read_retries, DEFAULT_READ_RETRIES);
  assert_eq!(config.fee_rule.rate_bps(), 500);
}

#[test]
#[serial]
fn test_reads_overrides() {
  setup_tracing();
  clear_env();
  env::set_var("ENGAGEMENT_API_BASE_URL", "https://market.example.com/api/");
  env::set_var("ENGAGEMENT_REQUEST_TIMEOUT_MS", "2500");
  env::set_var("ENGAGEMENT_READ_RETRIES", "4");
  env::set_var("ENGAGEMENT_SERVICE_FEE_BPS", "750");

  let config = EngagementConfig::from_env().unwrap();
  clear_env();

  assert_eq!(config.api_base_url, "https://market.example.com/api");
  assert_eq!(config.request_timeout, Duration::from_millis(2_500));
  assert_eq!(config.read_retries, 4);
  assert_eq!(config.fee_rule.rate_bps(), 750);

  let policy = RequestPolicy::from_config(&config);
  assert_eq!(policy.timeout, Duration::from_millis(2_500));
  assert_eq!(policy.read_retries, 4);
}

#[test]
#[serial]
fn test_invalid_values_are_config_errors() {
  setup_tracing();
  let cases = [
    ("ENGAGEMENT_REQUEST_TIMEOUT_MS", "0"),
    ("ENGAGEMENT_REQUEST_TIMEOUT_MS", "soon"),
    ("ENGAGEMENT_READ_RETRIES", "-1"),
    ("ENGAGEMENT_SERVICE_FEE_BPS", "10001"),
  ];
  for (var, value) in cases {
    clear_env();
    env::set_var(var, value);
    let result = EngagementConfig::from_env();
    clear_env();
    match result {
      Err(EngagementError::Config { field, .. }) => assert_eq!(field, var),
      other => panic!("{}={} should be a config error, got {:?}", var, value, other),
    }
  }
}
