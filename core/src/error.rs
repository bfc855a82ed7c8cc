// engagement/src/error.rs
use anyhow::Error as AnyhowError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngagementError {
  /// Malformed input, rejected before any request leaves the client.
  #[error("Validation failed for '{field}': {message}")]
  Validation { field: String, message: String },

  /// Illegal state transition. The store's message is kept verbatim.
  #[error("Conflict: {message}")]
  Conflict { message: String },

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  #[error("Network error: {message}")]
  Network { message: String },

  #[error("Request timed out after {timeout:?} ({operation})")]
  Timeout { operation: String, timeout: Duration },

  /// The same action is already in flight, or was sealed by an earlier success.
  #[error("Action already dispatched: {key}")]
  DuplicateDispatch { key: String },

  #[error("Configuration error for '{field}': {message}")]
  Config { field: String, message: String },

  #[error("Action flow '{flow}' misconfigured at step '{step_name}': {message}")]
  Flow {
    flow: String,
    step_name: String,
    message: String,
  },

  #[error("Store failure. Source: {source}")]
  Store {
    #[source]
    source: AnyhowError,
  },
}

impl EngagementError {
  pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
    EngagementError::Validation {
      field: field.into(),
      message: message.into(),
    }
  }

  pub fn conflict(message: impl Into<String>) -> Self {
    EngagementError::Conflict { message: message.into() }
  }

  pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
    EngagementError::NotFound { entity, id: id.into() }
  }

  pub fn network(message: impl Into<String>) -> Self {
    EngagementError::Network { message: message.into() }
  }

  /// Transient failures that a read may retry. Mutations never retry on their own.
  pub fn is_transient(&self) -> bool {
    matches!(self, EngagementError::Network { .. } | EngagementError::Timeout { .. })
  }
}

impl From<AnyhowError> for EngagementError {
  fn from(err: AnyhowError) -> Self {
    // Unwrap an EngagementError that was carried through anyhow instead of nesting it.
    match err.downcast::<EngagementError>() {
      Ok(inner) => inner,
      Err(source) => EngagementError::Store { source },
    }
  }
}

pub type EngagementResult<T, E = EngagementError> = std::result::Result<T, E>;
