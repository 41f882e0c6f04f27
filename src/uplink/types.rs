use thiserror::Error;

/// Why a single delivery attempt failed.
///
/// Every variant is retried the same way; the classification only shapes the
/// log line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
  #[error("HTTP status {code}: {body}")]
  HttpStatus { code: u16, body: String },

  #[error("request timed out")]
  Timeout,

  #[error("cannot reach collector: {0}")]
  ConnectionFailed(String),

  #[error("{kind} error: {message}")]
  Transport { kind: &'static str, message: String },

  #[error("failed to encode record: {0}")]
  Encode(String),
}

/// Raw response as seen by a transport, before status classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
  pub status: u16,
  pub body: String,
}

/// A successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
  /// Attempt number that succeeded
  pub attempts: u32,
  /// Collector response body, kept for logging only
  pub body: String,
}

/// Outcome of one `deliver` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncResult {
  Delivered(Delivery),
  Exhausted { attempts: u32, last_error: SyncError },
}

impl SyncResult {
  pub fn is_delivered(&self) -> bool {
    matches!(self, SyncResult::Delivered(_))
  }

  pub fn attempts(&self) -> u32 {
    match self {
      SyncResult::Delivered(delivery) => delivery.attempts,
      SyncResult::Exhausted { attempts, .. } => *attempts,
    }
  }
}
