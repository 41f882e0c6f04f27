use std::time::Duration;

use tracing::{error, info, warn};
use url::Url;

use crate::config::Config;
use crate::record::Record;

use super::transport::{Sleeper, Transport};
use super::types::{Delivery, SyncError, SyncResult};

/// Bounded retry schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  pub base_interval: Duration,
}

impl RetryPolicy {
  pub fn from_config(config: &Config) -> Self {
    Self {
      max_attempts: config.max_attempts,
      base_interval: config.retry_interval,
    }
  }

  /// Wait before the attempt following `attempt`, or `None` after the last.
  ///
  /// Linear: `base_interval * attempt`.
  pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
    (attempt < self.max_attempts).then(|| self.base_interval * attempt)
  }
}

/// Delivers records to the collector with bounded linear backoff.
///
/// Holds no state between calls to [`SyncClient::deliver`]. Duplicate
/// delivery is possible and left to the collector to tolerate.
pub struct SyncClient<T, S> {
  transport: T,
  sleeper: S,
  policy: RetryPolicy,
}

impl<T: Transport, S: Sleeper> SyncClient<T, S> {
  pub fn new(transport: T, sleeper: S, policy: RetryPolicy) -> Self {
    Self {
      transport,
      sleeper,
      policy,
    }
  }

  /// Try to deliver `record` to `endpoint`, retrying every failure until the
  /// attempt cap.
  pub async fn deliver(&self, record: &Record, endpoint: &Url) -> SyncResult {
    let body = match record.to_json() {
      Ok(body) => body,
      Err(e) => {
        let last_error = SyncError::Encode(e.to_string());
        error!(error = %last_error, "record cannot be sent");
        return SyncResult::Exhausted {
          attempts: 0,
          last_error,
        };
      }
    };

    let max_attempts = self.policy.max_attempts;
    let mut attempt = 1;

    loop {
      info!(attempt, max_attempts, endpoint = %endpoint, "sync attempt");

      let error = match self.transport.post(endpoint, &body).await {
        Ok(response) if response.status == 200 => {
          info!(attempt, status = response.status, "sync succeeded");
          return SyncResult::Delivered(Delivery {
            attempts: attempt,
            body: response.body,
          });
        }
        Ok(response) => SyncError::HttpStatus {
          code: response.status,
          body: response.body,
        },
        Err(e) => e,
      };

      log_failure(attempt, endpoint, &error);

      match self.policy.delay_after(attempt) {
        Some(wait) => {
          info!(wait_secs = wait.as_secs(), "waiting before retry");
          self.sleeper.sleep(wait).await;
          attempt += 1;
        }
        None => {
          error!(max_attempts, "max attempts exceeded");
          return SyncResult::Exhausted {
            attempts: attempt,
            last_error: error,
          };
        }
      }
    }
  }
}

fn log_failure(attempt: u32, endpoint: &Url, error: &SyncError) {
  match error {
    SyncError::HttpStatus { code, body } => {
      warn!(attempt, status = code, body = %body, "collector rejected record");
    }
    SyncError::Timeout => warn!(attempt, "network timeout"),
    SyncError::ConnectionFailed(reason) => {
      warn!(attempt, endpoint = %endpoint, reason = %reason, "cannot reach collector");
    }
    SyncError::Transport { kind, message } => {
      warn!(attempt, kind, message = %message, "request failed");
    }
    SyncError::Encode(_) => warn!(attempt, error = %error, "request failed"),
  }
}
