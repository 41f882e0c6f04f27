use tracing::{error, info, warn};
use url::Url;

use crate::cache::{CacheError, LocalCache};
use crate::record::Record;
use crate::uplink::{Sleeper, SyncClient, SyncResult, Transport};

/// What one run did, in both failure domains.
#[derive(Debug)]
pub struct RunOutcome {
  pub cache: Result<(), CacheError>,
  pub sync: SyncResult,
}

impl RunOutcome {
  /// Process exit status. Only the sync outcome counts.
  pub fn exit_status(&self) -> u8 {
    if self.sync.is_delivered() {
      0
    } else {
      1
    }
  }
}

/// Cache the record, then try to deliver it.
///
/// A cache failure is logged and otherwise ignored.
pub async fn run<T: Transport, S: Sleeper>(
  cache: &LocalCache,
  client: &SyncClient<T, S>,
  endpoint: &Url,
  record: &Record,
) -> RunOutcome {
  info!(path = %cache.path().display(), "saving record to local cache");
  let cache_result = cache.save(record);
  match &cache_result {
    Ok(()) => info!(path = %cache.path().display(), "record cached"),
    Err(e) => warn!(error = %e, "cache save failed, continuing to sync"),
  }

  info!(
    site_id = %record.site_id,
    attempt_sequence = record.attempt_sequence,
    "syncing record to collector"
  );
  let sync = client.deliver(record, endpoint).await;

  match &sync {
    SyncResult::Delivered(delivery) => {
      info!(
        attempts = sync.attempts(),
        response = %delivery.body,
        "sync completed successfully"
      );
    }
    SyncResult::Exhausted {
      attempts,
      last_error,
    } => {
      error!(
        attempts,
        last_error = %last_error,
        "sync failed, record kept in local cache for retry"
      );
    }
  }

  RunOutcome {
    cache: cache_result,
    sync,
  }
}
