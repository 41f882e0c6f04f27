use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// A single measurement as cached locally and posted to the collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  pub site_id: String,
  pub power_kw: f64,
  /// Capture time, serialized as RFC 3339 (UTC)
  pub timestamp: DateTime<Utc>,
  /// Sync cycles this record has been through, starting at 1
  pub attempt_sequence: u32,
}

impl Record {
  /// Build a fresh record from the site configuration, stamped now.
  pub fn capture(config: &Config) -> Self {
    Self::new(&config.site_id, config.power_kw, Utc::now())
  }

  pub fn new(site_id: &str, power_kw: f64, timestamp: DateTime<Utc>) -> Self {
    Self {
      site_id: site_id.to_string(),
      power_kw,
      // Microsecond precision survives an RFC 3339 round trip
      timestamp: timestamp.trunc_subsecs(6),
      attempt_sequence: 1,
    }
  }

  /// The same record, queued for another sync cycle.
  pub fn next_cycle(&self) -> Self {
    Self {
      attempt_sequence: self.attempt_sequence.saturating_add(1),
      ..self.clone()
    }
  }

  /// JSON encoding shared by the cache file and the request body.
  pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(self)
  }

  pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
    serde_json::from_slice(bytes)
  }
}
