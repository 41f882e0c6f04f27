use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_SITE_ID: &str = "Bamenda";
pub const DEFAULT_POWER_KW: f64 = 120.0;
pub const DEFAULT_CACHE_PATH: &str = "/tmp/solar_sync_cache.json";
pub const DEFAULT_ENDPOINT: &str = "http://central-server:8000/api/solar";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Resolved runtime configuration, built once in `main`.
#[derive(Debug, Clone)]
pub struct Config {
  pub site_id: String,
  pub power_kw: f64,
  pub cache_path: PathBuf,
  pub endpoint: Url,
  pub max_attempts: u32,
  pub retry_interval: Duration,
  pub request_timeout: Duration,
  /// Directory for rolling log files; stderr only when unset
  pub log_dir: Option<PathBuf>,
}

/// One layer of configuration. Every field is optional so layers can be
/// stacked: defaults, then file, then environment, then command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
  pub site_id: Option<String>,
  pub power_kw: Option<f64>,
  pub cache_path: Option<PathBuf>,
  pub endpoint: Option<String>,
  pub max_attempts: Option<u32>,
  pub retry_interval_secs: Option<u64>,
  pub request_timeout_secs: Option<u64>,
  pub log_dir: Option<PathBuf>,
}

impl ConfigLayer {
  /// Overlay `other` on top of `self`; set fields in `other` win.
  pub fn merge(self, other: ConfigLayer) -> ConfigLayer {
    ConfigLayer {
      site_id: other.site_id.or(self.site_id),
      power_kw: other.power_kw.or(self.power_kw),
      cache_path: other.cache_path.or(self.cache_path),
      endpoint: other.endpoint.or(self.endpoint),
      max_attempts: other.max_attempts.or(self.max_attempts),
      retry_interval_secs: other.retry_interval_secs.or(self.retry_interval_secs),
      request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
      log_dir: other.log_dir.or(self.log_dir),
    }
  }

  /// Read the environment layer through `lookup`.
  ///
  /// SITE_ID is checked first, then VILLAGE_ID as fallback.
  pub fn from_env<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    Ok(ConfigLayer {
      site_id: lookup("SITE_ID").or_else(|| lookup("VILLAGE_ID")),
      power_kw: parse_env(&lookup, "POWER_KW")?,
      cache_path: lookup("LOCAL_CACHE_PATH").map(PathBuf::from),
      endpoint: lookup("API_URL"),
      max_attempts: parse_env(&lookup, "MAX_RETRIES")?,
      retry_interval_secs: parse_env(&lookup, "RETRY_INTERVAL")?,
      request_timeout_secs: parse_env(&lookup, "REQUEST_TIMEOUT")?,
      log_dir: lookup("SOLAR_UPLINK_LOG_DIR").map(PathBuf::from),
    })
  }

  /// Load a YAML layer from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./solar-uplink.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/solar-uplink/config.yaml
  ///
  /// Finding no file is not an error; the layer is simply empty.
  pub fn from_file(explicit_path: Option<&Path>) -> Result<Self> {
    let path = match explicit_path {
      Some(p) if p.exists() => Some(p.to_path_buf()),
      Some(p) => return Err(eyre!("Config file not found: {}", p.display())),
      None => Self::find_config_file(),
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("solar-uplink.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("solar-uplink").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }
}

fn parse_env<F, T>(lookup: &F, name: &str) -> Result<Option<T>>
where
  F: Fn(&str) -> Option<String>,
  T: FromStr,
  T::Err: std::fmt::Display,
{
  lookup(name)
    .map(|raw| {
      raw
        .trim()
        .parse::<T>()
        .map_err(|e| eyre!("Invalid value {:?} for {}: {}", raw, name, e))
    })
    .transpose()
}

impl Config {
  /// Resolve the final configuration from a stack of layers, filling
  /// anything left unset with the built-in defaults.
  pub fn resolve(layer: ConfigLayer) -> Result<Self> {
    let endpoint_raw = layer
      .endpoint
      .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    let endpoint = Url::parse(&endpoint_raw)
      .map_err(|e| eyre!("Invalid endpoint URL {:?}: {}", endpoint_raw, e))?;
    if !matches!(endpoint.scheme(), "http" | "https") {
      return Err(eyre!(
        "Endpoint must be an http or https URL, got {:?}",
        endpoint_raw
      ));
    }

    let power_kw = layer.power_kw.unwrap_or(DEFAULT_POWER_KW);
    if !power_kw.is_finite() {
      return Err(eyre!("Power rating must be a finite number, got {}", power_kw));
    }

    let max_attempts = positive("max attempts", layer.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS))?;
    let retry_interval_secs = positive(
      "retry interval",
      layer.retry_interval_secs.unwrap_or(DEFAULT_RETRY_INTERVAL_SECS),
    )?;
    let request_timeout_secs = positive(
      "request timeout",
      layer
        .request_timeout_secs
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
    )?;

    Ok(Config {
      site_id: layer.site_id.unwrap_or_else(|| DEFAULT_SITE_ID.to_string()),
      power_kw,
      cache_path: layer
        .cache_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_PATH)),
      endpoint,
      max_attempts,
      retry_interval: Duration::from_secs(retry_interval_secs),
      request_timeout: Duration::from_secs(request_timeout_secs),
      log_dir: layer.log_dir,
    })
  }
}

fn positive<T>(what: &str, value: T) -> Result<T>
where
  T: PartialOrd + Default + std::fmt::Display,
{
  if value > T::default() {
    Ok(value)
  } else {
    Err(eyre!("{} must be a positive integer, got {}", what, value))
  }
}
