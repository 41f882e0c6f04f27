mod app;
mod cache;
mod config;
mod logging;
mod record;
mod uplink;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use crate::cache::LocalCache;
use crate::config::{Config, ConfigLayer};
use crate::record::Record;
use crate::uplink::{HttpTransport, RetryPolicy, SyncClient, TokioSleeper};

#[derive(Parser, Debug)]
#[command(name = "solar-uplink")]
#[command(about = "Cache a site power reading locally, then push it to the central collector")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./solar-uplink.yaml or $XDG_CONFIG_HOME/solar-uplink/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Site identifier
  #[arg(long)]
  site_id: Option<String>,

  /// Power reading in kW
  #[arg(long)]
  power_kw: Option<f64>,

  /// Local cache file
  #[arg(long)]
  cache_path: Option<PathBuf>,

  /// Collector endpoint URL
  #[arg(long)]
  endpoint: Option<String>,

  /// Maximum delivery attempts
  #[arg(long)]
  max_attempts: Option<u32>,

  /// Base retry interval in seconds; the wait after attempt n is n times this
  #[arg(long)]
  retry_interval: Option<u64>,

  /// Per-request timeout in seconds
  #[arg(long)]
  request_timeout: Option<u64>,

  /// Also write logs to daily files in this directory
  #[arg(long)]
  log_dir: Option<PathBuf>,

  /// Resend the record left in the cache instead of capturing a new one
  #[arg(long)]
  resend_cached: bool,
}

impl Args {
  fn layer(&self) -> ConfigLayer {
    ConfigLayer {
      site_id: self.site_id.clone(),
      power_kw: self.power_kw,
      cache_path: self.cache_path.clone(),
      endpoint: self.endpoint.clone(),
      max_attempts: self.max_attempts,
      retry_interval_secs: self.retry_interval,
      request_timeout_secs: self.request_timeout,
      log_dir: self.log_dir.clone(),
    }
  }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
  color_eyre::install()?;

  let args = Args::parse();

  // Defaults < file < environment < command line
  let layer = ConfigLayer::from_file(args.config.as_deref())?
    .merge(ConfigLayer::from_env(|name| std::env::var(name).ok())?)
    .merge(args.layer());
  let config = Config::resolve(layer)?;

  let _log_guard = logging::init(config.log_dir.as_deref())?;

  info!(
    site_id = %config.site_id,
    power_kw = config.power_kw,
    max_attempts = config.max_attempts,
    retry_interval_secs = config.retry_interval.as_secs(),
    endpoint = %config.endpoint,
    "starting sync operation"
  );

  let cache = LocalCache::new(&config.cache_path);
  let record = if args.resend_cached {
    let cached = cache
      .load()
      .map_err(|e| eyre!("Nothing to resend: {}", e))?;
    cached.next_cycle()
  } else {
    Record::capture(&config)
  };

  let transport = HttpTransport::new(config.request_timeout)?;
  let client = SyncClient::new(transport, TokioSleeper, RetryPolicy::from_config(&config));

  let outcome = app::run(&cache, &client, &config.endpoint, &record).await;

  Ok(ExitCode::from(outcome.exit_status()))
}
