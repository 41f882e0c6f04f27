//! In-memory transport and sleeper for exercising the retry loop.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use url::Url;

use super::transport::{Sleeper, Transport};
use super::types::{SyncError, TransportResponse};

pub type Reply = Result<TransportResponse, SyncError>;

pub fn ok(body: &str) -> Reply {
  Ok(TransportResponse {
    status: 200,
    body: body.to_string(),
  })
}

pub fn status(code: u16) -> Reply {
  Ok(TransportResponse {
    status: code,
    body: format!("status {}", code),
  })
}

/// Replays a fixed script of replies, then repeats the fallback forever.
pub struct ScriptedTransport {
  script: Mutex<VecDeque<Reply>>,
  fallback: Reply,
  bodies: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedTransport {
  pub fn new(script: Vec<Reply>) -> Self {
    Self {
      script: Mutex::new(script.into()),
      fallback: Err(SyncError::ConnectionFailed("script exhausted".into())),
      bodies: Mutex::new(Vec::new()),
    }
  }

  pub fn always(reply: Reply) -> Self {
    Self {
      fallback: reply,
      ..Self::new(Vec::new())
    }
  }

  pub fn calls(&self) -> u32 {
    self.bodies.lock().unwrap().len() as u32
  }

  pub fn bodies(&self) -> Vec<Vec<u8>> {
    self.bodies.lock().unwrap().clone()
  }
}

impl Transport for ScriptedTransport {
  async fn post(&self, _endpoint: &Url, body: &[u8]) -> Reply {
    self.bodies.lock().unwrap().push(body.to_vec());
    let next = self.script.lock().unwrap().pop_front();
    next.unwrap_or_else(|| self.fallback.clone())
  }
}

/// Records requested waits without sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
  sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
  pub fn sleeps(&self) -> Vec<Duration> {
    self.sleeps.lock().unwrap().clone()
  }

  pub fn total(&self) -> Duration {
    self.sleeps().iter().sum()
  }
}

impl Sleeper for RecordingSleeper {
  async fn sleep(&self, duration: Duration) {
    self.sleeps.lock().unwrap().push(duration);
  }
}
