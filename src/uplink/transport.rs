//! Network and clock seams used by the sync client.

use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use reqwest::header::CONTENT_TYPE;
use url::Url;

use super::types::{SyncError, TransportResponse};

/// Sends one request body to the collector.
pub trait Transport {
  /// POST `body` to `endpoint`. Any response status is `Ok`; only failures
  /// to obtain a response are errors.
  async fn post(&self, endpoint: &Url, body: &[u8]) -> Result<TransportResponse, SyncError>;
}

/// Waits between attempts.
pub trait Sleeper {
  async fn sleep(&self, duration: Duration);
}

impl<T: Transport + ?Sized> Transport for &T {
  async fn post(&self, endpoint: &Url, body: &[u8]) -> Result<TransportResponse, SyncError> {
    (**self).post(endpoint, body).await
  }
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
  async fn sleep(&self, duration: Duration) {
    (**self).sleep(duration).await;
  }
}

/// Blocking-in-sequence sleep on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
  async fn sleep(&self, duration: Duration) {
    tokio::time::sleep(duration).await;
  }
}

/// HTTP transport backed by reqwest.
#[derive(Clone)]
pub struct HttpTransport {
  client: reqwest::Client,
}

impl HttpTransport {
  /// Build a client whose every request is bounded by `timeout`.
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(concat!("solar-uplink/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client })
  }
}

impl Transport for HttpTransport {
  async fn post(&self, endpoint: &Url, body: &[u8]) -> Result<TransportResponse, SyncError> {
    let response = self
      .client
      .post(endpoint.clone())
      .header(CONTENT_TYPE, "application/json")
      .body(body.to_vec())
      .send()
      .await
      .map_err(classify)?;

    let status = response.status().as_u16();
    let body = response.text().await.map_err(classify)?;

    Ok(TransportResponse { status, body })
  }
}

/// Map a reqwest failure onto the diagnostic categories.
///
/// A connect timeout reports as both timeout and connect; timeout wins.
fn classify(err: reqwest::Error) -> SyncError {
  if err.is_timeout() {
    SyncError::Timeout
  } else if err.is_connect() {
    SyncError::ConnectionFailed(err.to_string())
  } else {
    let kind = if err.is_body() {
      "body"
    } else if err.is_decode() {
      "decode"
    } else if err.is_redirect() {
      "redirect"
    } else if err.is_builder() {
      "builder"
    } else if err.is_request() {
      "request"
    } else {
      "transport"
    };
    SyncError::Transport {
      kind,
      message: err.to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use mockito::Matcher;

  fn endpoint(base: &str) -> Url {
    Url::parse(&format!("{}/api/solar", base)).unwrap()
  }

  #[tokio::test]
  async fn test_post_sends_json_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/api/solar")
      .match_header("content-type", "application/json")
      .match_body(Matcher::PartialJson(serde_json::json!({"site_id": "Bamenda"})))
      .with_status(200)
      .with_body(r#"{"status":"stored"}"#)
      .create_async()
      .await;

    let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
    let response = transport
      .post(&endpoint(&server.url()), br#"{"site_id":"Bamenda","power_kw":120.0}"#)
      .await
      .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, r#"{"status":"stored"}"#);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_error_status_is_a_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/api/solar")
      .with_status(503)
      .with_body("maintenance")
      .create_async()
      .await;

    let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
    let response = transport.post(&endpoint(&server.url()), b"{}").await.unwrap();

    assert_eq!(response.status, 503);
    assert_eq!(response.body, "maintenance");
  }

  #[tokio::test]
  async fn test_refused_connection_classified() {
    // Bind then drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
    let err = transport
      .post(&endpoint(&format!("http://{}", addr)), b"{}")
      .await
      .unwrap_err();

    assert!(matches!(err, SyncError::ConnectionFailed(_)), "got {:?}", err);
  }

  #[tokio::test]
  async fn test_silent_server_classified_as_timeout() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hold = tokio::spawn(async move {
      let (_socket, _) = listener.accept().await.unwrap();
      tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let transport = HttpTransport::new(Duration::from_millis(200)).unwrap();
    let err = transport
      .post(&endpoint(&format!("http://{}", addr)), b"{}")
      .await
      .unwrap_err();

    assert_eq!(err, SyncError::Timeout);
    hold.abort();
  }
}
