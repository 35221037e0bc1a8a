//! Exchange Transport Port - CLOB HTTP Round-trips
//!
//! The use cases build fully signed requests (method, path, headers, raw
//! body) and hand them to a transport. The transport never inspects or
//! re-serializes the body: the signature covers it byte for byte.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// HTTP verbs used against the CLOB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
  Get,
  Post,
  Delete,
}

impl HttpMethod {
  /// Upper-case verb, as it appears in the signed message.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Get => "GET",
      Self::Post => "POST",
      Self::Delete => "DELETE",
    }
  }
}

/// A signed request ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRequest {
  /// HTTP verb.
  pub method: HttpMethod,
  /// Request path without host or query (the signed path).
  pub path: String,
  /// Header name/value pairs, names exactly as the CLOB expects them.
  pub headers: Vec<(&'static str, String)>,
  /// Raw JSON body; `None` for bodyless requests.
  pub body: Option<String>,
}

impl ExchangeRequest {
  /// Header value by exact name.
  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(n, _)| *n == name)
      .map(|(_, v)| v.as_str())
  }
}

/// Whatever the exchange answered, any status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeResponse {
  /// HTTP status code.
  pub status: u16,
  /// Raw response text.
  pub body: String,
}

impl ExchangeResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// The request never produced an HTTP status.
#[derive(Debug, Error)]
pub enum TransportError {
  #[error("upstream timed out after {0:?}")]
  Timeout(Duration),
  #[error("upstream unreachable: {0}")]
  Connect(String),
}

/// Trait for CLOB transports.
///
/// Every call must have a bounded wait; a timeout is reported as
/// `TransportError::Timeout`, never as a hang.
#[async_trait]
pub trait ExchangeTransport: Send + Sync + 'static {
  /// Send one request and return the raw response.
  async fn execute(&self, request: ExchangeRequest) -> Result<ExchangeResponse, TransportError>;

  /// Check if the CLOB is reachable.
  async fn is_healthy(&self) -> bool;
}
