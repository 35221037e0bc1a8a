//! CLOB HTTP Client - Rate-limited REST Transport
//!
//! Implements the `ExchangeTransport` port with reqwest. Every request
//! passes a concurrency semaphore and a governor rate limiter, and is sent
//! exactly once: order placement is not idempotent, so retry decisions
//! belong to the caller. The configured timeout covers the whole call,
//! queueing included.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::adapters::metrics::GateMetrics;
use crate::ports::exchange::{
  ExchangeRequest, ExchangeResponse, ExchangeTransport, HttpMethod, TransportError,
};

/// Configuration for the CLOB HTTP client.
#[derive(Debug, Clone)]
pub struct ClobClientConfig {
  /// Base URL for the CLOB API.
  pub base_url: String,
  /// Per-call timeout (queueing, connect and response body).
  pub timeout: Duration,
  /// Maximum concurrent requests.
  pub max_concurrent: usize,
  /// Sustained request rate towards the CLOB.
  pub requests_per_second: u32,
}

impl Default for ClobClientConfig {
  fn default() -> Self {
    Self {
      base_url: "https://clob.polymarket.com".to_string(),
      timeout: Duration::from_secs(10),
      max_concurrent: 10,
      requests_per_second: 20,
    }
  }
}

/// reqwest-backed transport for the Polymarket CLOB API.
pub struct ClobClient {
  /// Underlying HTTP client.
  http: Client,
  /// Client configuration.
  config: ClobClientConfig,
  /// Concurrency limiter.
  semaphore: Arc<Semaphore>,
  /// Request rate limiter.
  limiter: DefaultDirectRateLimiter,
  /// Optional latency/outcome metrics.
  metrics: Option<Arc<GateMetrics>>,
}

impl ClobClient {
  /// Create a new CLOB client.
  pub fn new(config: ClobClientConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(5)
      .build()
      .context("Failed to build HTTP client")?;

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
    let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
    let limiter = RateLimiter::direct(Quota::per_second(rate));

    Ok(Self {
      http,
      config,
      semaphore,
      limiter,
      metrics: None,
    })
  }

  /// Record upstream latency into the given registry.
  pub fn with_metrics(mut self, metrics: Arc<GateMetrics>) -> Self {
    self.metrics = Some(metrics);
    self
  }

  fn map_error(&self, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
      TransportError::Timeout(self.config.timeout)
    } else {
      TransportError::Connect(err.to_string())
    }
  }

  /// Wait for a permit and a rate slot, then send once.
  async fn send_once(&self, request: &ExchangeRequest) -> Result<ExchangeResponse, TransportError> {
    let url = format!("{}{}", self.config.base_url, request.path);

    let mut builder = match request.method {
      HttpMethod::Get => self.http.get(&url),
      HttpMethod::Post => self.http.post(&url),
      HttpMethod::Delete => self.http.delete(&url),
    };
    for (name, value) in &request.headers {
      builder = builder.header(*name, value);
    }
    if let Some(body) = &request.body {
      builder = builder.header(CONTENT_TYPE, "application/json").body(body.clone());
    }

    let _permit = self
      .semaphore
      .acquire()
      .await
      .map_err(|_| TransportError::Connect("transport shut down".to_string()))?;
    self.limiter.until_ready().await;

    let response = builder.send().await.map_err(|e| self.map_error(e))?;
    let status = response.status().as_u16();
    response
      .text()
      .await
      .map(|body| ExchangeResponse { status, body })
      .map_err(|e| self.map_error(e))
  }
}

#[async_trait]
impl ExchangeTransport for ClobClient {
  async fn execute(&self, request: ExchangeRequest) -> Result<ExchangeResponse, TransportError> {
    let started = Instant::now();
    let outcome = tokio::time::timeout(self.config.timeout, self.send_once(&request))
      .await
      .unwrap_or(Err(TransportError::Timeout(self.config.timeout)));
    let elapsed = started.elapsed();

    if let Some(metrics) = &self.metrics {
      metrics.observe_upstream(&request.path, elapsed);
    }

    match &outcome {
      Ok(resp) => debug!(
        method = request.method.as_str(),
        path = %request.path,
        status = resp.status,
        elapsed_ms = elapsed.as_millis() as u64,
        "CLOB response"
      ),
      Err(e) => warn!(
        method = request.method.as_str(),
        path = %request.path,
        error = %e,
        "CLOB request failed"
      ),
    }

    outcome
  }

  async fn is_healthy(&self) -> bool {
    let probe = self
      .http
      .get(format!("{}/time", self.config.base_url))
      .send()
      .await;
    matches!(probe, Ok(r) if r.status().is_success())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_unreachable_host_is_transport_error() {
    let client = ClobClient::new(ClobClientConfig {
      base_url: "http://127.0.0.1:9".to_string(),
      timeout: Duration::from_millis(500),
      max_concurrent: 1,
      requests_per_second: 5,
    })
    .unwrap();

    let result = client
      .execute(ExchangeRequest {
        method: HttpMethod::Get,
        path: "/time".to_string(),
        headers: Vec::new(),
        body: None,
      })
      .await;
    assert!(result.is_err());
  }

  #[tokio::test]
  async fn test_rate_limit_wait_counts_against_timeout() {
    let timeout = Duration::from_millis(200);
    let client = ClobClient::new(ClobClientConfig {
      base_url: "http://127.0.0.1:9".to_string(),
      timeout,
      max_concurrent: 1,
      requests_per_second: 1,
    })
    .unwrap();
    let request = || ExchangeRequest {
      method: HttpMethod::Get,
      path: "/time".to_string(),
      headers: Vec::new(),
      body: None,
    };

    // Spends the only slot in this second.
    let _ = client.execute(request()).await;

    let started = Instant::now();
    let result = client.execute(request()).await;
    assert!(matches!(result, Err(TransportError::Timeout(t)) if t == timeout));
    assert!(started.elapsed() < Duration::from_millis(800));
  }

  #[test]
  fn test_zero_rate_is_clamped() {
    let client = ClobClient::new(ClobClientConfig {
      requests_per_second: 0,
      max_concurrent: 0,
      ..ClobClientConfig::default()
    });
    assert!(client.is_ok());
  }
}
