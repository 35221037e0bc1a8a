//! Polygon RPC Provider - alloy-rs 0.9 Connection Management
//!
//! Connects to the Polygon PoS chain and exposes a shared, type-erased
//! provider for the read-only wallet status probe. Every RPC call runs
//! over a reqwest client carrying `api.timeout_ms`.

use std::sync::Arc;
use std::time::Duration;

use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::client::RpcClient;
use alloy::transports::http::Http;
use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::config::ApiConfig;

/// Shared Polygon RPC provider backed by alloy-rs 0.9.
///
/// The transport is boxed so the provider fits `dyn Provider`, whose
/// transport parameter defaults to `BoxTransport`.
pub struct PolygonProvider {
    provider: Arc<dyn Provider + Send + Sync>,
}

impl PolygonProvider {
    /// Connect to the configured RPC endpoint and validate the chain ID.
    #[instrument(skip_all)]
    pub async fn connect(config: &ApiConfig) -> Result<Self> {
        let provider = Arc::new(build_provider(config)?);
        let provider: Arc<dyn Provider + Send + Sync> = provider;

        let chain_id = provider
            .get_chain_id()
            .await
            .context("Failed to query chain ID")?;

        if chain_id != config.chain_id {
            anyhow::bail!(
                "Expected chain_id={}, RPC reports {chain_id}",
                config.chain_id
            );
        }

        info!(chain_id, timeout_ms = config.timeout_ms, "Connected to Polygon RPC");

        Ok(Self { provider })
    }

    /// Get a shared reference to the alloy provider (type-erased).
    pub fn inner(&self) -> Arc<dyn Provider + Send + Sync> {
        Arc::clone(&self.provider)
    }

    /// Check if the RPC connection is healthy via a lightweight call.
    pub async fn is_healthy(&self) -> bool {
        self.provider.get_block_number().await.is_ok()
    }
}

/// Root provider over a timed HTTP transport. Makes no network call.
fn build_provider(config: &ApiConfig) -> Result<impl Provider + Send + Sync + 'static> {
    let url = config.rpc_url.parse().context("Invalid RPC URL")?;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .build()
        .context("Failed to build RPC HTTP client")?;

    let client = RpcClient::new(Http::with_client(http, url), false).boxed();
    Ok(ProviderBuilder::new().on_client(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(rpc_url: &str, timeout_ms: u64) -> ApiConfig {
        ApiConfig {
            clob_url: "https://clob.polymarket.com".to_string(),
            rpc_url: rpc_url.to_string(),
            chain_id: 137,
            timeout_ms,
            max_concurrent: 1,
            requests_per_second: 1,
        }
    }

    #[test]
    fn test_rejects_malformed_rpc_url() {
        assert!(build_provider(&api("not a url", 1_000)).is_err());
    }

    #[tokio::test]
    async fn test_rpc_calls_are_bounded_by_timeout() {
        // Accepts the connection but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _hold = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let provider = build_provider(&api(&format!("http://{addr}"), 100)).unwrap();
        let outcome = tokio::time::timeout(Duration::from_secs(5), provider.get_block_number())
            .await
            .expect("rpc call must time out on its own");
        assert!(outcome.is_err());
    }
}
