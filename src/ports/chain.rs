//! Wallet Status Port - On-chain Readiness Facts
//!
//! Proxy deployment and token approvals are performed by the user's
//! wallet; this port only observes their outcome on Polygon.

use async_trait::async_trait;

use crate::domain::ids::WalletAddress;

/// Trait for on-chain wallet status lookups.
#[async_trait]
pub trait WalletStatusProbe: Send + Sync + 'static {
  /// Whether contract code exists at the proxy wallet address.
  async fn is_proxy_deployed(&self, proxy: &WalletAddress) -> anyhow::Result<bool>;

  /// Whether USDC allowances and CTF operator approvals are in place
  /// for every exchange contract.
  async fn tokens_approved(&self, proxy: &WalletAddress) -> anyhow::Result<bool>;

  /// Check if the RPC connection is healthy.
  async fn is_healthy(&self) -> bool;
}
