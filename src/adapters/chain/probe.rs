//! On-chain Wallet Probe - Proxy Deployment and Approval Checks
//!
//! Implements the `WalletStatusProbe` port with raw `eth_call`s:
//! - deployed: `eth_getCode(proxy)` is non-empty
//! - approved: USDC `allowance(proxy, spender) > 0` and CTF
//!   `isApprovedForAll(proxy, spender)` for every exchange spender
//!
//! Every read hits the chain; nothing is cached between calls.

use std::sync::Arc;

use alloy::primitives::{keccak256, Address, Bytes, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::domain::ids::WalletAddress;
use crate::ports::chain::WalletStatusProbe;

use super::contracts::ContractAddresses;
use super::provider::PolygonProvider;

/// ABI-encode a call whose arguments are all addresses.
pub fn encode_address_call(signature: &str, args: &[Address]) -> Bytes {
    let mut calldata = Vec::with_capacity(4 + 32 * args.len());
    calldata.extend_from_slice(&keccak256(signature.as_bytes())[..4]);
    for arg in args {
        let mut padded = [0u8; 32];
        padded[12..].copy_from_slice(arg.as_slice());
        calldata.extend_from_slice(&padded);
    }
    Bytes::from(calldata)
}

/// First 32-byte return word as an unsigned integer.
fn decode_word(output: &[u8]) -> Result<U256> {
    anyhow::ensure!(
        output.len() >= 32,
        "eth_call returned {} bytes, expected at least 32",
        output.len()
    );
    Ok(U256::from_be_slice(&output[..32]))
}

/// Read-only readiness probe over a Polygon RPC provider.
pub struct ChainWalletProbe {
    provider: Arc<PolygonProvider>,
    addresses: ContractAddresses,
}

impl ChainWalletProbe {
    pub fn new(provider: Arc<PolygonProvider>, addresses: ContractAddresses) -> Self {
        Self {
            provider,
            addresses,
        }
    }

    async fn call_word(&self, to: Address, signature: &str, args: &[Address]) -> Result<U256> {
        let tx = TransactionRequest::default()
            .to(to)
            .input(encode_address_call(signature, args).into());

        let output = self
            .provider
            .inner()
            .call(&tx)
            .await
            .with_context(|| format!("eth_call {signature} on {to} failed"))?;

        decode_word(&output)
    }
}

fn to_address(wallet: &WalletAddress) -> Result<Address> {
    wallet
        .as_str()
        .parse()
        .with_context(|| format!("Invalid wallet address: {wallet}"))
}

#[async_trait]
impl WalletStatusProbe for ChainWalletProbe {
    #[instrument(skip(self), fields(proxy = %proxy))]
    async fn is_proxy_deployed(&self, proxy: &WalletAddress) -> Result<bool> {
        let code = self
            .provider
            .inner()
            .get_code_at(to_address(proxy)?)
            .await
            .context("eth_getCode failed")?;

        debug!(code_len = code.len(), "Proxy code checked");
        Ok(!code.is_empty())
    }

    #[instrument(skip(self), fields(proxy = %proxy))]
    async fn tokens_approved(&self, proxy: &WalletAddress) -> Result<bool> {
        let owner = to_address(proxy)?;

        for (name, spender) in self.addresses.spenders() {
            let allowance = self
                .call_word(
                    self.addresses.usdc,
                    "allowance(address,address)",
                    &[owner, spender],
                )
                .await?;
            if allowance.is_zero() {
                debug!(spender = name, "USDC allowance missing");
                return Ok(false);
            }

            let approved = self
                .call_word(
                    self.addresses.ctf,
                    "isApprovedForAll(address,address)",
                    &[owner, spender],
                )
                .await?;
            if approved.is_zero() {
                debug!(spender = name, "CTF operator approval missing");
                return Ok(false);
            }
        }

        Ok(true)
    }

    async fn is_healthy(&self) -> bool {
        self.provider.is_healthy().await
    }
}
