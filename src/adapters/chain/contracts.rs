//! Exchange Contract Addresses - Parsed from `[contracts]`
//!
//! The probe needs the collateral token, the CTF token and every
//! exchange contract that pulls from a proxy wallet. Addresses are never
//! hardcoded; they are parsed once from config.

use alloy::primitives::Address;
use anyhow::{Context, Result};

use crate::config::ContractsConfig;

/// Polygon contract addresses used by the readiness checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    /// USDC.e collateral token.
    pub usdc: Address,
    /// Conditional Tokens (ERC-1155).
    pub ctf: Address,
    /// CTF Exchange.
    pub ctf_exchange: Address,
    /// Neg Risk CTF Exchange.
    pub neg_risk_exchange: Address,
    /// Neg Risk Adapter.
    pub neg_risk_adapter: Address,
}

impl ContractAddresses {
    pub fn from_config(config: &ContractsConfig) -> Result<Self> {
        let parse = |name: &str, raw: &str| -> Result<Address> {
            raw.parse::<Address>()
                .with_context(|| format!("Invalid {name} address: {raw}"))
        };

        Ok(Self {
            usdc: parse("usdc", &config.usdc)?,
            ctf: parse("ctf", &config.ctf)?,
            ctf_exchange: parse("ctf_exchange", &config.ctf_exchange)?,
            neg_risk_exchange: parse("neg_risk_exchange", &config.neg_risk_exchange)?,
            neg_risk_adapter: parse("neg_risk_adapter", &config.neg_risk_adapter)?,
        })
    }

    /// Contracts that must be allowed to move the wallet's USDC and CTF
    /// positions before an order can match.
    pub fn spenders(&self) -> [(&'static str, Address); 3] {
        [
            ("CTF Exchange", self.ctf_exchange),
            ("NegRisk Exchange", self.neg_risk_exchange),
            ("NegRisk Adapter", self.neg_risk_adapter),
        ]
    }
}
