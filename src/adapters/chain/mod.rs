//! Chain Adapters - Polygon Blockchain Interaction Layer
//!
//! Read-only on-chain access via alloy-rs 0.9:
//! - RPC provider with chain ID validation
//! - Exchange contract addresses from config
//! - Proxy deployment and token approval probe

pub mod contracts;
pub mod probe;
pub mod provider;

pub use contracts::ContractAddresses;
pub use probe::ChainWalletProbe;
pub use provider::PolygonProvider;
