//! Polymarket CLOB Gate — Library Root
//!
//! Credential derivation, encrypted storage, HMAC request signing and
//! readiness tracking in front of the Polymarket CLOB. Re-exports all
//! modules for the binary, integration tests and benchmarks.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
