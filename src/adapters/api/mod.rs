//! Polymarket CLOB API Adapter
//!
//! HTTP access to the Polymarket Central Limit Order Book (CLOB) REST
//! API for key derivation and order management.
//!
//! Sub-modules:
//! - `auth`: L1/L2 header construction and HMAC request signing
//! - `client`: reqwest transport with timeout, concurrency and rate limits
//! - `types`: endpoint paths and request/response types

pub mod auth;
pub mod client;
pub mod types;
