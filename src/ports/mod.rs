//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the use cases require from the
//! outside world. Adapters implement these traits; tests mock them.
//!
//! Port categories:
//! - `SecretRepository`: encrypted credential rows (storage engine)
//! - `ExchangeTransport`: HTTP round-trips to the CLOB
//! - `WalletStatusProbe`: on-chain proxy deployment and approval facts
//! - `JurisdictionPolicy`: geoblock predicate over the request context

pub mod chain;
pub mod exchange;
pub mod jurisdiction;
pub mod repository;
