//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP clients, blockchain RPC, file I/O) and
//! serves the operation surface. Each sub-module groups adapters by
//! infrastructure concern.
//!
//! Adapter categories:
//! - `api`: Polymarket CLOB REST transport, request signing, wire types
//! - `chain`: Polygon wallet status probe via alloy-rs
//! - `http`: axum operation surface, extractors, geoblock policy
//! - `metrics`: Prometheus metrics export and health checks
//! - `persistence`: AES-GCM cipher and credential repositories

pub mod api;
pub mod chain;
pub mod http;
pub mod metrics;
pub mod persistence;
