//! Configuration Module - TOML Settings plus Environment Secrets
//!
//! `AppConfig` is parsed once from `config.toml` and passed by reference
//! into constructors. The two secrets (master key, admin token) come only
//! from the environment and are read once at startup into `Secrets`;
//! nothing reads ambient state after that.

pub mod loader;

use std::fmt;

use serde::Deserialize;

/// Environment variable holding the credential encryption master key.
pub const MASTER_KEY_ENV: &str = "CLOB_GATE_MASTER_KEY";
/// Environment variable holding the admin token.
pub const ADMIN_TOKEN_ENV: &str = "CLOB_GATE_ADMIN_TOKEN";

/// Top-level gate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Service identity and listener.
  pub service: ServiceConfig,
  /// Polymarket CLOB and Polygon RPC endpoints.
  pub api: ApiConfig,
  /// Exchange contract addresses for the readiness probe.
  pub contracts: ContractsConfig,
  /// Credential storage backend.
  #[serde(default)]
  pub persistence: PersistenceConfig,
  /// Jurisdiction deny-list.
  #[serde(default)]
  pub geoblock: GeoblockConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
  /// Readiness polling.
  #[serde(default)]
  pub readiness: ReadinessConfig,
  /// Shared platform credential.
  #[serde(default)]
  pub credentials: CredentialsConfig,
}

/// Deployment posture. Only `Development` relaxes the admin check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
  Production,
  Development,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  /// Human-readable service name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Deployment posture.
  #[serde(default = "default_environment")]
  pub environment: Environment,
  /// Operation surface bind address.
  #[serde(default = "default_bind_address")]
  pub bind_address: String,
  /// Health check endpoint port.
  #[serde(default = "default_health_port")]
  pub health_port: u16,
}

/// API endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// CLOB REST API base URL.
  pub clob_url: String,
  /// Polygon RPC endpoint.
  pub rpc_url: String,
  /// Expected chain ID (137 = Polygon mainnet).
  #[serde(default = "default_chain_id")]
  pub chain_id: u64,
  /// Per-request upstream timeout in milliseconds.
  #[serde(default = "default_timeout_ms")]
  pub timeout_ms: u64,
  /// Maximum concurrent CLOB requests.
  #[serde(default = "default_max_concurrent")]
  pub max_concurrent: usize,
  /// Sustained CLOB request rate.
  #[serde(default = "default_requests_per_second")]
  pub requests_per_second: u32,
}

/// Contract addresses (checksummed hex strings).
#[derive(Debug, Clone, Deserialize)]
pub struct ContractsConfig {
  pub usdc: String,
  pub ctf: String,
  pub ctf_exchange: String,
  pub neg_risk_exchange: String,
  pub neg_risk_adapter: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
  /// Process-lifetime maps. Development and tests only.
  Memory,
  /// JSON snapshots under `data_dir`.
  #[default]
  File,
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  #[serde(default)]
  pub backend: StorageBackend,
  /// Directory for `secrets.json` and `user_credentials.json`.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      backend: StorageBackend::default(),
      data_dir: default_data_dir(),
    }
  }
}

/// Geoblock configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoblockConfig {
  /// Header carrying the ISO 3166 country code set by the edge.
  #[serde(default = "default_country_header")]
  pub country_header: String,
  /// Denied country codes.
  #[serde(default)]
  pub denied: Vec<String>,
}

impl Default for GeoblockConfig {
  fn default() -> Self {
    Self {
      country_header: default_country_header(),
      denied: Vec::new(),
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: default_metrics_addr(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadinessConfig {
  /// Interval between refreshes in `wait_until`.
  #[serde(default = "default_poll_interval_ms")]
  pub poll_interval_ms: u64,
}

impl Default for ReadinessConfig {
  fn default() -> Self {
    Self {
      poll_interval_ms: default_poll_interval_ms(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
  /// Row name of the shared platform credential in `secrets`.
  #[serde(default = "default_global_name")]
  pub global_name: String,
}

impl Default for CredentialsConfig {
  fn default() -> Self {
    Self {
      global_name: default_global_name(),
    }
  }
}

/// Secrets read from the environment once at startup.
///
/// Either may be absent; operations that need a missing one fail with a
/// configuration error instead of the process refusing to start.
#[derive(Clone, Default)]
pub struct Secrets {
  pub master_key: Option<String>,
  pub admin_token: Option<String>,
}

impl Secrets {
  pub fn from_env() -> Self {
    let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
    Self {
      master_key: read(MASTER_KEY_ENV),
      admin_token: read(ADMIN_TOKEN_ENV),
    }
  }
}

impl fmt::Debug for Secrets {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Secrets")
      .field("master_key", &self.master_key.as_ref().map(|_| "***"))
      .field("admin_token", &self.admin_token.as_ref().map(|_| "***"))
      .finish()
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_environment() -> Environment {
  Environment::Production
}

fn default_bind_address() -> String {
  "0.0.0.0:8080".to_string()
}

fn default_health_port() -> u16 {
  8081
}

fn default_chain_id() -> u64 {
  137
}

fn default_timeout_ms() -> u64 {
  10_000
}

fn default_max_concurrent() -> usize {
  10
}

fn default_requests_per_second() -> u32 {
  20
}

fn default_data_dir() -> String {
  "data".to_string()
}

fn default_country_header() -> String {
  "cf-ipcountry".to_string()
}

fn default_true() -> bool {
  true
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_poll_interval_ms() -> u64 {
  3_000
}

fn default_global_name() -> String {
  "clob_api".to_string()
}
