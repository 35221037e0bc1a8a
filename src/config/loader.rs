//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;
use crate::adapters::chain::ContractAddresses;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    environment = ?config.service.environment,
    backend = ?config.persistence.backend,
    denied = config.geoblock.denied.len(),
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    !config.service.name.trim().is_empty(),
    "service.name must not be empty"
  );

  // API validation
  anyhow::ensure!(
    config.api.clob_url.starts_with("http://") || config.api.clob_url.starts_with("https://"),
    "api.clob_url must be an http(s) URL, got {}",
    config.api.clob_url
  );
  anyhow::ensure!(
    !config.api.clob_url.ends_with('/'),
    "api.clob_url must not end with '/' (paths are appended verbatim)"
  );
  anyhow::ensure!(!config.api.rpc_url.is_empty(), "api.rpc_url must not be empty");
  anyhow::ensure!(
    config.api.timeout_ms > 0 && config.api.timeout_ms <= 60_000,
    "api.timeout_ms must be in (0, 60000], got {}",
    config.api.timeout_ms
  );
  anyhow::ensure!(
    config.api.max_concurrent > 0,
    "api.max_concurrent must be positive"
  );
  anyhow::ensure!(
    config.api.requests_per_second > 0,
    "api.requests_per_second must be positive"
  );

  ContractAddresses::from_config(&config.contracts)?;

  // Geoblock validation
  anyhow::ensure!(
    !config.geoblock.country_header.trim().is_empty(),
    "geoblock.country_header must not be empty"
  );
  for code in &config.geoblock.denied {
    anyhow::ensure!(
      code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()),
      "geoblock.denied entries must be ISO 3166 alpha-2 codes, got {code:?}"
    );
  }

  anyhow::ensure!(
    config.readiness.poll_interval_ms >= 500,
    "readiness.poll_interval_ms must be at least 500, got {}",
    config.readiness.poll_interval_ms
  );
  anyhow::ensure!(
    !config.credentials.global_name.trim().is_empty(),
    "credentials.global_name must not be empty"
  );

  Ok(())
}
