//! Repository Port - Encrypted Credential Persistence
//!
//! The storage engine only ever sees ciphertext. Two logical tables:
//! `secrets(name)` for shared platform credentials and
//! `user_credentials(user_id, address)` for per-user credentials, both
//! keyed by `OwnerKey`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::{OwnerKey, WalletAddress};

/// One encrypted credential row.
///
/// `ciphertext`, `iv` and `auth_tag` are base64 (standard alphabet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
  /// Row key.
  pub owner: OwnerKey,
  /// Bound wallet (user rows only; kept in clear for lookup/audit).
  pub address: Option<WalletAddress>,
  /// AES-256-GCM ciphertext without the tag.
  pub value_encrypted: String,
  /// 96-bit GCM nonce, fresh per encryption.
  pub iv: String,
  /// 128-bit GCM authentication tag.
  pub auth_tag: String,
  /// Last write time.
  pub updated_at: DateTime<Utc>,
}

/// Trait for credential storage engines.
///
/// `upsert` replaces any prior row for the same owner (rotation is
/// overwrite). Durability and indexing are the implementor's concern.
#[async_trait]
pub trait SecretRepository: Send + Sync + 'static {
  /// Insert or replace the row for `record.owner`.
  async fn upsert(&self, record: SecretRecord) -> anyhow::Result<()>;

  /// Fetch the row for an owner, if any.
  async fn fetch(&self, owner: &OwnerKey) -> anyhow::Result<Option<SecretRecord>>;

  /// Remove the row for an owner. Returns whether a row existed.
  async fn remove(&self, owner: &OwnerKey) -> anyhow::Result<bool>;

  /// Check that the engine is usable (disk, permissions).
  async fn is_healthy(&self) -> bool;
}
