//! JSON File Secret Repository - Atomic Snapshot Persistence
//!
//! Keeps `secrets.json` and `user_credentials.json` in the data
//! directory. Every mutation rewrites the affected table to a temporary
//! file and renames it into place, so a table file is always either the
//! old or the new version, never a partial write. Rows are ciphertext
//! only; nothing here ever sees a plaintext secret.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::domain::ids::OwnerKey;
use crate::ports::repository::{SecretRecord, SecretRepository};

const SECRETS_FILE: &str = "secrets.json";
const USER_CREDENTIALS_FILE: &str = "user_credentials.json";

/// File-backed credential storage with atomic table rewrites.
pub struct JsonFileSecretRepository {
    dir: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileSecretRepository {
    /// Open (and create if needed) a repository in `data_dir`.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;

        info!(path = %dir.display(), "Credential repository opened");

        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn table_path(&self, owner: &OwnerKey) -> PathBuf {
        match owner {
            OwnerKey::Global(_) => self.dir.join(SECRETS_FILE),
            OwnerKey::User(_) => self.dir.join(USER_CREDENTIALS_FILE),
        }
    }

    fn row_key(owner: &OwnerKey) -> String {
        match owner {
            OwnerKey::Global(name) => name.clone(),
            OwnerKey::User(id) => id.as_str().to_string(),
        }
    }

    async fn load_table<T: DeserializeOwned>(path: &Path) -> Result<BTreeMap<String, T>> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Ok(BTreeMap::new());
        }
        let json = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if json.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
    }

    async fn save_table<T: Serialize>(path: &Path, table: &BTreeMap<String, T>) -> Result<()> {
        let json = serde_json::to_string_pretty(table).context("Failed to serialize table")?;
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to rename {}", tmp.display()))?;

        debug!(path = %path.display(), rows = table.len(), "Table written");
        Ok(())
    }
}

#[async_trait]
impl SecretRepository for JsonFileSecretRepository {
    #[instrument(skip(self, record), fields(owner = %record.owner))]
    async fn upsert(&self, record: SecretRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.table_path(&record.owner);
        let mut table: BTreeMap<String, SecretRecord> = Self::load_table(&path).await?;
        table.insert(Self::row_key(&record.owner), record);
        Self::save_table(&path, &table).await
    }

    async fn fetch(&self, owner: &OwnerKey) -> Result<Option<SecretRecord>> {
        let path = self.table_path(owner);
        let mut table: BTreeMap<String, SecretRecord> = Self::load_table(&path).await?;
        Ok(table.remove(&Self::row_key(owner)))
    }

    #[instrument(skip(self), fields(owner = %owner))]
    async fn remove(&self, owner: &OwnerKey) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let path = self.table_path(owner);
        let mut table: BTreeMap<String, SecretRecord> = Self::load_table(&path).await?;
        let existed = table.remove(&Self::row_key(owner)).is_some();
        if existed {
            Self::save_table(&path, &table).await?;
        }
        Ok(existed)
    }

    async fn is_healthy(&self) -> bool {
        fs::metadata(&self.dir)
            .await
            .map(|m| m.is_dir() && !m.permissions().readonly())
            .unwrap_or(false)
    }
}
