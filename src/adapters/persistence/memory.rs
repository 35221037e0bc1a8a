//! In-memory Secret Repository
//!
//! Two maps behind one tokio `RwLock`, mirroring the `secrets` and
//! `user_credentials` tables. Used for development and tests; contents
//! are lost on restart.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ids::{OwnerKey, UserId};
use crate::ports::repository::{SecretRecord, SecretRepository};

#[derive(Default)]
struct Tables {
    secrets: HashMap<String, SecretRecord>,
    user_credentials: HashMap<UserId, SecretRecord>,
}

/// Process-local credential storage.
#[derive(Default)]
pub struct InMemorySecretRepository {
    tables: RwLock<Tables>,
}

impl InMemorySecretRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows across both tables.
    pub async fn len(&self) -> usize {
        let tables = self.tables.read().await;
        tables.secrets.len() + tables.user_credentials.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SecretRepository for InMemorySecretRepository {
    async fn upsert(&self, record: SecretRecord) -> Result<()> {
        let mut tables = self.tables.write().await;
        match &record.owner {
            OwnerKey::Global(name) => {
                tables.secrets.insert(name.clone(), record);
            }
            OwnerKey::User(id) => {
                tables.user_credentials.insert(id.clone(), record);
            }
        }
        Ok(())
    }

    async fn fetch(&self, owner: &OwnerKey) -> Result<Option<SecretRecord>> {
        let tables = self.tables.read().await;
        Ok(match owner {
            OwnerKey::Global(name) => tables.secrets.get(name).cloned(),
            OwnerKey::User(id) => tables.user_credentials.get(id).cloned(),
        })
    }

    async fn remove(&self, owner: &OwnerKey) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(match owner {
            OwnerKey::Global(name) => tables.secrets.remove(name).is_some(),
            OwnerKey::User(id) => tables.user_credentials.remove(id).is_some(),
        })
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
