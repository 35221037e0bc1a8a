//! Credential Store - Encrypted-at-rest Credential Persistence
//!
//! Every credential is serialized to its JSON payload, sealed with
//! `SecretCipher` and written as a ciphertext row. Reads decrypt on the
//! fly; plaintext secrets never reach the repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::adapters::persistence::cipher::{SealedSecret, SecretCipher};
use crate::config::MASTER_KEY_ENV;
use crate::domain::credential::{Credential, CredentialPayload};
use crate::domain::error::GateError;
use crate::domain::ids::OwnerKey;
use crate::ports::repository::{SecretRecord, SecretRepository};

/// Presence check result. Never carries secret material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPresence {
  pub present: bool,
  pub updated_at: Option<DateTime<Utc>>,
}

fn storage_error(err: anyhow::Error) -> GateError {
  GateError::Storage(format!("{err:#}"))
}

/// Sole owner of encrypted credential rows.
pub struct CredentialStore {
  /// Storage engine (ciphertext only).
  repository: Arc<dyn SecretRepository>,
  /// `None` when no master key is configured.
  cipher: Option<SecretCipher>,
}

impl CredentialStore {
  pub fn new(repository: Arc<dyn SecretRepository>, master_key: Option<&str>) -> Self {
    Self {
      repository,
      cipher: master_key.map(SecretCipher::new),
    }
  }

  /// The cipher, or a configuration error when no master key is set.
  pub fn cipher(&self) -> Result<&SecretCipher, GateError> {
    self
      .cipher
      .as_ref()
      .ok_or_else(|| GateError::Config(format!("{MASTER_KEY_ENV} is not set")))
  }

  /// Encrypt and upsert a credential. Returns the write time.
  #[instrument(skip(self, credential), fields(owner = %owner))]
  pub async fn put(&self, owner: &OwnerKey, credential: &Credential) -> Result<DateTime<Utc>, GateError> {
    let cipher = self.cipher()?;

    let payload = serde_json::to_string(&credential.to_payload())
      .map_err(|e| GateError::Storage(format!("credential serialization failed: {e}")))?;
    let (value_encrypted, iv, auth_tag) = cipher
      .encrypt(&payload)
      .map_err(|e| GateError::Storage(e.to_string()))?
      .encode();

    let updated_at = Utc::now();
    let address = match owner {
      OwnerKey::User(_) => credential.bound().address.clone(),
      OwnerKey::Global(_) => None,
    };

    self
      .repository
      .upsert(SecretRecord {
        owner: owner.clone(),
        address,
        value_encrypted,
        iv,
        auth_tag,
        updated_at,
      })
      .await
      .map_err(storage_error)?;

    info!(
      api_key = %credential.bound().api_key(),
      placeholder = credential.is_placeholder(),
      "Credential stored"
    );
    Ok(updated_at)
  }

  /// Load and decrypt the credential for an owner.
  ///
  /// A record that fails authentication is reported and left in place.
  #[instrument(skip(self), fields(owner = %owner))]
  pub async fn get(&self, owner: &OwnerKey) -> Result<Credential, GateError> {
    let cipher = self.cipher()?;

    let record = self
      .repository
      .fetch(owner)
      .await
      .map_err(storage_error)?
      .ok_or_else(|| GateError::NotFound(owner.to_string()))?;

    let decryption_failed = || GateError::Decryption {
      owner: owner.to_string(),
    };

    let sealed = SealedSecret::decode(&record.value_encrypted, &record.iv, &record.auth_tag)
      .map_err(|e| {
        warn!(error = %e, "Stored credential row is malformed");
        decryption_failed()
      })?;
    let plaintext = cipher.decrypt(&sealed).map_err(|e| {
      warn!(error = %e, "Stored credential failed authentication");
      decryption_failed()
    })?;
    let payload: CredentialPayload = serde_json::from_str(&plaintext).map_err(|e| {
      warn!(error = %e, "Decrypted credential payload is not valid JSON");
      decryption_failed()
    })?;

    let mut credential = Credential::from_payload(payload, record.updated_at);
    if credential.bound().address.is_none() {
      if let Some(address) = record.address {
        credential = rebind(credential, address);
      }
    }

    debug!(placeholder = credential.is_placeholder(), "Credential loaded");
    Ok(credential)
  }

  /// Remove the credential for an owner. Returns whether one existed.
  #[instrument(skip(self), fields(owner = %owner))]
  pub async fn delete(&self, owner: &OwnerKey) -> Result<bool, GateError> {
    let removed = self.repository.remove(owner).await.map_err(storage_error)?;
    if removed {
      info!("Credential deleted");
    }
    Ok(removed)
  }

  /// Whether a credential row exists. Does not decrypt.
  pub async fn has_creds(&self, owner: &OwnerKey) -> Result<CredentialPresence, GateError> {
    let record = self.repository.fetch(owner).await.map_err(storage_error)?;
    Ok(CredentialPresence {
      present: record.is_some(),
      updated_at: record.map(|r| r.updated_at),
    })
  }
}

/// Fill in the wallet binding kept in the row's clear `address` column.
fn rebind(credential: Credential, address: crate::domain::ids::WalletAddress) -> Credential {
  match credential {
    Credential::Real(mut bound) => {
      bound.address = Some(address);
      Credential::Real(bound)
    }
    Credential::Placeholder(mut bound) => {
      bound.address = Some(address);
      Credential::Placeholder(bound)
    }
  }
}
