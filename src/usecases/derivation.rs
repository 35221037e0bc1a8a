//! Credential Derivation - Wallet Signature to L2 Credential
//!
//! Presents an L1 proof to the CLOB, first against the idempotent derive
//! endpoint and, only if that fails, against the create endpoint. The
//! resulting triple is bound to the signing wallet and written through
//! the `CredentialStore`. An operator import path stores known
//! credentials without contacting the exchange.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::adapters::api::auth::L1Headers;
use crate::adapters::api::types::{ApiKeyResponse, CREATE_API_KEY_PATH, DERIVE_API_KEY_PATH};
use crate::domain::credential::{Credential, CredentialTriple};
use crate::domain::error::{truncate_body, GateError};
use crate::domain::ids::{ApiKey, OwnerKey, WalletAddress};
use crate::domain::order::lenient_string;
use crate::ports::exchange::{ExchangeRequest, ExchangeTransport, HttpMethod};

use super::credential_store::CredentialStore;

/// L1 proof supplied by the client: a wallet signature over the fixed
/// auth message, plus the timestamp and nonce that were signed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L1Proof {
  pub address: WalletAddress,
  pub signature: String,
  #[serde(deserialize_with = "lenient_string")]
  pub timestamp: String,
  #[serde(default = "default_nonce", deserialize_with = "lenient_string")]
  pub nonce: String,
}

fn default_nonce() -> String {
  "0".to_string()
}

impl L1Proof {
  fn headers(&self) -> Vec<(&'static str, String)> {
    L1Headers {
      address: self.address.clone(),
      signature: self.signature.clone(),
      timestamp: self.timestamp.clone(),
      nonce: self.nonce.clone(),
    }
    .into_pairs()
  }

  fn validate(&self) -> Result<(), GateError> {
    if self.signature.trim().is_empty() {
      return Err(GateError::Validation("signature must not be empty".to_string()));
    }
    if self.timestamp.trim().is_empty() {
      return Err(GateError::Validation("timestamp must not be empty".to_string()));
    }
    Ok(())
  }
}

/// How a stored credential was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
  Derived,
  Created,
  Imported,
}

impl CredentialSource {
  /// Metric label.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Derived => "derive",
      Self::Created => "create",
      Self::Imported => "import",
    }
  }
}

/// Outcome of a successful derivation or import. No secret material.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredential {
  pub api_key: ApiKey,
  pub address: Option<WalletAddress>,
  pub updated_at: DateTime<Utc>,
  pub source: CredentialSource,
  pub placeholder: bool,
}

/// Result of a signature-validity probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthProbe {
  pub ok: bool,
  pub status: Option<u16>,
}

/// One failed upstream attempt, already truncated.
#[derive(Debug, Clone)]
struct AttemptFailure {
  status: Option<u16>,
  body: String,
}

pub struct CredentialDerivation {
  transport: Arc<dyn ExchangeTransport>,
  store: Arc<CredentialStore>,
}

impl CredentialDerivation {
  pub fn new(transport: Arc<dyn ExchangeTransport>, store: Arc<CredentialStore>) -> Self {
    Self { transport, store }
  }

  /// Derive (or create) a credential for `proof.address` and store it
  /// under `owner`.
  #[instrument(skip(self, proof), fields(owner = %owner, address = %proof.address))]
  pub async fn derive(&self, owner: &OwnerKey, proof: L1Proof) -> Result<StoredCredential, GateError> {
    proof.validate()?;
    // fail before any upstream call if storage cannot encrypt
    self.store.cipher()?;

    let (triple, source) = match self.attempt(HttpMethod::Get, DERIVE_API_KEY_PATH, &proof).await {
      Ok(triple) => (triple, CredentialSource::Derived),
      Err(derive) => {
        info!(
          status = ?derive.status,
          "Derive failed, falling back to create"
        );
        match self.attempt(HttpMethod::Post, CREATE_API_KEY_PATH, &proof).await {
          Ok(triple) => (triple, CredentialSource::Created),
          Err(create) => {
            warn!(
              derive_status = ?derive.status,
              create_status = ?create.status,
              "Credential derivation failed"
            );
            return Err(GateError::DerivationFailed {
              derive_status: derive.status,
              derive_body: derive.body,
              create_status: create.status,
              create_body: create.body,
            });
          }
        }
      }
    };

    let credential = Credential::real(triple, Some(proof.address.clone()));
    let updated_at = self.store.put(owner, &credential).await?;

    info!(
      api_key = %credential.bound().api_key(),
      source = source.as_str(),
      "Credential derived"
    );

    Ok(StoredCredential {
      api_key: credential.bound().api_key().clone(),
      address: Some(proof.address),
      updated_at,
      source,
      placeholder: false,
    })
  }

  /// Store operator-supplied credentials as-is (after field validation).
  #[instrument(skip(self, triple), fields(owner = %owner))]
  pub async fn import(
    &self,
    owner: &OwnerKey,
    triple: CredentialTriple,
    address: Option<WalletAddress>,
    placeholder: bool,
  ) -> Result<StoredCredential, GateError> {
    let credential = if placeholder {
      Credential::placeholder(triple, address.clone())
    } else {
      Credential::real(triple, address.clone())
    };
    let updated_at = self.store.put(owner, &credential).await?;

    info!(api_key = %credential.bound().api_key(), "Credential imported");

    Ok(StoredCredential {
      api_key: credential.bound().api_key().clone(),
      address,
      updated_at,
      source: CredentialSource::Imported,
      placeholder,
    })
  }

  /// Check whether the exchange accepts an L1 proof. Stores nothing.
  #[instrument(skip(self, proof), fields(address = %proof.address))]
  pub async fn probe(&self, proof: &L1Proof) -> Result<AuthProbe, GateError> {
    proof.validate()?;
    let request = ExchangeRequest {
      method: HttpMethod::Get,
      path: DERIVE_API_KEY_PATH.to_string(),
      headers: proof.headers(),
      body: None,
    };

    Ok(match self.transport.execute(request).await {
      Ok(response) => AuthProbe {
        ok: response.is_success(),
        status: Some(response.status),
      },
      Err(e) => {
        warn!(error = %e, "Auth probe did not reach the exchange");
        AuthProbe { ok: false, status: None }
      }
    })
  }

  async fn attempt(
    &self,
    method: HttpMethod,
    path: &str,
    proof: &L1Proof,
  ) -> Result<CredentialTriple, AttemptFailure> {
    let request = ExchangeRequest {
      method,
      path: path.to_string(),
      headers: proof.headers(),
      body: None,
    };

    let response = self.transport.execute(request).await.map_err(|e| AttemptFailure {
      status: None,
      body: truncate_body(&e.to_string()),
    })?;

    if !response.is_success() {
      return Err(AttemptFailure {
        status: Some(response.status),
        body: truncate_body(&response.body),
      });
    }

    serde_json::from_str::<ApiKeyResponse>(&response.body)
      .map_err(|e| e.to_string())
      .and_then(|parsed| parsed.into_triple().map_err(|e| e.to_string()))
      .map_err(|reason| AttemptFailure {
        status: Some(response.status),
        body: truncate_body(&format!("unusable credential response: {reason}")),
      })
  }
}
