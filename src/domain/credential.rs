//! L2 credential types.
//!
//! A `CredentialTriple` is what the exchange hands back from key
//! derivation. What we persist (encrypted) is a `CredentialPayload`: the
//! triple plus the wallet it is bound to and a creation time. Synthetic
//! credentials used only to exercise storage carry `note: "placeholder"`
//! in the payload and surface as `Credential::Placeholder`, which cannot
//! be turned into signing material.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::GateError;
use super::ids::{ApiKey, WalletAddress};

/// Note value that marks a synthetic credential.
pub const PLACEHOLDER_NOTE: &str = "placeholder";

/// HMAC key material as issued by the exchange (base64, possibly URL-safe).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiSecret(String);

impl ApiSecret {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecret(***)")
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Passphrase(String);

impl Passphrase {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(***)")
    }
}

/// API key / secret / passphrase as returned by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialTriple {
    pub api_key: ApiKey,
    pub secret: ApiSecret,
    pub passphrase: Passphrase,
}

impl CredentialTriple {
    /// Build a triple from raw strings, rejecting empty fields.
    pub fn from_parts(api_key: &str, secret: &str, passphrase: &str) -> Result<Self, GateError> {
        if secret.trim().is_empty() {
            return Err(GateError::Validation("secret must not be empty".to_string()));
        }
        if passphrase.trim().is_empty() {
            return Err(GateError::Validation("passphrase must not be empty".to_string()));
        }
        Ok(Self {
            api_key: ApiKey::new(api_key)?,
            secret: ApiSecret::new(secret),
            passphrase: Passphrase::new(passphrase),
        })
    }
}

/// JSON document that is encrypted at rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPayload {
    #[serde(flatten)]
    pub triple: CredentialTriple,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<WalletAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A decrypted credential together with its binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundCredential {
    pub triple: CredentialTriple,
    pub address: Option<WalletAddress>,
    pub created_at: DateTime<Utc>,
}

impl BoundCredential {
    pub fn api_key(&self) -> &ApiKey {
        &self.triple.api_key
    }

    /// Wallet the key was derived for. Trading requests cannot be signed without it.
    pub fn signing_address(&self) -> Result<&WalletAddress, GateError> {
        self.address.as_ref().ok_or_else(|| {
            GateError::Validation("credential is not bound to a wallet address".to_string())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Real(BoundCredential),
    Placeholder(BoundCredential),
}

impl Credential {
    pub fn real(triple: CredentialTriple, address: Option<WalletAddress>) -> Self {
        Self::Real(BoundCredential {
            triple,
            address,
            created_at: Utc::now(),
        })
    }

    pub fn placeholder(triple: CredentialTriple, address: Option<WalletAddress>) -> Self {
        Self::Placeholder(BoundCredential {
            triple,
            address,
            created_at: Utc::now(),
        })
    }

    pub fn bound(&self) -> &BoundCredential {
        match self {
            Self::Real(bound) | Self::Placeholder(bound) => bound,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    /// Signing material. Placeholders are refused.
    pub fn into_signing(self) -> Result<BoundCredential, GateError> {
        match self {
            Self::Real(bound) => Ok(bound),
            Self::Placeholder(_) => Err(GateError::Validation(
                "placeholder credential cannot sign exchange requests".to_string(),
            )),
        }
    }

    pub fn to_payload(&self) -> CredentialPayload {
        let (bound, note) = match self {
            Self::Real(bound) => (bound, None),
            Self::Placeholder(bound) => (bound, Some(PLACEHOLDER_NOTE.to_string())),
        };
        CredentialPayload {
            triple: bound.triple.clone(),
            address: bound.address.clone(),
            created_at: Some(bound.created_at),
            note,
        }
    }

    /// Rebuild from a decrypted payload. `fallback_created_at` covers records
    /// written without a creation time.
    pub fn from_payload(payload: CredentialPayload, fallback_created_at: DateTime<Utc>) -> Self {
        let bound = BoundCredential {
            triple: payload.triple,
            address: payload.address,
            created_at: payload.created_at.unwrap_or(fallback_created_at),
        };
        match payload.note.as_deref() {
            Some(PLACEHOLDER_NOTE) => Self::Placeholder(bound),
            _ => Self::Real(bound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple() -> CredentialTriple {
        CredentialTriple::from_parts("key-1", "c2VjcmV0", "pass").unwrap()
    }

    #[test]
    fn test_debug_hides_secret_material() {
        let printed = format!("{:?}", triple());
        assert!(!printed.contains("c2VjcmV0"));
        assert!(!printed.contains("pass\""));
        assert!(printed.contains("key-1"));
    }

    #[test]
    fn test_from_parts_rejects_empty_fields() {
        assert!(CredentialTriple::from_parts("", "s", "p").is_err());
        assert!(CredentialTriple::from_parts("k", "", "p").is_err());
        assert!(CredentialTriple::from_parts("k", "s", " ").is_err());
    }

    #[test]
    fn test_payload_uses_exchange_field_names() {
        let json = serde_json::to_value(Credential::real(triple(), None).to_payload()).unwrap();
        assert_eq!(json["apiKey"], "key-1");
        assert_eq!(json["secret"], "c2VjcmV0");
        assert_eq!(json["passphrase"], "pass");
        assert!(json.get("note").is_none());
    }

    #[test]
    fn test_placeholder_note_round_trips_to_variant() {
        let payload = Credential::placeholder(triple(), None).to_payload();
        assert_eq!(payload.note.as_deref(), Some(PLACEHOLDER_NOTE));
        let back = Credential::from_payload(payload, Utc::now());
        assert!(back.is_placeholder());
        assert!(back.into_signing().is_err());
    }

    #[test]
    fn test_unknown_note_is_real() {
        let mut payload = Credential::real(triple(), None).to_payload();
        payload.note = Some("imported by ops".to_string());
        let cred = Credential::from_payload(payload, Utc::now());
        assert!(cred.into_signing().is_ok());
    }

    #[test]
    fn test_unbound_credential_cannot_provide_address() {
        let bound = Credential::real(triple(), None).into_signing().unwrap();
        assert_eq!(bound.signing_address().unwrap_err().code(), "VALIDATION_ERROR");
    }
}
