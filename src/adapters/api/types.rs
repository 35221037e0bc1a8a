//! CLOB API Request/Response Types
//!
//! Serialization types for the auth and order endpoints of the
//! Polymarket CLOB REST API, plus the endpoint paths themselves.

use serde::{Deserialize, Serialize};

use crate::domain::credential::CredentialTriple;
use crate::domain::error::GateError;

/// `GET`: idempotent lookup of the key bound to the L1 signer.
pub const DERIVE_API_KEY_PATH: &str = "/auth/derive-api-key";
/// `POST`: mint a new key for the L1 signer.
pub const CREATE_API_KEY_PATH: &str = "/auth/api-key";
/// `POST` signed order / `DELETE` cancel by id.
pub const ORDER_PATH: &str = "/order";
/// `GET` open orders for the API key.
pub const OPEN_ORDERS_PATH: &str = "/data/orders";

/// Credentials returned by derive/create.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyResponse {
  /// API key (UUID string).
  #[serde(rename = "apiKey")]
  pub api_key: String,
  /// Base64 HMAC secret.
  pub secret: String,
  /// Passphrase sent with every L2 request.
  pub passphrase: String,
}

impl ApiKeyResponse {
  /// Validate into a credential triple (all fields non-empty).
  pub fn into_triple(self) -> Result<CredentialTriple, GateError> {
    CredentialTriple::from_parts(&self.api_key, &self.secret, &self.passphrase)
  }
}

/// Cancel order request.
#[derive(Debug, Clone, Serialize)]
pub struct CancelOrderRequest {
  /// Order ID to cancel.
  #[serde(rename = "orderID")]
  pub order_id: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_api_key_response_deserialization() {
    let json = r#"{"apiKey":"0b1c-uuid","secret":"c2VjcmV0","passphrase":"p4ss"}"#;
    let resp: ApiKeyResponse = serde_json::from_str(json).unwrap();
    let triple = resp.into_triple().unwrap();
    assert_eq!(triple.api_key.as_str(), "0b1c-uuid");
    assert_eq!(triple.secret.expose(), "c2VjcmV0");
  }

  #[test]
  fn test_api_key_response_with_blank_secret_is_invalid() {
    let json = r#"{"apiKey":"k","secret":"","passphrase":"p"}"#;
    let resp: ApiKeyResponse = serde_json::from_str(json).unwrap();
    assert!(resp.into_triple().is_err());
  }

  #[test]
  fn test_cancel_request_serialization() {
    let req = CancelOrderRequest {
      order_id: "0xabc".to_string(),
    };
    assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"orderID":"0xabc"}"#);
  }
}
