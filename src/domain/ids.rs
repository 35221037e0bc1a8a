//! Identifier value types.
//!
//! The wallet address and the exchange API key travel side by side through
//! every authenticated call, and both are plain strings on the wire. They
//! are kept as distinct newtypes so that passing one where the other is
//! expected (e.g. an address as the order `owner`) fails to compile.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::error::GateError;

/// An EVM account address (`0x` + 40 hex chars), stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse and normalize an address. Checksum casing is accepted but not verified.
    pub fn parse(raw: &str) -> Result<Self, GateError> {
        let trimmed = raw.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| GateError::Validation(format!("address must start with 0x: {trimmed}")))?;

        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(GateError::Validation(format!(
                "address must be 20 hex bytes: {trimmed}"
            )));
        }

        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for WalletAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        WalletAddress::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// The CLOB API key. Identifies the credential, and is the order `owner`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(raw: impl Into<String>) -> Result<Self, GateError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(GateError::Validation("apiKey must not be empty".to_string()));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ApiKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ApiKey::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Authenticated session identity supplied by the surrounding application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Result<Self, GateError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(GateError::Auth("empty session identity".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key under which an encrypted credential record is stored.
///
/// `Global` rows live in the `secrets` table (one shared platform
/// credential per name), `User` rows in `user_credentials`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum OwnerKey {
    Global(String),
    User(UserId),
}

impl OwnerKey {
    pub fn user(id: UserId) -> Self {
        Self::User(id)
    }

    pub fn global(name: impl Into<String>) -> Self {
        Self::Global(name.into())
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global(name) => write!(f, "global:{name}"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_normalizes_case() {
        let a = WalletAddress::parse("0xABCDEF0123456789abcdef0123456789ABCDEF01").unwrap();
        let b = WalletAddress::parse("0xabcdef0123456789ABCDEF0123456789abcdef01").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn test_address_rejects_garbage() {
        assert!(WalletAddress::parse("abcdef").is_err());
        assert!(WalletAddress::parse("0x1234").is_err());
        assert!(WalletAddress::parse("0xZZCDEF0123456789abcdef0123456789abcdef01").is_err());
    }

    #[test]
    fn test_api_key_rejects_empty() {
        assert!(ApiKey::new("  ").is_err());
        assert_eq!(ApiKey::new("k-1").unwrap().as_str(), "k-1");
    }

    #[test]
    fn test_owner_key_display() {
        let user = OwnerKey::user(UserId::new("alice").unwrap());
        assert_eq!(user.to_string(), "user:alice");
        assert_eq!(OwnerKey::global("platform").to_string(), "global:platform");
    }

    #[test]
    fn test_empty_session_is_auth_error() {
        let err = UserId::new("").unwrap_err();
        assert_eq!(err.code(), "UNAUTHORIZED");
    }
}
