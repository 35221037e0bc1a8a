//! CLOB Authentication — L1 and L2 Header Construction
//!
//! L1 headers carry a wallet signature and bootstrap key derivation.
//! L2 headers carry an HMAC-SHA256 over
//! `timestamp + method + path + body` keyed by the base64-decoded API
//! secret. The secret itself is never sent, only the signature.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};

use crate::domain::credential::BoundCredential;
use crate::domain::error::GateError;
use crate::domain::ids::WalletAddress;
use crate::ports::exchange::HttpMethod;

pub const POLY_ADDRESS: &str = "POLY_ADDRESS";
pub const POLY_SIGNATURE: &str = "POLY_SIGNATURE";
pub const POLY_TIMESTAMP: &str = "POLY_TIMESTAMP";
pub const POLY_NONCE: &str = "POLY_NONCE";
pub const POLY_API_KEY: &str = "POLY_API_KEY";
pub const POLY_PASSPHRASE: &str = "POLY_PASSPHRASE";

/// Output alphabet of the HMAC signature.
///
/// Which one an endpoint accepts is an upstream quirk; callers pick per
/// endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureEncoding {
    /// `+` and `/`, padded.
    Standard,
    /// `-` and `_`, padded.
    #[default]
    UrlSafe,
}

/// Stateless HMAC request signer.
pub struct RequestSigner;

impl RequestSigner {
    /// Concatenate the signed fields verbatim. No whitespace normalization.
    pub fn canonical_message(timestamp: &str, method: &str, path: &str, body: &str) -> String {
        format!("{timestamp}{method}{path}{body}")
    }

    /// Decode an API secret into HMAC key bytes.
    ///
    /// Accepts standard or URL-safe base64 with or without padding. Secrets
    /// that still fail to decode are used as raw bytes.
    pub fn decode_secret(secret: &str) -> Vec<u8> {
        let mut normalized: String = secret
            .trim()
            .trim_end_matches('=')
            .chars()
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                other => other,
            })
            .collect();
        while normalized.len() % 4 != 0 {
            normalized.push('=');
        }

        STANDARD
            .decode(normalized.as_bytes())
            .unwrap_or_else(|_| secret.as_bytes().to_vec())
    }

    /// HMAC-SHA256 of the canonical message, base64-encoded.
    pub fn sign(
        secret: &str,
        timestamp: &str,
        method: &str,
        path: &str,
        body: &str,
        encoding: SignatureEncoding,
    ) -> String {
        let message = Self::canonical_message(timestamp, method, path, body);
        let key = Self::decode_secret(secret);
        let mac = hmac_sha256::HMAC::mac(message.as_bytes(), &key);
        match encoding {
            SignatureEncoding::Standard => STANDARD.encode(mac),
            SignatureEncoding::UrlSafe => URL_SAFE.encode(mac),
        }
    }
}

/// Current Unix time in seconds, as the CLOB expects in `POLY_TIMESTAMP`.
pub fn unix_timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        .to_string()
}

/// L2 header set for one authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L2Headers {
    pub api_key: String,
    pub passphrase: String,
    pub timestamp: String,
    pub signature: String,
    pub address: String,
}

impl L2Headers {
    /// Sign one request with a credential.
    ///
    /// Fails if the credential has no bound wallet address.
    pub fn build(
        credential: &BoundCredential,
        timestamp: &str,
        method: HttpMethod,
        path: &str,
        body: &str,
        encoding: SignatureEncoding,
    ) -> Result<Self, GateError> {
        let address = credential.signing_address()?;
        let signature = RequestSigner::sign(
            credential.triple.secret.expose(),
            timestamp,
            method.as_str(),
            path,
            body,
            encoding,
        );

        Ok(Self {
            api_key: credential.triple.api_key.as_str().to_string(),
            passphrase: credential.triple.passphrase.expose().to_string(),
            timestamp: timestamp.to_string(),
            signature,
            address: address.as_str().to_string(),
        })
    }

    /// Header pairs, one field per header.
    pub fn into_pairs(self) -> Vec<(&'static str, String)> {
        vec![
            (POLY_ADDRESS, self.address),
            (POLY_SIGNATURE, self.signature),
            (POLY_TIMESTAMP, self.timestamp),
            (POLY_API_KEY, self.api_key),
            (POLY_PASSPHRASE, self.passphrase),
        ]
    }
}

/// L1 header set: the wallet signature over the fixed auth message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L1Headers {
    pub address: WalletAddress,
    pub signature: String,
    pub timestamp: String,
    pub nonce: String,
}

impl L1Headers {
    pub fn into_pairs(self) -> Vec<(&'static str, String)> {
        vec![
            (POLY_ADDRESS, self.address.as_str().to_string()),
            (POLY_SIGNATURE, self.signature),
            (POLY_TIMESTAMP, self.timestamp),
            (POLY_NONCE, self.nonce),
        ]
    }
}
