//! Secret Cipher - AES-256-GCM Sealing of Credential Payloads
//!
//! The AES key is SHA-256(master key); the master key itself is never
//! used as key material. Every encryption draws a fresh 96-bit nonce
//! from the OS RNG and yields a 128-bit tag that is verified before any
//! plaintext is returned.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

/// GCM nonce length in bytes (96 bits).
pub const IV_LEN: usize = 12;
/// GCM tag length in bytes (128 bits).
pub const TAG_LEN: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// Tag mismatch, wrong key, or non-UTF-8 plaintext.
    #[error("decryption failed: authentication tag mismatch or wrong key")]
    Decryption,
    #[error("encryption failed")]
    Encryption,
    #[error("malformed {field}: {reason}")]
    Malformed { field: &'static str, reason: String },
}

/// Ciphertext, nonce and tag of one encryption.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedSecret {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_LEN],
    pub auth_tag: [u8; TAG_LEN],
}

impl fmt::Debug for SealedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedSecret")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("iv", &BASE64.encode(self.iv))
            .finish()
    }
}

impl SealedSecret {
    /// Base64 (standard) encodings of `(ciphertext, iv, auth_tag)` for storage.
    pub fn encode(&self) -> (String, String, String) {
        (
            BASE64.encode(&self.ciphertext),
            BASE64.encode(self.iv),
            BASE64.encode(self.auth_tag),
        )
    }

    /// Parse the stored base64 fields, checking nonce and tag lengths.
    pub fn decode(ciphertext: &str, iv: &str, auth_tag: &str) -> Result<Self, CipherError> {
        let ciphertext = decode_field("ciphertext", ciphertext)?;
        let iv: [u8; IV_LEN] = decode_field("iv", iv)?
            .try_into()
            .map_err(|v: Vec<u8>| CipherError::Malformed {
                field: "iv",
                reason: format!("expected {IV_LEN} bytes, got {}", v.len()),
            })?;
        let auth_tag: [u8; TAG_LEN] = decode_field("auth_tag", auth_tag)?
            .try_into()
            .map_err(|v: Vec<u8>| CipherError::Malformed {
                field: "auth_tag",
                reason: format!("expected {TAG_LEN} bytes, got {}", v.len()),
            })?;

        Ok(Self {
            ciphertext,
            iv,
            auth_tag,
        })
    }
}

fn decode_field(field: &'static str, value: &str) -> Result<Vec<u8>, CipherError> {
    BASE64.decode(value).map_err(|e| CipherError::Malformed {
        field,
        reason: e.to_string(),
    })
}

/// AES-256-GCM cipher bound to one master key. Holds no other state.
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl SecretCipher {
    pub fn new(master_key: &str) -> Self {
        let derived = hmac_sha256::Hash::hash(master_key.as_bytes());
        let key = Key::<Aes256Gcm>::from_slice(&derived);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<SealedSecret, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let mut sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encryption)?;

        // aes-gcm appends the tag to the ciphertext
        let tag_start = sealed.len() - TAG_LEN;
        let auth_tag: [u8; TAG_LEN] = sealed[tag_start..]
            .try_into()
            .map_err(|_| CipherError::Encryption)?;
        sealed.truncate(tag_start);

        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(nonce.as_slice());

        Ok(SealedSecret {
            ciphertext: sealed,
            iv,
            auth_tag,
        })
    }

    pub fn decrypt(&self, sealed: &SealedSecret) -> Result<String, CipherError> {
        let mut buf = Vec::with_capacity(sealed.ciphertext.len() + TAG_LEN);
        buf.extend_from_slice(&sealed.ciphertext);
        buf.extend_from_slice(&sealed.auth_tag);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&sealed.iv), buf.as_slice())
            .map_err(|_| CipherError::Decryption)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::Decryption)
    }
}

/// One-shot encryption under `master_key`.
pub fn encrypt(plaintext: &str, master_key: &str) -> Result<SealedSecret, CipherError> {
    SecretCipher::new(master_key).encrypt(plaintext)
}

/// One-shot decryption under `master_key`.
pub fn decrypt(sealed: &SealedSecret, master_key: &str) -> Result<String, CipherError> {
    SecretCipher::new(master_key).decrypt(sealed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "test-master-key";

    #[test]
    fn test_round_trip() {
        let sealed = encrypt(r#"{"apiKey":"k"}"#, KEY).unwrap();
        assert_eq!(decrypt(&sealed, KEY).unwrap(), r#"{"apiKey":"k"}"#);
    }

    #[test]
    fn test_empty_plaintext_round_trip() {
        let sealed = encrypt("", KEY).unwrap();
        assert!(sealed.ciphertext.is_empty());
        assert_eq!(decrypt(&sealed, KEY).unwrap(), "");
    }

    #[test]
    fn test_same_plaintext_new_iv_and_ciphertext() {
        let cipher = SecretCipher::new(KEY);
        let a = cipher.encrypt("same payload").unwrap();
        let b = cipher.encrypt("same payload").unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = encrypt("payload", KEY).unwrap();
        assert_eq!(decrypt(&sealed, "other-key"), Err(CipherError::Decryption));
    }

    #[test]
    fn test_flipped_tag_bit_fails() {
        let mut sealed = encrypt("payload", KEY).unwrap();
        sealed.auth_tag[0] ^= 0x01;
        assert_eq!(decrypt(&sealed, KEY), Err(CipherError::Decryption));
    }

    #[test]
    fn test_flipped_ciphertext_bit_fails() {
        let mut sealed = encrypt("payload", KEY).unwrap();
        sealed.ciphertext[3] ^= 0x80;
        assert_eq!(decrypt(&sealed, KEY), Err(CipherError::Decryption));
    }

    #[test]
    fn test_encoded_fields_round_trip() {
        let sealed = encrypt("payload", KEY).unwrap();
        let (ct, iv, tag) = sealed.encode();
        let back = SealedSecret::decode(&ct, &iv, &tag).unwrap();
        assert_eq!(back, sealed);
    }

    #[test]
    fn test_short_iv_is_malformed_not_panic() {
        let sealed = encrypt("payload", KEY).unwrap();
        let (ct, _, tag) = sealed.encode();
        let err = SealedSecret::decode(&ct, &BASE64.encode([0u8; 8]), &tag).unwrap_err();
        assert!(matches!(err, CipherError::Malformed { field: "iv", .. }));
    }
}
