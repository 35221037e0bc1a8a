//! Persistence Adapters - Encrypted Credential Storage
//!
//! `SecretCipher` seals credential payloads; the repositories implement
//! the `SecretRepository` port over ciphertext rows only.

pub mod cipher;
pub mod json_file;
pub mod memory;

pub use cipher::{CipherError, SealedSecret, SecretCipher};
pub use json_file::JsonFileSecretRepository;
pub use memory::InMemorySecretRepository;
