//! Property-Based Tests — Cipher, Signer and Readiness Invariants
//!
//! Uses `proptest` to verify that the credential primitives hold their
//! guarantees across random inputs.

use proptest::prelude::*;

use polymarket_clob_gate::adapters::api::auth::{RequestSigner, SignatureEncoding};
use polymarket_clob_gate::adapters::persistence::{CipherError, SecretCipher};
use polymarket_clob_gate::domain::error::{truncate_body, MAX_UPSTREAM_BODY_CHARS};
use polymarket_clob_gate::domain::ids::WalletAddress;
use polymarket_clob_gate::domain::readiness::{ReadinessState, ReadinessStep};
use polymarket_clob_gate::usecases::order_pipeline::is_invalid_key_response;

// ── Secret Cipher Properties ────────────────────────────────

proptest! {
    /// Decrypting with the same key returns the original plaintext.
    #[test]
    fn cipher_round_trips(
        key in "[ -~]{1,64}",
        plaintext in any::<String>(),
    ) {
        let cipher = SecretCipher::new(&key);
        let sealed = cipher.encrypt(&plaintext).unwrap();
        prop_assert_eq!(sealed.ciphertext.len(), plaintext.len());
        prop_assert_eq!(cipher.decrypt(&sealed).unwrap(), plaintext);
    }

    /// Two encryptions of one plaintext never share a nonce or ciphertext.
    #[test]
    fn cipher_is_non_deterministic(plaintext in "[ -~]{1,128}") {
        let cipher = SecretCipher::new("proptest-master-key");
        let a = cipher.encrypt(&plaintext).unwrap();
        let b = cipher.encrypt(&plaintext).unwrap();
        prop_assert_ne!(a.iv, b.iv);
        prop_assert_ne!(a.ciphertext, b.ciphertext);
    }

    /// Any single flipped bit in the ciphertext is detected.
    #[test]
    fn cipher_rejects_tampered_ciphertext(
        plaintext in "[ -~]{1,128}",
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let cipher = SecretCipher::new("proptest-master-key");
        let mut sealed = cipher.encrypt(&plaintext).unwrap();
        let i = index.index(sealed.ciphertext.len());
        sealed.ciphertext[i] ^= 1 << bit;
        prop_assert_eq!(cipher.decrypt(&sealed), Err(CipherError::Decryption));
    }

    /// Any single flipped bit in the tag is detected.
    #[test]
    fn cipher_rejects_tampered_tag(
        plaintext in "[ -~]{0,128}",
        index in 0usize..16,
        bit in 0u8..8,
    ) {
        let cipher = SecretCipher::new("proptest-master-key");
        let mut sealed = cipher.encrypt(&plaintext).unwrap();
        sealed.auth_tag[index] ^= 1 << bit;
        prop_assert_eq!(cipher.decrypt(&sealed), Err(CipherError::Decryption));
    }

    /// A different master key cannot open the record.
    #[test]
    fn cipher_rejects_wrong_key(
        key_a in "[a-z0-9]{8,32}",
        key_b in "[a-z0-9]{8,32}",
        plaintext in "[ -~]{0,64}",
    ) {
        prop_assume!(key_a != key_b);
        let sealed = SecretCipher::new(&key_a).encrypt(&plaintext).unwrap();
        prop_assert_eq!(
            SecretCipher::new(&key_b).decrypt(&sealed),
            Err(CipherError::Decryption)
        );
    }
}

// ── Request Signer Properties ───────────────────────────────

proptest! {
    /// Identical inputs always produce the identical signature.
    #[test]
    fn signature_is_deterministic(
        secret in "[A-Za-z0-9+/]{8,44}",
        timestamp in 1_600_000_000u64..2_000_000_000,
        body in "[ -~]{0,256}",
    ) {
        let ts = timestamp.to_string();
        let a = RequestSigner::sign(&secret, &ts, "POST", "/order", &body, SignatureEncoding::UrlSafe);
        let b = RequestSigner::sign(&secret, &ts, "POST", "/order", &body, SignatureEncoding::UrlSafe);
        prop_assert_eq!(a, b);
    }

    /// Appending whitespace to the body changes the signature.
    #[test]
    fn signature_covers_body_bytes(
        secret in "[A-Za-z0-9]{8,44}",
        body in "\\{[ -~]{0,128}\\}",
    ) {
        let padded = format!("{body} ");
        let a = RequestSigner::sign(&secret, "1700000000", "POST", "/order", &body, SignatureEncoding::UrlSafe);
        let b = RequestSigner::sign(&secret, "1700000000", "POST", "/order", &padded, SignatureEncoding::UrlSafe);
        prop_assert_ne!(a, b);
    }

    /// URL-safe output never contains `+` or `/`, and both alphabets
    /// agree once translated.
    #[test]
    fn url_safe_alphabet(
        secret in "[A-Za-z0-9]{8,44}",
        path in "/[a-z/]{0,24}",
    ) {
        let safe = RequestSigner::sign(&secret, "1700000000", "GET", &path, "", SignatureEncoding::UrlSafe);
        let standard = RequestSigner::sign(&secret, "1700000000", "GET", &path, "", SignatureEncoding::Standard);
        prop_assert!(!safe.contains('+') && !safe.contains('/'));
        prop_assert_eq!(safe, standard.replace('+', "-").replace('/', "_"));
    }
}

// ── Readiness Properties ────────────────────────────────────

proptest! {
    /// The step is the earliest unmet check, for every combination.
    #[test]
    fn readiness_step_is_earliest_unmet(
        proxy in any::<bool>(),
        usdc in any::<bool>(),
        creds in any::<bool>(),
    ) {
        let state = ReadinessState::new(proxy, usdc, creds);
        let expected = match (proxy, usdc, creds) {
            (false, _, _) => ReadinessStep::Proxy,
            (true, false, _) => ReadinessStep::Usdc,
            (true, true, false) => ReadinessStep::Creds,
            (true, true, true) => ReadinessStep::Ready,
        };
        prop_assert_eq!(state.current_step(), expected);
        prop_assert_eq!(state.is_ready(), proxy && usdc && creds);
    }
}

// ── Boundary Value Properties ───────────────────────────────

proptest! {
    /// Address parsing is case-insensitive and normalizes to lower case.
    #[test]
    fn address_normalizes_case(hex in "[0-9a-fA-F]{40}") {
        let upper = WalletAddress::parse(&format!("0x{}", hex.to_ascii_uppercase())).unwrap();
        let lower = WalletAddress::parse(&format!("0x{}", hex.to_ascii_lowercase())).unwrap();
        prop_assert_eq!(&upper, &lower);
        prop_assert_eq!(upper.as_str(), format!("0x{}", hex.to_ascii_lowercase()));
    }

    /// Echoed upstream text is bounded.
    #[test]
    fn truncated_body_is_bounded(body in any::<String>()) {
        let cut = truncate_body(&body);
        prop_assert!(cut.chars().count() <= MAX_UPSTREAM_BODY_CHARS + 1);
        if body.chars().count() <= MAX_UPSTREAM_BODY_CHARS {
            prop_assert_eq!(cut, body);
        }
    }

    /// Only a 401 can classify as an invalid key.
    #[test]
    fn invalid_key_requires_401(status in 100u16..600, body in "[ -~]{0,64}") {
        prop_assume!(status != 401);
        let with_pattern = format!("{body} invalid api key");
        prop_assert!(!is_invalid_key_response(status, &with_pattern));
    }
}
