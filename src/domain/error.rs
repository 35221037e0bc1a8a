//! Gate error taxonomy.
//!
//! One variant per failure class the callers must tell apart. Each maps to
//! a stable wire code and an HTTP status; the mapping lives here so the
//! HTTP adapter and the tests agree on it.

use thiserror::Error;

/// Upper bound on upstream response text echoed back to callers or logs.
pub const MAX_UPSTREAM_BODY_CHARS: usize = 500;

/// Truncate upstream text on a char boundary, marking the cut.
pub fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_UPSTREAM_BODY_CHARS {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(MAX_UPSTREAM_BODY_CHARS).collect();
    cut.push_str("…");
    cut
}

#[derive(Debug, Error)]
pub enum GateError {
    /// Missing master key or admin token. The operation was never attempted.
    #[error("configuration error: {0}")]
    Config(String),

    /// Missing or invalid session / admin token.
    #[error("unauthorized: {0}")]
    Auth(String),

    /// Stored record could not be authenticated under the current master key.
    /// The record is left in place: a wrong key may be a transient config issue.
    #[error("failed to decrypt stored credential for {owner}")]
    Decryption { owner: String },

    /// No credential stored for this owner.
    #[error("no credentials stored for {0}")]
    NotFound(String),

    /// Exchange answered non-2xx (or never answered) for reasons unrelated
    /// to the key itself. Retryable by the caller.
    #[error("upstream rejected request (status {status:?}): {body}")]
    UpstreamRejected { status: Option<u16>, body: String },

    /// Exchange reported the API key as invalid. The stored credential has
    /// already been purged when this is returned.
    #[error("exchange rejected API key: {body}")]
    InvalidCredential { body: String },

    /// Both derive and create failed during credential derivation.
    #[error(
        "credential derivation failed (derive {derive_status:?}: {derive_body}; create {create_status:?}: {create_body})"
    )]
    DerivationFailed {
        derive_status: Option<u16>,
        derive_body: String,
        create_status: Option<u16>,
        create_body: String,
    },

    /// Caller jurisdiction is on the deny-list.
    #[error("request denied for this jurisdiction")]
    Geoblocked,

    /// Order signer or owner does not match the active credential.
    #[error("signer mismatch: expected {expected}, got {actual}")]
    SignerMismatch { expected: String, actual: String },

    /// Malformed caller input.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Storage engine failure.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl GateError {
    /// Stable machine-readable code returned to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Auth(_) => "UNAUTHORIZED",
            Self::Decryption { .. } => "DECRYPTION_FAILED",
            Self::NotFound(_) => "NO_CREDS",
            Self::UpstreamRejected { .. } => "ORDER_REJECTED",
            Self::InvalidCredential { .. } => "INVALID_API_KEY",
            Self::DerivationFailed { .. } => "DERIVATION_FAILED",
            Self::Geoblocked => "GEOBLOCKED",
            Self::SignerMismatch { .. } => "SIGNER_MISMATCH",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// HTTP status code for the operation surface.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Config(_) | Self::Decryption { .. } | Self::Storage(_) => 500,
            Self::Auth(_) | Self::InvalidCredential { .. } => 401,
            Self::NotFound(_) => 404,
            Self::UpstreamRejected { .. } | Self::DerivationFailed { .. } => 502,
            Self::Geoblocked => 403,
            Self::SignerMismatch { .. } => 409,
            Self::Validation(_) => 400,
        }
    }

    /// Whether a caller may reasonably retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamRejected { .. } | Self::Storage(_))
    }
}
