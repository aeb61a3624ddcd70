//! Error types for the token codec.

use thiserror::Error;

/// Token codec errors. `Expired` and `InvalidSignature` are deliberately
/// distinct variants and must never be conflated.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token string does not have the expected two-part format, or a
    /// part is not valid base64url/JSON.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Ed25519 signature verification failed.
    #[error("token signature invalid")]
    InvalidSignature,

    /// The `exp` claim is in the past.
    #[error("token expired")]
    Expired,

    /// This codec was built verify-only and cannot issue tokens.
    #[error("codec has no signing key")]
    SigningUnavailable,

    /// Claims serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for token operations.
pub type TokenResult<T> = Result<T, TokenError>;
