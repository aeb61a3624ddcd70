//! Error taxonomy of the authority.
//!
//! Activation and validation errors are surfaced verbatim to the caller
//! and never retried automatically. Each carries a stable wire code via
//! `code()` so the HTTP layer and the device client agree on meaning.

use keygate_token::TokenError;
use keygate_types::wire::codes;
use thiserror::Error;

/// Errors returned by `Authority::activate`.
#[derive(Debug, Error)]
pub enum ActivationError {
    /// No license record exists for the key.
    #[error("license not found")]
    LicenseNotFound,

    /// The license exists but is not activatable yet.
    #[error("license not active")]
    LicenseNotActive,

    /// The license has expired.
    #[error("license expired")]
    LicenseExpired,

    /// The license was revoked.
    #[error("license revoked")]
    LicenseRevoked,

    /// All device slots for the license are taken.
    #[error("device quota exceeded (max {max_devices} devices)")]
    DeviceQuotaExceeded { max_devices: u32 },

    /// The device is already bound to a different license and must clear
    /// that binding first.
    #[error("device already bound to another license")]
    BoundToAnotherLicense,

    /// Token minting failed.
    #[error("token issue failed: {0}")]
    Token(#[from] TokenError),
}

impl ActivationError {
    /// Returns the stable wire code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::LicenseNotFound => codes::LICENSE_NOT_FOUND,
            Self::LicenseNotActive => codes::LICENSE_NOT_ACTIVE,
            Self::LicenseExpired => codes::LICENSE_EXPIRED,
            Self::LicenseRevoked => codes::LICENSE_REVOKED,
            Self::DeviceQuotaExceeded { .. } => codes::DEVICE_QUOTA_EXCEEDED,
            Self::BoundToAnotherLicense => codes::BOUND_TO_ANOTHER_LICENSE,
            Self::Token(_) => codes::INTERNAL,
        }
    }
}

/// Errors returned by `Authority::validate` and `register_channel`.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The token's `exp` claim has passed. Clients react by silently
    /// re-activating, never by discarding their license.
    #[error("token expired")]
    TokenExpired,

    /// Signature verification failed. Treated as a security failure.
    #[error("token signature invalid")]
    TokenInvalidSignature,

    /// The token could not be parsed at all.
    #[error("malformed token: {0}")]
    TokenMalformed(String),

    /// No binding exists for the device/license the token names.
    #[error("device binding not found")]
    BindingNotFound,

    /// The bound license no longer exists.
    #[error("license not found")]
    LicenseNotFound,

    /// The license has expired.
    #[error("license expired")]
    LicenseExpired,

    /// The license was revoked after the token was issued.
    #[error("license revoked")]
    LicenseRevoked,

    /// The license is not in an activatable state.
    #[error("license not active")]
    LicenseNotActive,
}

impl ValidationError {
    /// Returns the stable wire code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::TokenExpired => codes::TOKEN_EXPIRED,
            Self::TokenInvalidSignature => codes::TOKEN_INVALID,
            Self::TokenMalformed(_) => codes::TOKEN_MALFORMED,
            Self::BindingNotFound => codes::BINDING_NOT_FOUND,
            Self::LicenseNotFound => codes::LICENSE_NOT_FOUND,
            Self::LicenseExpired => codes::LICENSE_EXPIRED,
            Self::LicenseRevoked => codes::LICENSE_REVOKED,
            Self::LicenseNotActive => codes::LICENSE_NOT_ACTIVE,
        }
    }
}

impl From<TokenError> for ValidationError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::TokenExpired,
            TokenError::InvalidSignature => Self::TokenInvalidSignature,
            TokenError::Malformed(msg) => Self::TokenMalformed(msg),
            TokenError::SigningUnavailable => {
                Self::TokenMalformed("codec cannot verify".to_string())
            }
            TokenError::Serialization(e) => Self::TokenMalformed(e.to_string()),
        }
    }
}

/// Errors returned by admin operations (create, revoke, delete).
#[derive(Debug, Error)]
pub enum AdminError {
    /// A license with this key already exists.
    #[error("license key already exists: {0}")]
    DuplicateKey(String),

    /// No license record exists for the key.
    #[error("license not found: {0}")]
    LicenseNotFound(String),
}
