//! Error types for the device-side client.

use keygate_token::TokenError;
use keygate_types::wire::codes;
use std::fmt;
use thiserror::Error;

/// An authoritative denial from the authority, decoded from a wire code.
///
/// Denials are surfaced verbatim and never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    LicenseNotFound,
    LicenseNotActive,
    LicenseExpired,
    LicenseRevoked,
    DeviceQuotaExceeded,
    BoundToAnotherLicense,
    TokenMissing,
    TokenExpired,
    TokenInvalid,
    TokenMalformed,
    BindingNotFound,
    /// A code this client version does not know.
    Other(String),
}

impl Denial {
    /// Decodes a wire error code.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            codes::LICENSE_NOT_FOUND => Self::LicenseNotFound,
            codes::LICENSE_NOT_ACTIVE => Self::LicenseNotActive,
            codes::LICENSE_EXPIRED => Self::LicenseExpired,
            codes::LICENSE_REVOKED => Self::LicenseRevoked,
            codes::DEVICE_QUOTA_EXCEEDED => Self::DeviceQuotaExceeded,
            codes::BOUND_TO_ANOTHER_LICENSE => Self::BoundToAnotherLicense,
            codes::TOKEN_MISSING => Self::TokenMissing,
            codes::TOKEN_EXPIRED => Self::TokenExpired,
            codes::TOKEN_INVALID => Self::TokenInvalid,
            codes::TOKEN_MALFORMED => Self::TokenMalformed,
            codes::BINDING_NOT_FOUND => Self::BindingNotFound,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the wire code of this denial.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::LicenseNotFound => codes::LICENSE_NOT_FOUND,
            Self::LicenseNotActive => codes::LICENSE_NOT_ACTIVE,
            Self::LicenseExpired => codes::LICENSE_EXPIRED,
            Self::LicenseRevoked => codes::LICENSE_REVOKED,
            Self::DeviceQuotaExceeded => codes::DEVICE_QUOTA_EXCEEDED,
            Self::BoundToAnotherLicense => codes::BOUND_TO_ANOTHER_LICENSE,
            Self::TokenMissing => codes::TOKEN_MISSING,
            Self::TokenExpired => codes::TOKEN_EXPIRED,
            Self::TokenInvalid => codes::TOKEN_INVALID,
            Self::TokenMalformed => codes::TOKEN_MALFORMED,
            Self::BindingNotFound => codes::BINDING_NOT_FOUND,
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Device-side client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transient transport failure. Retried by the background revalidator,
    /// never surfaced as a hard failure from a background context.
    #[error("network error: {0}")]
    Network(String),

    /// Authoritative denial from the authority.
    #[error("denied: {0}")]
    Denied(Denial),

    /// Secure store failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// The cached token could not be decoded.
    #[error("cached token unreadable: {0}")]
    Token(#[from] TokenError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
