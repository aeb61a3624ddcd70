//! Request/response bodies of the activation protocol.
//!
//! Shared by the server handlers and the device-side HTTP client so both
//! ends agree on field names and error codes. Error codes are short stable
//! strings; human-readable messages travel alongside them and are never
//! matched on.

use crate::LicenseStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable error code strings carried in the `error` response field.
pub mod codes {
    pub const LICENSE_NOT_FOUND: &str = "license_not_found";
    pub const LICENSE_NOT_ACTIVE: &str = "license_not_active";
    pub const LICENSE_EXPIRED: &str = "license_expired";
    pub const LICENSE_REVOKED: &str = "license_revoked";
    pub const DEVICE_QUOTA_EXCEEDED: &str = "device_quota_exceeded";
    pub const BOUND_TO_ANOTHER_LICENSE: &str = "bound_to_another_license";
    pub const TOKEN_MISSING: &str = "token_missing";
    pub const TOKEN_EXPIRED: &str = "token_expired";
    pub const TOKEN_INVALID: &str = "token_invalid";
    pub const TOKEN_MALFORMED: &str = "token_malformed";
    pub const BINDING_NOT_FOUND: &str = "binding_not_found";
    pub const INTERNAL: &str = "internal";
}

/// Body of `POST /activate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivateRequest {
    pub license_key: String,
    pub device_id: String,
    #[serde(default)]
    pub device_info: String,
}

/// Response of `POST /activate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_status: Option<LicenseStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActivateResponse {
    /// Builds a success response.
    #[must_use]
    pub fn ok(token: String, status: LicenseStatus, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            success: true,
            token: Some(token),
            license_status: Some(status),
            expires_at,
            error: None,
        }
    }

    /// Builds a failure response carrying an error code.
    #[must_use]
    pub fn err(code: &str) -> Self {
        Self {
            success: false,
            token: None,
            license_status: None,
            expires_at: None,
            error: Some(code.to_string()),
        }
    }
}

/// Response of `POST /validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_status: Option<LicenseStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidateResponse {
    /// Builds a success response.
    #[must_use]
    pub fn ok(
        status: LicenseStatus,
        expires_at: Option<DateTime<Utc>>,
        days_remaining: Option<i64>,
    ) -> Self {
        Self {
            valid: true,
            license_status: Some(status),
            expires_at,
            days_remaining,
            error: None,
        }
    }

    /// Builds a failure response carrying an error code.
    #[must_use]
    pub fn err(code: &str) -> Self {
        Self {
            valid: false,
            license_status: None,
            expires_at: None,
            days_remaining: None,
            error: Some(code.to_string()),
        }
    }
}

/// Body of `POST /register-fcm`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterChannelRequest {
    pub device_id: String,
    pub fcm_token: String,
}

/// Response of `POST /register-fcm`. Success is the empty object `{}`;
/// failure carries the error code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterChannelResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RegisterChannelResponse {
    /// Builds the empty success response.
    #[must_use]
    pub fn ok() -> Self {
        Self { error: None }
    }

    /// Builds a failure response carrying an error code.
    #[must_use]
    pub fn err(code: &str) -> Self {
        Self {
            error: Some(code.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn channel_registration_success_serializes_to_an_empty_object() {
        let body = serde_json::to_string(&RegisterChannelResponse::ok()).unwrap();
        assert_eq!(body, "{}");

        let parsed: RegisterChannelResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.error.is_none());
    }

    #[test]
    fn channel_registration_failure_carries_only_the_error_code() {
        let body = serde_json::to_string(&RegisterChannelResponse::err("token_mismatch")).unwrap();
        assert_eq!(body, r#"{"error":"token_mismatch"}"#);
    }
}
