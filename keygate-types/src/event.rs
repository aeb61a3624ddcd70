//! Push events delivered over the out-of-band notification channel.
//!
//! Events are serialized with an external `type` tag so the device-side
//! receiver can dispatch on kind without decoding the full payload.

use serde::{Deserialize, Serialize};

/// An out-of-band event pushed from the authority to a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    /// The bound license was revoked. The device must drop its cached
    /// activation unconditionally.
    LicenseRevoked {
        title: String,
        body: String,
        license_key: String,
    },
    /// The bound license expires soon. Display-only warning.
    LicenseExpiring {
        title: String,
        body: String,
        license_key: String,
        days_remaining: i64,
    },
    /// Free-form admin message. Display-only.
    AdminMessage { title: String, body: String },
}

impl PushEvent {
    /// Builds a revocation event for a license.
    #[must_use]
    pub fn revoked(license_key: impl Into<String>) -> Self {
        let license_key = license_key.into();
        Self::LicenseRevoked {
            title: "License revoked".to_string(),
            body: format!("License {license_key} has been revoked"),
            license_key,
        }
    }

    /// Builds an expiry warning event for a license.
    #[must_use]
    pub fn expiring(license_key: impl Into<String>, days_remaining: i64) -> Self {
        let license_key = license_key.into();
        Self::LicenseExpiring {
            title: "License expiring".to_string(),
            body: format!("License {license_key} expires in {days_remaining} days"),
            license_key,
            days_remaining,
        }
    }

    /// Builds an admin message event.
    #[must_use]
    pub fn message(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::AdminMessage {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Returns the wire tag of this event kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LicenseRevoked { .. } => "license_revoked",
            Self::LicenseExpiring { .. } => "license_expiring",
            Self::AdminMessage { .. } => "admin_message",
        }
    }
}
