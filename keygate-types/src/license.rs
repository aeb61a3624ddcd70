//! License records and device bindings.
//!
//! A `LicenseRecord` is owned and mutated only by the authority. Devices
//! never see the record itself, only status snapshots carried in tokens and
//! validation responses.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The current status of a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    /// Created but not yet available for activation.
    Unassigned,
    /// Valid and activatable.
    Active,
    /// Past its expiry timestamp.
    Expired,
    /// Permanently invalidated by an admin.
    Revoked,
}

impl LicenseStatus {
    /// Returns true if devices may activate or keep using this license.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns the lowercase wire name of this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unassigned => "unassigned",
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A license record, owned by the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Unique license key handed to the customer.
    pub key: String,
    /// Current status.
    pub status: LicenseStatus,
    /// Expiry instant. `None` means the license never expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// Maximum number of device bindings (>= 1).
    pub max_devices: u32,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Set when the license is revoked.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl LicenseRecord {
    /// Creates an active license, optionally expiring `duration_days` from now.
    #[must_use]
    pub fn new(key: impl Into<String>, duration_days: Option<i64>, max_devices: u32) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            status: LicenseStatus::Active,
            expires_at: duration_days.map(|d| now + Duration::days(d)),
            max_devices: max_devices.max(1),
            created_at: now,
            revoked_at: None,
        }
    }

    /// Returns true if the expiry timestamp has passed.
    ///
    /// This is independent of `status`: the authority uses it to decide when
    /// to flip an `Active` record to `Expired`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(exp) if exp <= now)
    }

    /// Returns whole days until expiry, clamped to zero, or `None` for a
    /// non-expiring license.
    #[must_use]
    pub fn days_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at.map(|exp| (exp - now).num_days().max(0))
    }
}

/// The association between one device and one license.
///
/// Created on first successful activation; at most `max_devices` bindings
/// exist per license at any instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceBinding {
    /// Stable device identifier (hardware fingerprint on real devices).
    pub device_id: String,
    /// Free-text device description.
    pub device_info: String,
    /// Key of the bound license.
    pub license_key: String,
    /// Registered push channel token, if the device has one.
    pub channel_token: Option<String>,
    /// First successful activation.
    pub first_activation_at: DateTime<Utc>,
    /// Most recent successful validation.
    pub last_validated_at: Option<DateTime<Utc>>,
}

impl DeviceBinding {
    /// Creates a binding at the current instant.
    #[must_use]
    pub fn new(
        device_id: impl Into<String>,
        device_info: impl Into<String>,
        license_key: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            device_info: device_info.into(),
            license_key: license_key.into(),
            channel_token: None,
            first_activation_at: Utc::now(),
            last_validated_at: None,
        }
    }
}
