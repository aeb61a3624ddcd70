//! Append-only audit log entries for authority-side actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of action an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    LicenseCreated,
    LicenseActivated,
    LicenseRevoked,
    LicenseExpired,
    LicenseDeleted,
    ChannelRegistered,
}

/// One audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Time-ordered entry id.
    pub id: Uuid,
    pub action: AuditAction,
    pub license_key: Option<String>,
    pub device_id: Option<String>,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates an entry at the current instant.
    #[must_use]
    pub fn new(
        action: AuditAction,
        license_key: Option<&str>,
        device_id: Option<&str>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            action,
            license_key: license_key.map(String::from),
            device_id: device_id.map(String::from),
            detail: detail.into(),
            created_at: Utc::now(),
        }
    }
}
