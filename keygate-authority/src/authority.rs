//! Activation and validation decisions.

use crate::dispatch::PushDispatcher;
use crate::error::{ActivationError, AdminError, ValidationError};
use crate::state::AuthorityState;
use chrono::{DateTime, Utc};
use keygate_token::TokenCodec;
use keygate_types::{
    AuditAction, AuditEntry, DeviceBinding, LicenseRecord, LicenseStatus, PushEvent,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Days before expiry at which the sweep starts pushing warnings.
pub(crate) const EXPIRY_WARNING_DAYS: i64 = 3;

/// Successful activation result.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationOutcome {
    pub token: String,
    pub status: LicenseStatus,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Successful validation result.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub status: LicenseStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub days_remaining: Option<i64>,
}

/// The license authority.
///
/// All state sits behind one `RwLock`. Every mutating operation takes the
/// write guard for its whole decision, so the quota check and the binding
/// insert in `activate` are one atomic step, and `validate` can never read
/// a license between a revoke being decided and becoming visible.
pub struct Authority {
    state: Arc<RwLock<AuthorityState>>,
    codec: TokenCodec,
    dispatcher: Arc<dyn PushDispatcher>,
}

impl Authority {
    /// Creates an authority with the given token codec and push dispatcher.
    pub fn new(codec: TokenCodec, dispatcher: Arc<dyn PushDispatcher>) -> Self {
        Self {
            state: Arc::new(RwLock::new(AuthorityState::default())),
            codec,
            dispatcher,
        }
    }

    // ── Device-facing operations ─────────────────────────────────

    /// Activates a license for a device.
    ///
    /// Idempotent per (device, license) pair: a device re-activating the
    /// license it is already bound to gets a fresh token without consuming
    /// another slot. A device bound to a different license is refused until
    /// that binding is cleared.
    pub async fn activate(
        &self,
        license_key: &str,
        device_id: &str,
        device_info: &str,
    ) -> Result<ActivationOutcome, ActivationError> {
        let now = Utc::now();
        let mut state = self.state.write().await;

        let license = state
            .licenses
            .get_mut(license_key)
            .ok_or(ActivationError::LicenseNotFound)?;

        // Lazy expiry: flip past-due records before judging status.
        if license.status == LicenseStatus::Active && license.is_expired(now) {
            license.status = LicenseStatus::Expired;
            let entry = AuditEntry::new(
                AuditAction::LicenseExpired,
                Some(license_key),
                None,
                "expired at activation attempt",
            );
            state.record(entry);
            return Err(ActivationError::LicenseExpired);
        }

        match license.status {
            LicenseStatus::Active => {}
            LicenseStatus::Unassigned => return Err(ActivationError::LicenseNotActive),
            LicenseStatus::Expired => return Err(ActivationError::LicenseExpired),
            LicenseStatus::Revoked => return Err(ActivationError::LicenseRevoked),
        }

        let status = license.status;
        let expires_at = license.expires_at;
        let max_devices = license.max_devices;

        match state.bindings.get(device_id) {
            Some(binding) if binding.license_key == license_key => {
                // Already bound here: re-issue only.
            }
            Some(_) => return Err(ActivationError::BoundToAnotherLicense),
            None => {
                // Quota check and insert under the same write guard: two
                // concurrent activations cannot both observe a free slot.
                if state.bound_count(license_key) >= max_devices as usize {
                    return Err(ActivationError::DeviceQuotaExceeded { max_devices });
                }
                state.bindings.insert(
                    device_id.to_string(),
                    DeviceBinding::new(device_id, device_info, license_key),
                );
                state.record(AuditEntry::new(
                    AuditAction::LicenseActivated,
                    Some(license_key),
                    Some(device_id),
                    format!("device {device_id} activated license {license_key}"),
                ));
                info!(license_key, device_id, "license activated");
            }
        }

        let token = self.codec.issue(device_id, license_key, now)?;
        Ok(ActivationOutcome {
            token,
            status,
            expires_at,
        })
    }

    /// Validates a bearer token against live license state.
    ///
    /// The signature/expiry check is cheap and runs before the lock is
    /// taken. Cryptographic validity alone is never enough: the license
    /// may have been revoked mid-token-lifetime, so the live record and
    /// binding are re-read under the lock.
    pub async fn validate(&self, token: &str) -> Result<ValidationOutcome, ValidationError> {
        let now = Utc::now();
        let claims = self.codec.verify(token, now)?;

        let mut state = self.state.write().await;

        let binding_license = match state.bindings.get(&claims.device_id) {
            Some(b) if b.license_key == claims.license_key => b.license_key.clone(),
            _ => return Err(ValidationError::BindingNotFound),
        };

        let license = state
            .licenses
            .get_mut(&binding_license)
            .ok_or(ValidationError::LicenseNotFound)?;

        if license.status == LicenseStatus::Active && license.is_expired(now) {
            license.status = LicenseStatus::Expired;
            let entry = AuditEntry::new(
                AuditAction::LicenseExpired,
                Some(&binding_license),
                None,
                "expired at validation",
            );
            state.record(entry);
            return Err(ValidationError::LicenseExpired);
        }

        match license.status {
            LicenseStatus::Active => {}
            LicenseStatus::Unassigned => return Err(ValidationError::LicenseNotActive),
            LicenseStatus::Expired => return Err(ValidationError::LicenseExpired),
            LicenseStatus::Revoked => return Err(ValidationError::LicenseRevoked),
        }

        let outcome = ValidationOutcome {
            status: license.status,
            expires_at: license.expires_at,
            days_remaining: license.days_remaining(now),
        };

        if let Some(binding) = state.bindings.get_mut(&claims.device_id) {
            binding.last_validated_at = Some(now);
        }

        Ok(outcome)
    }

    /// Registers (or rotates) a device's push channel token.
    ///
    /// Bearer-authenticated; the token's device claim must match
    /// `device_id`. The stored token is read at dispatch time, so this
    /// store is the commit point of a rotation: events sent before it go
    /// to the old channel, after it to the new one.
    pub async fn register_channel(
        &self,
        token: &str,
        device_id: &str,
        channel_token: &str,
    ) -> Result<(), ValidationError> {
        let claims = self.codec.verify(token, Utc::now())?;
        if claims.device_id != device_id {
            return Err(ValidationError::BindingNotFound);
        }

        let mut state = self.state.write().await;
        let binding = state
            .bindings
            .get_mut(device_id)
            .ok_or(ValidationError::BindingNotFound)?;
        binding.channel_token = Some(channel_token.to_string());
        let license_key = binding.license_key.clone();

        state.record(AuditEntry::new(
            AuditAction::ChannelRegistered,
            Some(&license_key),
            Some(device_id),
            "push channel registered",
        ));
        Ok(())
    }

    // ── Admin operations ─────────────────────────────────────────

    /// Creates an active license.
    pub async fn create_license(
        &self,
        key: &str,
        duration_days: Option<i64>,
        max_devices: u32,
    ) -> Result<LicenseRecord, AdminError> {
        self.insert_license(LicenseRecord::new(key, duration_days, max_devices))
            .await
    }

    /// Inserts a pre-built license record (used to restore persisted state).
    pub async fn insert_license(&self, record: LicenseRecord) -> Result<LicenseRecord, AdminError> {
        let mut state = self.state.write().await;
        if state.licenses.contains_key(&record.key) {
            return Err(AdminError::DuplicateKey(record.key));
        }
        state.record(AuditEntry::new(
            AuditAction::LicenseCreated,
            Some(&record.key),
            None,
            format!("license created, max_devices {}", record.max_devices),
        ));
        state.licenses.insert(record.key.clone(), record.clone());
        Ok(record)
    }

    /// Revokes a license and pushes a `license_revoked` event to every
    /// bound device with a registered channel.
    pub async fn revoke(&self, license_key: &str) -> Result<(), AdminError> {
        let mut state = self.state.write().await;
        let license = state
            .licenses
            .get_mut(license_key)
            .ok_or_else(|| AdminError::LicenseNotFound(license_key.to_string()))?;

        license.status = LicenseStatus::Revoked;
        license.revoked_at = Some(Utc::now());

        let entry = AuditEntry::new(
            AuditAction::LicenseRevoked,
            Some(license_key),
            None,
            "license revoked by admin",
        );
        state.record(entry);
        warn!(license_key, "license revoked");

        let event = PushEvent::revoked(license_key);
        for binding in state.bindings.values() {
            if binding.license_key == license_key {
                if let Some(channel) = &binding.channel_token {
                    self.dispatcher.dispatch(channel, &event);
                }
            }
        }
        Ok(())
    }

    /// Updates a license's expiry timestamp (admin extension or shortening).
    pub async fn update_expiry(
        &self,
        license_key: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), AdminError> {
        let mut state = self.state.write().await;
        let license = state
            .licenses
            .get_mut(license_key)
            .ok_or_else(|| AdminError::LicenseNotFound(license_key.to_string()))?;
        license.expires_at = expires_at;
        Ok(())
    }

    /// Deletes a license record and every binding attached to it.
    pub async fn delete_license(&self, license_key: &str) -> Result<(), AdminError> {
        let mut state = self.state.write().await;
        if state.licenses.remove(license_key).is_none() {
            return Err(AdminError::LicenseNotFound(license_key.to_string()));
        }
        state.bindings.retain(|_, b| b.license_key != license_key);
        state.record(AuditEntry::new(
            AuditAction::LicenseDeleted,
            Some(license_key),
            None,
            "license deleted",
        ));
        Ok(())
    }

    /// Automatic expiry sweep.
    ///
    /// Flips past-due `Active` licenses to `Expired` and pushes
    /// `license_expiring` warnings for licenses within the warning window.
    /// Returns the number of licenses expired by this pass.
    pub async fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut state = self.state.write().await;

        let mut expired_keys = Vec::new();
        let mut warnings = Vec::new();

        for license in state.licenses.values_mut() {
            if license.status != LicenseStatus::Active {
                continue;
            }
            if license.is_expired(now) {
                license.status = LicenseStatus::Expired;
                expired_keys.push(license.key.clone());
            } else if let Some(days) = license.days_remaining(now) {
                if days <= EXPIRY_WARNING_DAYS {
                    warnings.push((license.key.clone(), days));
                }
            }
        }

        for key in &expired_keys {
            let entry = AuditEntry::new(
                AuditAction::LicenseExpired,
                Some(key),
                None,
                "expired by sweep",
            );
            state.record(entry);
            info!(license_key = key.as_str(), "license expired by sweep");
        }

        for (key, days) in &warnings {
            let event = PushEvent::expiring(key, *days);
            for binding in state.bindings.values() {
                if &binding.license_key == key {
                    if let Some(channel) = &binding.channel_token {
                        self.dispatcher.dispatch(channel, &event);
                    }
                }
            }
        }

        expired_keys.len()
    }

    /// Broadcasts an admin message to every bound device with a channel.
    pub async fn broadcast_message(&self, title: &str, body: &str) {
        let event = PushEvent::message(title, body);
        let state = self.state.read().await;
        for binding in state.bindings.values() {
            if let Some(channel) = &binding.channel_token {
                self.dispatcher.dispatch(channel, &event);
            }
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    /// Returns all license records.
    pub async fn licenses(&self) -> Vec<LicenseRecord> {
        self.state.read().await.licenses.values().cloned().collect()
    }

    /// Returns one license record by key.
    pub async fn license(&self, key: &str) -> Option<LicenseRecord> {
        self.state.read().await.licenses.get(key).cloned()
    }

    /// Returns the bindings attached to a license.
    pub async fn devices(&self, license_key: &str) -> Vec<DeviceBinding> {
        self.state
            .read()
            .await
            .bindings
            .values()
            .filter(|b| b.license_key == license_key)
            .cloned()
            .collect()
    }

    /// Returns one binding by device id.
    pub async fn binding(&self, device_id: &str) -> Option<DeviceBinding> {
        self.state.read().await.bindings.get(device_id).cloned()
    }

    /// Returns the most recent `n` audit entries, newest first.
    pub async fn recent_audit(&self, n: usize) -> Vec<AuditEntry> {
        let state = self.state.read().await;
        state.audit.iter().rev().take(n).cloned().collect()
    }
}
