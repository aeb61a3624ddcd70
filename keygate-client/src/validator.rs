//! The interactive validation client.
//!
//! Issues activation and validation requests, interprets responses, and
//! keeps the cache in step. All status changes are routed through the
//! lifecycle transition table so push and poll updates agree on the
//! tie-break rules.

use crate::api::{ApiError, AuthorityApi};
use crate::cache::{CacheRecord, SecureStore};
use crate::device::DeviceIdentity;
use crate::error::{ClientError, ClientResult, Denial};
use crate::lifecycle::{transition, Effect, LifecycleInput, LifecycleState};
use chrono::{DateTime, Utc};
use keygate_token::TokenClaims;
use keygate_types::wire::ActivateRequest;
use keygate_types::LicenseStatus;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one revalidation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Revalidation {
    /// Nothing activated; nothing to check.
    NotActivated,
    /// The license is still valid; the cache was refreshed.
    Valid {
        status: LicenseStatus,
        expires_at: Option<DateTime<Utc>>,
        days_remaining: Option<i64>,
    },
    /// The license expired; the cache now records the expired status.
    Expired,
    /// The license was revoked or the token rejected; the cache was
    /// cleared.
    Revoked,
}

/// Device-side client for activation and revalidation.
pub struct ValidationClient<A, S> {
    api: A,
    store: Arc<S>,
    device: DeviceIdentity,
}

impl<A: AuthorityApi, S: SecureStore> ValidationClient<A, S> {
    /// Creates a client for one device.
    pub fn new(api: A, store: Arc<S>, device: DeviceIdentity) -> Self {
        Self { api, store, device }
    }

    /// Returns the shared cache store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns this device's identity.
    pub fn device(&self) -> &DeviceIdentity {
        &self.device
    }

    /// Fast, network-free activity check against the cache.
    pub fn is_locally_active(&self) -> ClientResult<bool> {
        Ok(self
            .store
            .load()?
            .is_some_and(|r| r.is_locally_active(Utc::now())))
    }

    /// Activates a license for this device and caches the result.
    ///
    /// Denials are surfaced verbatim and leave the existing cache intact.
    pub async fn activate(&self, license_key: &str) -> ClientResult<CacheRecord> {
        let req = ActivateRequest {
            license_key: license_key.to_string(),
            device_id: self.device.id.clone(),
            device_info: self.device.info.clone(),
        };
        let grant = match self.api.activate(req).await {
            Ok(grant) => grant,
            Err(ApiError::Network(e)) => return Err(ClientError::Network(e)),
            Err(ApiError::Denied(d)) => return Err(ClientError::Denied(d)),
        };

        let record = CacheRecord::new(grant.token, grant.status, grant.expires_at);
        self.store.save(&record)?;
        info!(license_key, "license activated");
        Ok(record)
    }

    /// Revalidates the cached activation against the authority.
    ///
    /// Network failures leave the cache untouched and bubble up as
    /// [`ClientError::Network`] for the scheduler to retry. Authoritative
    /// denials are applied through the lifecycle table: expiry persists an
    /// expired record, revocation clears the cache.
    pub async fn revalidate(&self) -> ClientResult<Revalidation> {
        let Some(record) = self.store.load()? else {
            return Ok(Revalidation::NotActivated);
        };
        if !record.activated {
            return Ok(Revalidation::NotActivated);
        }

        match self.api.validate(&record.token).await {
            Ok(report) => {
                debug!(status = %report.status, "revalidation ok");
                self.commit_active(
                    record.token,
                    report.status,
                    report.expires_at,
                    report.days_remaining,
                )
            }
            Err(ApiError::Network(e)) => Err(ClientError::Network(e)),
            Err(ApiError::Denied(Denial::TokenExpired)) => {
                // A worn-out token is not a verdict on the license; silently
                // re-activate to get a fresh one.
                self.reactivate(&record).await
            }
            Err(ApiError::Denied(denial)) => self.apply_denial(denial),
        }
    }

    /// Re-registers the push channel token with the authority.
    ///
    /// Until this succeeds the caller must keep listening on the previous
    /// channel token; the authority switches targets only when the
    /// registration commits.
    pub async fn register_channel(&self, channel_token: &str) -> ClientResult<()> {
        let record = self
            .store
            .load()?
            .filter(|r| r.activated)
            .ok_or(ClientError::Denied(Denial::TokenMissing))?;

        match self
            .api
            .register_channel(&record.token, &self.device.id, channel_token)
            .await
        {
            Ok(()) => Ok(()),
            Err(ApiError::Network(e)) => Err(ClientError::Network(e)),
            Err(ApiError::Denied(d)) => Err(ClientError::Denied(d)),
        }
    }

    /// Explicit clear-and-reset, the only exit from `Expired`/`Revoked`.
    pub fn clear(&self) -> ClientResult<()> {
        let state = LifecycleState::from_record(self.store.load()?.as_ref());
        let t = transition(state, &LifecycleInput::ClearAndReset);
        self.apply_effects(None, &t.effects)?;
        Ok(())
    }

    /// Silent re-activation after a token-expired validation result.
    async fn reactivate(&self, record: &CacheRecord) -> ClientResult<Revalidation> {
        let claims = match TokenClaims::decode_unverified(&record.token) {
            Ok(claims) => claims,
            Err(e) => {
                // The cache cannot name its own license; it is unusable.
                warn!(error = %e, "cached token unreadable, clearing");
                self.store.clear()?;
                return Ok(Revalidation::Revoked);
            }
        };

        debug!(license_key = claims.license_key.as_str(), "token expired, re-activating");
        let req = ActivateRequest {
            license_key: claims.license_key.clone(),
            device_id: self.device.id.clone(),
            device_info: self.device.info.clone(),
        };
        match self.api.activate(req).await {
            Ok(grant) => {
                let days_remaining = grant
                    .expires_at
                    .map(|exp| (exp - Utc::now()).num_days().max(0));
                self.commit_active(grant.token, grant.status, grant.expires_at, days_remaining)
            }
            Err(ApiError::Network(e)) => Err(ClientError::Network(e)),
            Err(ApiError::Denied(denial)) => self.apply_denial(denial),
        }
    }

    /// Writes a fresh active snapshot to the cache, unless the cache moved
    /// to a worse state while the request was in flight.
    ///
    /// A push revocation can clear the store between the load at the top of
    /// [`Self::revalidate`] and the response arriving. The refresh is
    /// therefore replayed against the state the store holds *now*: revoked
    /// or cleared stays revoked or cleared, whatever the network said.
    fn commit_active(
        &self,
        token: String,
        status: LicenseStatus,
        expires_at: Option<DateTime<Utc>>,
        days_remaining: Option<i64>,
    ) -> ClientResult<Revalidation> {
        let current = self.store.load()?;
        let state = LifecycleState::from_record(current.as_ref());
        let t = transition(state, &LifecycleInput::ValidateActive);
        if !t.effects.contains(&Effect::Persist) {
            debug!(?state, "validation result superseded by a concurrent update");
            return Ok(match state {
                LifecycleState::Expired => Revalidation::Expired,
                LifecycleState::Revoked => Revalidation::Revoked,
                _ => Revalidation::NotActivated,
            });
        }

        let refreshed = CacheRecord {
            token,
            status,
            expires_at,
            last_validated_at: Utc::now(),
            activated: true,
        };
        self.store.save(&refreshed)?;
        Ok(Revalidation::Valid { status, expires_at, days_remaining })
    }

    /// Applies an authoritative denial through the lifecycle table.
    ///
    /// The cache is reloaded first: the denial's effects apply to whatever
    /// state the store holds now, not the snapshot taken before the request
    /// went out.
    fn apply_denial(&self, denial: Denial) -> ClientResult<Revalidation> {
        if let Denial::Other(code) = &denial {
            // A code this build does not know is not grounds for touching
            // the cache; let the scheduler retry.
            warn!(code = code.as_str(), "unrecognized denial code, treating as transient");
            return Err(ClientError::Network(format!("unrecognized denial code: {code}")));
        }

        let input = match denial {
            Denial::LicenseExpired => LifecycleInput::ValidateExpired,
            // Everything else authoritative is revocation-equivalent.
            _ => LifecycleInput::ValidateRevoked,
        };
        let current = self.store.load()?;
        let state = LifecycleState::from_record(current.as_ref());
        let t = transition(state, &input);

        let outcome = match input {
            LifecycleInput::ValidateExpired => Revalidation::Expired,
            _ => Revalidation::Revoked,
        };
        let expired_record = current.map(|r| CacheRecord {
            status: LicenseStatus::Expired,
            ..r
        });
        self.apply_effects(expired_record.as_ref(), &t.effects)?;
        warn!(denial = %denial, "authoritative denial applied");
        Ok(outcome)
    }

    /// Applies transition effects to the store. `Notify` effects are left
    /// to the caller's context (revalidator or UI).
    fn apply_effects(
        &self,
        persist_as: Option<&CacheRecord>,
        effects: &[Effect],
    ) -> ClientResult<()> {
        for effect in effects {
            match effect {
                Effect::ClearCache => self.store.clear()?,
                Effect::Persist => {
                    if let Some(record) = persist_as {
                        self.store.save(record)?;
                    }
                }
                Effect::Notify(_) => {}
            }
        }
        Ok(())
    }
}
