//! Shared test helpers for client tests.

#![allow(dead_code)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use keygate_client::{
    ActivationGrant, ApiError, AuthorityApi, CacheRecord, DeviceIdentity, MemoryStore,
    ValidationClient, ValidationReport,
};
use keygate_types::wire::ActivateRequest;
use keygate_types::LicenseStatus;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Scripted [`AuthorityApi`] stub. Each call pops the next queued
/// response; an empty queue yields a network error.
#[derive(Default)]
pub struct StubApi {
    pub activations: Mutex<VecDeque<Result<ActivationGrant, ApiError>>>,
    pub validations: Mutex<VecDeque<Result<ValidationReport, ApiError>>>,
    pub registered_channels: Mutex<Vec<String>>,
}

impl StubApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_activation(&self, resp: Result<ActivationGrant, ApiError>) {
        self.activations.lock().unwrap().push_back(resp);
    }

    pub fn queue_validation(&self, resp: Result<ValidationReport, ApiError>) {
        self.validations.lock().unwrap().push_back(resp);
    }
}

impl AuthorityApi for StubApi {
    async fn activate(&self, _req: ActivateRequest) -> Result<ActivationGrant, ApiError> {
        self.activations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no scripted activation".to_string())))
    }

    async fn validate(&self, _token: &str) -> Result<ValidationReport, ApiError> {
        self.validations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no scripted validation".to_string())))
    }

    async fn register_channel(
        &self,
        _token: &str,
        _device_id: &str,
        channel_token: &str,
    ) -> Result<(), ApiError> {
        self.registered_channels
            .lock()
            .unwrap()
            .push(channel_token.to_string());
        Ok(())
    }
}

/// Stub whose `validate` signals once the request is in flight and then
/// waits for the test to release it before answering. Lets a test change
/// the cache while a revalidation round trip is pending.
pub struct GatedApi {
    entered: Mutex<Option<oneshot::Sender<()>>>,
    release: Mutex<Option<oneshot::Receiver<()>>>,
    response: Mutex<Option<Result<ValidationReport, ApiError>>>,
}

impl GatedApi {
    /// Returns the stub plus the in-flight signal and the release trigger.
    pub fn new(
        response: Result<ValidationReport, ApiError>,
    ) -> (Arc<Self>, oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let api = Arc::new(Self {
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(Some(release_rx)),
            response: Mutex::new(Some(response)),
        });
        (api, entered_rx, release_tx)
    }
}

impl AuthorityApi for GatedApi {
    async fn activate(&self, _req: ActivateRequest) -> Result<ActivationGrant, ApiError> {
        Err(ApiError::Network("no scripted activation".to_string()))
    }

    async fn validate(&self, _token: &str) -> Result<ValidationReport, ApiError> {
        if let Some(tx) = self.entered.lock().unwrap().take() {
            let _ = tx.send(());
        }
        let release = self.release.lock().unwrap().take();
        if let Some(rx) = release {
            let _ = rx.await;
        }
        self.response
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(ApiError::Network("no scripted validation".to_string())))
    }

    async fn register_channel(
        &self,
        _token: &str,
        _device_id: &str,
        _channel_token: &str,
    ) -> Result<(), ApiError> {
        Ok(())
    }
}

/// A syntactically decodable token whose claims name the given license.
/// The signature part is garbage; only `decode_unverified` reads these.
pub fn fake_token(device_id: &str, license_key: &str) -> String {
    let claims = format!(
        r#"{{"device_id":"{device_id}","license_key":"{license_key}","iat":0,"exp":0}}"#
    );
    format!("{}.c2ln", URL_SAFE_NO_PAD.encode(claims))
}

/// An active cache record expiring `days` from now.
pub fn active_record(days: i64) -> CacheRecord {
    CacheRecord::new(
        fake_token("dev-1", "KEY-A"),
        LicenseStatus::Active,
        Some(Utc::now() + Duration::days(days)),
    )
}

/// A grant mirroring `active_record`.
pub fn grant(days: i64) -> ActivationGrant {
    ActivationGrant {
        token: fake_token("dev-1", "KEY-A"),
        status: LicenseStatus::Active,
        expires_at: Some(Utc::now() + Duration::days(days)),
    }
}

/// A valid report expiring `days` from now.
pub fn report(days: i64) -> ValidationReport {
    ValidationReport {
        status: LicenseStatus::Active,
        expires_at: Some(Utc::now() + Duration::days(days)),
        days_remaining: Some(days),
    }
}

/// Builds a client over a fresh stub and in-memory store.
pub fn test_client() -> (Arc<ValidationClient<Arc<StubApi>, MemoryStore>>, Arc<StubApi>, Arc<MemoryStore>) {
    let api = Arc::new(StubApi::new());
    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(ValidationClient::new(
        Arc::clone(&api),
        Arc::clone(&store),
        DeviceIdentity::new("dev-1", "test device"),
    ));
    (client, api, store)
}
