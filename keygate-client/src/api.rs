//! The authority API seam.
//!
//! [`AuthorityApi`] abstracts the wire so the validation client and the
//! revalidator can be exercised against a scripted stub. The HTTP
//! implementation is behind the `online` feature.
//!
//! Error mapping policy: transport failures, timeouts, and responses that
//! fail to parse all become [`ApiError::Network`]. A malformed response is
//! a soft failure, never proof of revocation.

use crate::error::Denial;
use chrono::{DateTime, Utc};
use keygate_types::wire::ActivateRequest;
use keygate_types::LicenseStatus;
use std::future::Future;
use thiserror::Error;

/// A successful activation response.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationGrant {
    pub token: String,
    pub status: LicenseStatus,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A successful validation response.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub status: LicenseStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub days_remaining: Option<i64>,
}

/// Errors from the API seam.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transient: transport failure, timeout, or unparseable response.
    #[error("network error: {0}")]
    Network(String),

    /// Authoritative denial carried in the response body.
    #[error("denied: {0}")]
    Denied(Denial),
}

/// Client-side view of the authority's HTTP operations.
pub trait AuthorityApi: Send + Sync {
    /// `POST /activate`.
    fn activate(
        &self,
        req: ActivateRequest,
    ) -> impl Future<Output = Result<ActivationGrant, ApiError>> + Send;

    /// `POST /validate` with a bearer token.
    fn validate(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<ValidationReport, ApiError>> + Send;

    /// `POST /register-fcm` with a bearer token.
    fn register_channel(
        &self,
        token: &str,
        device_id: &str,
        channel_token: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl<T: AuthorityApi> AuthorityApi for std::sync::Arc<T> {
    async fn activate(&self, req: ActivateRequest) -> Result<ActivationGrant, ApiError> {
        (**self).activate(req).await
    }

    async fn validate(&self, token: &str) -> Result<ValidationReport, ApiError> {
        (**self).validate(token).await
    }

    async fn register_channel(
        &self,
        token: &str,
        device_id: &str,
        channel_token: &str,
    ) -> Result<(), ApiError> {
        (**self).register_channel(token, device_id, channel_token).await
    }
}

#[cfg(feature = "online")]
pub use http::HttpApi;

#[cfg(feature = "online")]
mod http {
    use super::{ActivationGrant, ApiError, AuthorityApi, ValidationReport};
    use crate::error::Denial;
    use keygate_types::wire::{
        ActivateRequest, ActivateResponse, RegisterChannelRequest, RegisterChannelResponse,
        ValidateResponse,
    };
    use std::time::Duration;
    use tracing::warn;

    /// HTTP implementation of [`AuthorityApi`] over reqwest.
    pub struct HttpApi {
        base_url: String,
        http: reqwest::Client,
    }

    impl HttpApi {
        /// Creates a client for an authority at `base_url` (no trailing
        /// slash), with a 10 second request timeout.
        pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .map_err(|e| ApiError::Network(e.to_string()))?;
            Ok(Self {
                base_url: base_url.into(),
                http,
            })
        }

        fn url(&self, path: &str) -> String {
            format!("{}{path}", self.base_url)
        }
    }

    fn net(e: reqwest::Error) -> ApiError {
        ApiError::Network(e.to_string())
    }

    fn denial(error: Option<String>, context: &str) -> ApiError {
        match error {
            Some(code) => ApiError::Denied(Denial::from_code(&code)),
            None => {
                warn!(context, "failure response without error code");
                ApiError::Network(format!("malformed {context} response"))
            }
        }
    }

    impl AuthorityApi for HttpApi {
        async fn activate(&self, req: ActivateRequest) -> Result<ActivationGrant, ApiError> {
            let resp = self
                .http
                .post(self.url("/activate"))
                .json(&req)
                .send()
                .await
                .map_err(net)?;
            let body: ActivateResponse = resp.json().await.map_err(net)?;

            if !body.success {
                return Err(denial(body.error, "activate"));
            }
            match (body.token, body.license_status) {
                (Some(token), Some(status)) => Ok(ActivationGrant {
                    token,
                    status,
                    expires_at: body.expires_at,
                }),
                _ => Err(ApiError::Network("malformed activate response".to_string())),
            }
        }

        async fn validate(&self, token: &str) -> Result<ValidationReport, ApiError> {
            let resp = self
                .http
                .post(self.url("/validate"))
                .bearer_auth(token)
                .send()
                .await
                .map_err(net)?;
            let body: ValidateResponse = resp.json().await.map_err(net)?;

            if !body.valid {
                return Err(denial(body.error, "validate"));
            }
            match body.license_status {
                Some(status) => Ok(ValidationReport {
                    status,
                    expires_at: body.expires_at,
                    days_remaining: body.days_remaining,
                }),
                None => Err(ApiError::Network("malformed validate response".to_string())),
            }
        }

        async fn register_channel(
            &self,
            token: &str,
            device_id: &str,
            channel_token: &str,
        ) -> Result<(), ApiError> {
            let req = RegisterChannelRequest {
                device_id: device_id.to_string(),
                fcm_token: channel_token.to_string(),
            };
            let resp = self
                .http
                .post(self.url("/register-fcm"))
                .bearer_auth(token)
                .json(&req)
                .send()
                .await
                .map_err(net)?;
            let body: RegisterChannelResponse = resp.json().await.map_err(net)?;

            // Success is the empty object; anything else names the refusal.
            match body.error {
                None => Ok(()),
                Some(code) => Err(denial(Some(code), "register-fcm")),
            }
        }
    }
}
