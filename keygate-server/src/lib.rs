//! HTTP surface of the Keygate license authority.
//!
//! Thin axum layer over [`Authority`]: handlers deserialize the wire
//! bodies, call the corresponding authority operation, and map its error
//! to a status code plus a stable error code string. All policy lives in
//! the authority; nothing here makes a licensing decision.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use keygate_authority::{ActivationError, Authority, ValidationError};
use keygate_types::wire::{
    codes, ActivateRequest, ActivateResponse, RegisterChannelRequest, RegisterChannelResponse,
    ValidateResponse,
};
use std::sync::Arc;
use tracing::debug;

/// Shared handler state.
pub type AppState = Arc<Authority>;

/// Builds the HTTP API router over an authority.
pub fn build_router(authority: AppState) -> Router {
    Router::new()
        .route("/activate", post(activate_handler))
        .route("/validate", post(validate_handler))
        .route("/register-fcm", post(register_channel_handler))
        .with_state(authority)
}

/// Extracts the bearer token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn activation_status(err: &ActivationError) -> StatusCode {
    match err {
        ActivationError::LicenseNotFound => StatusCode::NOT_FOUND,
        ActivationError::LicenseRevoked | ActivationError::DeviceQuotaExceeded { .. } => {
            StatusCode::FORBIDDEN
        }
        ActivationError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ActivationError::LicenseNotActive
        | ActivationError::LicenseExpired
        | ActivationError::BoundToAnotherLicense => StatusCode::BAD_REQUEST,
    }
}

fn validation_status(err: &ValidationError) -> StatusCode {
    match err {
        ValidationError::TokenExpired
        | ValidationError::TokenInvalidSignature
        | ValidationError::TokenMalformed(_) => StatusCode::UNAUTHORIZED,
        ValidationError::BindingNotFound | ValidationError::LicenseNotFound => {
            StatusCode::NOT_FOUND
        }
        ValidationError::LicenseRevoked | ValidationError::LicenseExpired => StatusCode::FORBIDDEN,
        ValidationError::LicenseNotActive => StatusCode::BAD_REQUEST,
    }
}

async fn activate_handler(
    State(authority): State<AppState>,
    Json(req): Json<ActivateRequest>,
) -> (StatusCode, Json<ActivateResponse>) {
    match authority
        .activate(&req.license_key, &req.device_id, &req.device_info)
        .await
    {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ActivateResponse::ok(
                outcome.token,
                outcome.status,
                outcome.expires_at,
            )),
        ),
        Err(e) => {
            debug!(code = e.code(), "activation refused");
            (activation_status(&e), Json(ActivateResponse::err(e.code())))
        }
    }
}

async fn validate_handler(
    State(authority): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<ValidateResponse>) {
    let Some(token) = bearer_token(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ValidateResponse::err(codes::TOKEN_MISSING)),
        );
    };

    match authority.validate(token).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ValidateResponse::ok(
                outcome.status,
                outcome.expires_at,
                outcome.days_remaining,
            )),
        ),
        Err(e) => {
            debug!(code = e.code(), "validation refused");
            (validation_status(&e), Json(ValidateResponse::err(e.code())))
        }
    }
}

async fn register_channel_handler(
    State(authority): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterChannelRequest>,
) -> (StatusCode, Json<RegisterChannelResponse>) {
    let Some(token) = bearer_token(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(RegisterChannelResponse::err(codes::TOKEN_MISSING)),
        );
    };

    match authority
        .register_channel(token, &req.device_id, &req.fcm_token)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(RegisterChannelResponse::ok())),
        Err(e) => (
            validation_status(&e),
            Json(RegisterChannelResponse::err(e.code())),
        ),
    }
}
