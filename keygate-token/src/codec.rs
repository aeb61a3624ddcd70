//! Token issuance and verification.
//!
//! The signature covers the base64url-encoded claims string, not the
//! decoded JSON, so the signed bytes are exactly what travels on the wire.

use crate::error::{TokenError, TokenResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

/// Token lifetime in seconds (24 hours).
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// The claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Device identifier the token is bound to.
    pub device_id: String,
    /// License key the device activated.
    pub license_key: String,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Expiry (seconds since epoch).
    pub exp: i64,
}

impl TokenClaims {
    /// Decodes the claims of a token without verifying its signature.
    ///
    /// Device-side only: a client may read its own cached token's claims
    /// (for example to recover the license key for silent re-activation).
    /// Never use this on the authority side.
    pub fn decode_unverified(token: &str) -> TokenResult<Self> {
        let payload_b64 = token
            .split('.')
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| TokenError::Malformed("empty token".to_string()))?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|e| TokenError::Malformed(format!("invalid payload base64: {e}")))?;
        serde_json::from_slice(&payload)
            .map_err(|e| TokenError::Malformed(format!("invalid claims JSON: {e}")))
    }
}

/// Issues and verifies signed bearer tokens.
///
/// The authority holds a signing codec; anything that only checks tokens
/// can hold a verify-only codec built from the public key.
pub struct TokenCodec {
    signing: Option<SigningKey>,
    verifying: VerifyingKey,
}

impl TokenCodec {
    /// Creates a codec that can both issue and verify.
    #[must_use]
    pub fn new(signing: SigningKey) -> Self {
        let verifying = signing.verifying_key();
        Self {
            signing: Some(signing),
            verifying,
        }
    }

    /// Creates a verify-only codec from a public key.
    #[must_use]
    pub fn verifier(verifying: VerifyingKey) -> Self {
        Self {
            signing: None,
            verifying,
        }
    }

    /// Returns the public verifying key.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.verifying
    }

    /// Issues a token for a device/license pair, valid for `TOKEN_TTL_SECS`
    /// from `now`.
    pub fn issue(
        &self,
        device_id: &str,
        license_key: &str,
        now: DateTime<Utc>,
    ) -> TokenResult<String> {
        let signing = self.signing.as_ref().ok_or(TokenError::SigningUnavailable)?;

        let claims = TokenClaims {
            device_id: device_id.to_string(),
            license_key: license_key.to_string(),
            iat: now.timestamp(),
            exp: now.timestamp() + TOKEN_TTL_SECS,
        };

        let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signature = signing.sign(payload_b64.as_bytes());
        let sig_b64 = URL_SAFE_NO_PAD.encode(signature.to_bytes());

        Ok(format!("{payload_b64}.{sig_b64}"))
    }

    /// Verifies a token: signature first, then expiry.
    ///
    /// Pure and local. Callers that need authoritative state (revocation)
    /// must re-read the live license record after this succeeds.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> TokenResult<TokenClaims> {
        let token = token.trim();

        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 2 {
            return Err(TokenError::Malformed(
                "token must have exactly two parts separated by a dot".to_string(),
            ));
        }
        let (payload_b64, sig_b64) = (parts[0], parts[1]);

        let sig_bytes = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|e| TokenError::Malformed(format!("invalid signature base64: {e}")))?;
        let signature = Signature::from_slice(&sig_bytes)
            .map_err(|_| TokenError::Malformed("invalid signature length".to_string()))?;

        self.verifying
            .verify(payload_b64.as_bytes(), &signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|e| TokenError::Malformed(format!("invalid payload base64: {e}")))?;
        let claims: TokenClaims = serde_json::from_slice(&payload)
            .map_err(|e| TokenError::Malformed(format!("invalid claims JSON: {e}")))?;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
