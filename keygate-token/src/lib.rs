//! Signed bearer token codec.
//!
//! Tokens bind a device identity to a license key and an expiry instant.
//! The format is `base64url(claims_json).base64url(signature)` with an
//! Ed25519 signature over the encoded claims bytes.
//!
//! Tokens are stateless: the authority never stores them, it re-derives
//! validity from the signature, the expiry claim, and the live license
//! record. A cryptographically valid token is therefore necessary but not
//! sufficient for access.
//!
//! Verification distinguishes three failure causes that callers treat
//! differently: an expired token triggers silent re-activation, a bad
//! signature is a security failure, and a malformed token is a protocol
//! error.

mod codec;
mod error;

pub use codec::{TokenClaims, TokenCodec, TOKEN_TTL_SECS};
pub use error::{TokenError, TokenResult};
