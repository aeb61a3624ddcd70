//! Shared test helpers for authority tests.

#![allow(dead_code)]

use ed25519_dalek::SigningKey;
use keygate_authority::{Authority, ChannelDispatcher, NullDispatcher};
use keygate_token::TokenCodec;
use keygate_types::PushEvent;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Returns a deterministic Ed25519 signing key from a fixed seed.
pub fn test_signing_key() -> SigningKey {
    let seed: [u8; 32] = [
        42, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23,
        24, 25, 26, 27, 28, 29, 30, 31,
    ];
    SigningKey::from_bytes(&seed)
}

/// Builds an authority with a null push dispatcher.
pub fn test_authority() -> Authority {
    Authority::new(
        TokenCodec::new(test_signing_key()),
        Arc::new(NullDispatcher),
    )
}

/// Builds an authority whose push events land on the returned receiver.
pub fn test_authority_with_channel() -> (Authority, UnboundedReceiver<(String, PushEvent)>) {
    let (dispatcher, rx) = ChannelDispatcher::new();
    let authority = Authority::new(TokenCodec::new(test_signing_key()), Arc::new(dispatcher));
    (authority, rx)
}

/// Returns a codec over the same key as `test_authority`, for minting
/// tokens outside the authority (expired, tampered, foreign).
pub fn test_codec() -> TokenCodec {
    TokenCodec::new(test_signing_key())
}
