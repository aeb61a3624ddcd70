//! Shared test helpers for token tests.

#![allow(dead_code)]

use ed25519_dalek::SigningKey;
use keygate_token::TokenCodec;

/// Returns a deterministic Ed25519 signing key from a fixed seed.
pub fn test_signing_key() -> SigningKey {
    let seed: [u8; 32] = [
        7, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23,
        24, 25, 26, 27, 28, 29, 30, 31,
    ];
    SigningKey::from_bytes(&seed)
}

/// Returns a signing codec over the fixed test key.
pub fn test_codec() -> TokenCodec {
    TokenCodec::new(test_signing_key())
}
