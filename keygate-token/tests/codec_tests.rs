mod common;

use chrono::{Duration, Utc};
use common::{test_codec, test_signing_key};
use ed25519_dalek::SigningKey;
use keygate_token::{TokenClaims, TokenCodec, TokenError, TOKEN_TTL_SECS};

// ── Issue / verify ───────────────────────────────────────────────

#[test]
fn issue_then_verify_returns_claims() {
    let codec = test_codec();
    let now = Utc::now();
    let token = codec.issue("dev-1", "KEY-AAAA", now).unwrap();

    let claims = codec.verify(&token, now).unwrap();
    assert_eq!(claims.device_id, "dev-1");
    assert_eq!(claims.license_key, "KEY-AAAA");
    assert_eq!(claims.iat, now.timestamp());
    assert_eq!(claims.exp, now.timestamp() + TOKEN_TTL_SECS);
}

#[test]
fn verify_only_codec_accepts_issued_token() {
    let signing = test_signing_key();
    let issuer = TokenCodec::new(signing.clone());
    let verifier = TokenCodec::verifier(signing.verifying_key());

    let now = Utc::now();
    let token = issuer.issue("dev-1", "KEY-AAAA", now).unwrap();
    assert!(verifier.verify(&token, now).is_ok());
}

#[test]
fn verify_only_codec_cannot_issue() {
    let verifier = TokenCodec::verifier(test_signing_key().verifying_key());
    let err = verifier.issue("dev-1", "KEY-AAAA", Utc::now()).unwrap_err();
    assert!(matches!(err, TokenError::SigningUnavailable));
}

#[test]
fn verify_trims_whitespace() {
    let codec = test_codec();
    let now = Utc::now();
    let token = codec.issue("dev-1", "KEY-AAAA", now).unwrap();
    assert!(codec.verify(&format!("  {token}  "), now).is_ok());
}

// ── Expiry vs signature: distinct causes ─────────────────────────

#[test]
fn expired_token_is_rejected_as_expired() {
    let codec = test_codec();
    let issued = Utc::now() - Duration::seconds(TOKEN_TTL_SECS + 60);
    let token = codec.issue("dev-1", "KEY-AAAA", issued).unwrap();

    let err = codec.verify(&token, Utc::now()).unwrap_err();
    assert!(matches!(err, TokenError::Expired));
}

#[test]
fn token_valid_just_before_expiry() {
    let codec = test_codec();
    let issued = Utc::now();
    let token = codec.issue("dev-1", "KEY-AAAA", issued).unwrap();

    let just_before = issued + Duration::seconds(TOKEN_TTL_SECS - 1);
    assert!(codec.verify(&token, just_before).is_ok());

    let at_expiry = issued + Duration::seconds(TOKEN_TTL_SECS);
    assert!(matches!(
        codec.verify(&token, at_expiry),
        Err(TokenError::Expired)
    ));
}

#[test]
fn tampered_payload_fails_signature_not_expiry() {
    let codec = test_codec();
    // Issue an already-expired token, then tamper with the payload. The
    // signature check runs first, so the error must be InvalidSignature.
    let issued = Utc::now() - Duration::seconds(TOKEN_TTL_SECS + 60);
    let token = codec.issue("dev-1", "KEY-AAAA", issued).unwrap();

    let (payload, sig) = token.split_once('.').unwrap();
    let mut bytes = payload.as_bytes().to_vec();
    bytes[0] = if bytes[0] == b'A' { b'B' } else { b'A' };
    let tampered = format!("{}.{sig}", String::from_utf8(bytes).unwrap());

    let err = codec.verify(&tampered, Utc::now()).unwrap_err();
    assert!(matches!(err, TokenError::InvalidSignature));
}

#[test]
fn wrong_key_fails_signature() {
    let codec = test_codec();
    let other = TokenCodec::new(SigningKey::from_bytes(&[9u8; 32]));

    let now = Utc::now();
    let token = codec.issue("dev-1", "KEY-AAAA", now).unwrap();
    let err = other.verify(&token, now).unwrap_err();
    assert!(matches!(err, TokenError::InvalidSignature));
}

// ── Malformed input ──────────────────────────────────────────────

#[test]
fn garbage_is_malformed() {
    let codec = test_codec();
    for bad in ["", "not-a-token", "a.b.c", "只有一个部分"] {
        let err = codec.verify(bad, Utc::now()).unwrap_err();
        assert!(matches!(err, TokenError::Malformed(_)), "input: {bad:?}");
    }
}

#[test]
fn invalid_base64_signature_is_malformed() {
    let codec = test_codec();
    let now = Utc::now();
    let token = codec.issue("dev-1", "KEY-AAAA", now).unwrap();
    let (payload, _) = token.split_once('.').unwrap();

    let err = codec.verify(&format!("{payload}.!!!"), now).unwrap_err();
    assert!(matches!(err, TokenError::Malformed(_)));
}

// ── Unverified decoding (device side) ────────────────────────────

#[test]
fn decode_unverified_reads_claims() {
    let codec = test_codec();
    let now = Utc::now();
    let token = codec.issue("dev-1", "KEY-AAAA", now).unwrap();

    let claims = TokenClaims::decode_unverified(&token).unwrap();
    assert_eq!(claims.license_key, "KEY-AAAA");
    assert_eq!(claims.device_id, "dev-1");
}

#[test]
fn decode_unverified_rejects_garbage() {
    assert!(TokenClaims::decode_unverified("").is_err());
    assert!(TokenClaims::decode_unverified("!!??").is_err());
}

// ── Idempotent re-issue ──────────────────────────────────────────

#[test]
fn reissued_tokens_carry_equivalent_claims() {
    let codec = test_codec();
    let now = Utc::now();
    let t1 = codec.issue("dev-1", "KEY-AAAA", now).unwrap();
    let t2 = codec.issue("dev-1", "KEY-AAAA", now).unwrap();

    let c1 = codec.verify(&t1, now).unwrap();
    let c2 = codec.verify(&t2, now).unwrap();
    assert_eq!(c1, c2);
}
