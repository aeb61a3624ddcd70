mod common;

use chrono::{Duration, Utc};
use common::test_authority;
use keygate_authority::ActivationError;
use keygate_types::{LicenseRecord, LicenseStatus};

// ── Happy path ───────────────────────────────────────────────────

#[tokio::test]
async fn activate_fresh_key_succeeds() {
    let authority = test_authority();
    authority.create_license("KEY-A", Some(30), 3).await.unwrap();

    let outcome = authority.activate("KEY-A", "dev-1", "pixel 8").await.unwrap();
    assert_eq!(outcome.status, LicenseStatus::Active);
    assert!(!outcome.token.is_empty());
    assert!(outcome.expires_at.is_some());

    let binding = authority.binding("dev-1").await.unwrap();
    assert_eq!(binding.license_key, "KEY-A");
    assert_eq!(binding.device_info, "pixel 8");
}

#[tokio::test]
async fn non_expiring_license_has_no_expiry() {
    let authority = test_authority();
    authority.create_license("KEY-A", None, 1).await.unwrap();

    let outcome = authority.activate("KEY-A", "dev-1", "").await.unwrap();
    assert!(outcome.expires_at.is_none());
}

// ── Idempotence ──────────────────────────────────────────────────

#[tokio::test]
async fn reactivation_is_idempotent_and_consumes_no_slot() {
    let authority = test_authority();
    authority.create_license("KEY-A", Some(30), 1).await.unwrap();

    let first = authority.activate("KEY-A", "dev-1", "").await.unwrap();
    let second = authority.activate("KEY-A", "dev-1", "").await.unwrap();

    assert_eq!(first.status, second.status);
    assert_eq!(first.expires_at, second.expires_at);
    // max_devices = 1 and the same device activated twice, so exactly one
    // binding exists.
    assert_eq!(authority.devices("KEY-A").await.len(), 1);
}

// ── Error cases ──────────────────────────────────────────────────

#[tokio::test]
async fn unknown_key_is_not_found() {
    let authority = test_authority();
    let err = authority.activate("NOPE", "dev-1", "").await.unwrap_err();
    assert!(matches!(err, ActivationError::LicenseNotFound));
}

#[tokio::test]
async fn revoked_license_cannot_activate() {
    let authority = test_authority();
    authority.create_license("KEY-A", Some(30), 3).await.unwrap();
    authority.revoke("KEY-A").await.unwrap();

    let err = authority.activate("KEY-A", "dev-1", "").await.unwrap_err();
    assert!(matches!(err, ActivationError::LicenseRevoked));
}

#[tokio::test]
async fn past_due_license_flips_to_expired_on_activation() {
    let authority = test_authority();
    let mut record = LicenseRecord::new("KEY-A", Some(30), 3);
    record.expires_at = Some(Utc::now() - Duration::days(1));
    authority.insert_license(record).await.unwrap();

    let err = authority.activate("KEY-A", "dev-1", "").await.unwrap_err();
    assert!(matches!(err, ActivationError::LicenseExpired));

    let license = authority.license("KEY-A").await.unwrap();
    assert_eq!(license.status, LicenseStatus::Expired);
}

#[tokio::test]
async fn unassigned_license_is_not_active() {
    let authority = test_authority();
    let mut record = LicenseRecord::new("KEY-A", None, 1);
    record.status = LicenseStatus::Unassigned;
    authority.insert_license(record).await.unwrap();

    let err = authority.activate("KEY-A", "dev-1", "").await.unwrap_err();
    assert!(matches!(err, ActivationError::LicenseNotActive));
}

#[tokio::test]
async fn device_quota_exceeded_creates_no_binding() {
    let authority = test_authority();
    authority.create_license("KEY-A", Some(30), 2).await.unwrap();

    authority.activate("KEY-A", "dev-1", "").await.unwrap();
    authority.activate("KEY-A", "dev-2", "").await.unwrap();

    let err = authority.activate("KEY-A", "dev-3", "").await.unwrap_err();
    assert!(matches!(
        err,
        ActivationError::DeviceQuotaExceeded { max_devices: 2 }
    ));
    assert_eq!(authority.devices("KEY-A").await.len(), 2);
    assert!(authority.binding("dev-3").await.is_none());
}

#[tokio::test]
async fn device_cannot_rebind_without_clearing() {
    let authority = test_authority();
    authority.create_license("KEY-A", Some(30), 3).await.unwrap();
    authority.create_license("KEY-B", Some(30), 3).await.unwrap();

    authority.activate("KEY-A", "dev-1", "").await.unwrap();
    let err = authority.activate("KEY-B", "dev-1", "").await.unwrap_err();
    assert!(matches!(err, ActivationError::BoundToAnotherLicense));
}

#[tokio::test]
async fn deleting_license_frees_the_device() {
    let authority = test_authority();
    authority.create_license("KEY-A", Some(30), 3).await.unwrap();
    authority.create_license("KEY-B", Some(30), 3).await.unwrap();

    authority.activate("KEY-A", "dev-1", "").await.unwrap();
    authority.delete_license("KEY-A").await.unwrap();

    // Binding went with the license; the device can bind elsewhere now.
    assert!(authority.binding("dev-1").await.is_none());
    authority.activate("KEY-B", "dev-1", "").await.unwrap();
}

#[tokio::test]
async fn duplicate_key_rejected() {
    let authority = test_authority();
    authority.create_license("KEY-A", None, 1).await.unwrap();
    assert!(authority.create_license("KEY-A", None, 1).await.is_err());
}
