mod common;

use common::active_record;
use keygate_client::{MemoryStore, Notice, PushReceiver, SecureStore};
use pretty_assertions::assert_eq;
use keygate_types::PushEvent;
use std::sync::Arc;

fn receiver() -> (PushReceiver<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (PushReceiver::new(Arc::clone(&store)), store)
}

#[test]
fn revocation_clears_an_active_cache() {
    let (rx, store) = receiver();
    store.save(&active_record(30)).unwrap();

    let notices = rx.handle(&PushEvent::revoked("KEY-A")).unwrap();
    assert_eq!(notices, vec![Notice::LicenseInvalid]);
    assert!(store.load().unwrap().is_none());
}

#[test]
fn revocation_on_empty_cache_is_silent() {
    let (rx, store) = receiver();

    let notices = rx.handle(&PushEvent::revoked("KEY-A")).unwrap();
    assert!(notices.is_empty());
    assert!(store.load().unwrap().is_none());
}

#[test]
fn expiry_warning_is_display_only() {
    let (rx, store) = receiver();
    let record = active_record(2);
    store.save(&record).unwrap();

    let notices = rx.handle(&PushEvent::expiring("KEY-A", 2)).unwrap();
    assert_eq!(notices, vec![Notice::ExpiryWarning { days_remaining: 2 }]);
    assert_eq!(store.load().unwrap().unwrap(), record);
}

#[test]
fn admin_message_is_display_only() {
    let (rx, store) = receiver();
    let record = active_record(30);
    store.save(&record).unwrap();

    let notices = rx
        .handle(&PushEvent::message("Maintenance", "Back at noon"))
        .unwrap();
    assert_eq!(
        notices,
        vec![Notice::Message {
            title: "Maintenance".to_string(),
            body: "Back at noon".to_string(),
        }]
    );
    assert_eq!(store.load().unwrap().unwrap(), record);
}

#[test]
fn revocation_wins_regardless_of_arrival_order() {
    // A push landing after a poll already cleared the cache must still
    // end with a cleared cache, and vice versa.
    let (rx, store) = receiver();
    store.save(&active_record(30)).unwrap();

    rx.handle(&PushEvent::revoked("KEY-A")).unwrap();
    rx.handle(&PushEvent::revoked("KEY-A")).unwrap();
    assert!(store.load().unwrap().is_none());
}

#[test]
fn json_payload_round_trips_through_the_receiver() {
    let (rx, store) = receiver();
    store.save(&active_record(30)).unwrap();

    let payload = serde_json::to_string(&PushEvent::revoked("KEY-A")).unwrap();
    let notices = rx.handle_json(&payload).unwrap();
    assert_eq!(notices, vec![Notice::LicenseInvalid]);
    assert!(store.load().unwrap().is_none());
}

#[test]
fn unparseable_payload_never_invalidates() {
    let (rx, store) = receiver();
    let record = active_record(30);
    store.save(&record).unwrap();

    let notices = rx.handle_json("{not json").unwrap();
    assert!(notices.is_empty());

    let notices = rx
        .handle_json(r#"{"type":"license_launched"}"#)
        .unwrap();
    assert!(notices.is_empty());
    assert_eq!(store.load().unwrap().unwrap(), record);
}
