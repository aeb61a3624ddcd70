//! The device-side push receiver.
//!
//! Maps each push event kind to a lifecycle input and applies the
//! resulting effects. The mapping is a plain dispatch table: what each
//! event kind does to the state machine is visible in one place and
//! testable without any transport.
//!
//! Revocation events clear the cache from any state, so a push arriving
//! before, during, or after a concurrent poll always leaves the cache
//! cleared — the receiver does not need to know about the poll at all.

use crate::cache::SecureStore;
use crate::error::ClientResult;
use crate::lifecycle::{transition, Effect, LifecycleInput, LifecycleState, Notice};
use keygate_types::PushEvent;
use std::sync::Arc;
use tracing::{debug, warn};

/// Receives push events and applies them to the local cache.
pub struct PushReceiver<S> {
    store: Arc<S>,
}

impl<S: SecureStore> PushReceiver<S> {
    /// Creates a receiver over the shared cache store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Handles one decoded push event, returning the notices to display.
    pub fn handle(&self, event: &PushEvent) -> ClientResult<Vec<Notice>> {
        // Dispatch table: event kind → lifecycle input.
        let input = match event {
            PushEvent::LicenseRevoked { .. } => LifecycleInput::PushRevoked,
            PushEvent::LicenseExpiring { days_remaining, .. } => LifecycleInput::PushExpiring {
                days_remaining: *days_remaining,
            },
            PushEvent::AdminMessage { title, body } => LifecycleInput::PushMessage {
                title: title.clone(),
                body: body.clone(),
            },
        };

        let record = self.store.load()?;
        let state = LifecycleState::from_record(record.as_ref());
        let t = transition(state, &input);
        debug!(kind = event.kind(), ?state, next = ?t.next, "push event");

        let mut notices = Vec::new();
        for effect in t.effects {
            match effect {
                Effect::ClearCache => self.store.clear()?,
                // Push events never refresh the record; Persist does not
                // occur for push inputs.
                Effect::Persist => {}
                Effect::Notify(notice) => notices.push(notice),
            }
        }
        Ok(notices)
    }

    /// Handles a raw push payload.
    ///
    /// A payload that fails to parse is logged and ignored: an unparseable
    /// message is a soft failure and never grounds for invalidating the
    /// license.
    pub fn handle_json(&self, payload: &str) -> ClientResult<Vec<Notice>> {
        match serde_json::from_str::<PushEvent>(payload) {
            Ok(event) => self.handle(&event),
            Err(e) => {
                warn!(error = %e, "unparseable push payload dropped");
                Ok(Vec::new())
            }
        }
    }
}
