//! The device-side lifecycle state machine.
//!
//! `Unactivated → Active → {Active | Expired | Revoked} → Unactivated`,
//! where re-entry happens only via a fresh explicit activation. `Expired`
//! and `Revoked` are terminal with respect to automatic recovery.
//!
//! [`transition`] is a pure function from (state, input) to the next state
//! plus a list of side-effect events. Both the polling path and the push
//! path feed it, which makes the revocation tie-break a property of the
//! table rather than of call ordering: a revocation input yields
//! `ClearCache` from every state, so it wins no matter which concurrent
//! update lands last.
//!
//! Validation inputs carry no `Notify` effects; the interactive caller
//! sees the outcome directly and the background revalidator raises its own
//! notices. Push inputs are display-driven, so their notices live here.

use crate::cache::CacheRecord;
use keygate_types::LicenseStatus;

/// Device-side lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unactivated,
    Active,
    Expired,
    Revoked,
}

impl LifecycleState {
    /// Derives the lifecycle state from the cached record.
    #[must_use]
    pub fn from_record(record: Option<&CacheRecord>) -> Self {
        match record {
            Some(r) if r.activated => match r.status {
                LicenseStatus::Active => Self::Active,
                LicenseStatus::Expired => Self::Expired,
                LicenseStatus::Revoked => Self::Revoked,
                LicenseStatus::Unassigned => Self::Unactivated,
            },
            _ => Self::Unactivated,
        }
    }
}

/// An input event to the lifecycle machine.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleInput {
    /// A fresh activation call succeeded.
    ActivateSuccess,
    /// Periodic or interactive validation confirmed the license is active.
    ValidateActive,
    /// Validation reported the license as expired.
    ValidateExpired,
    /// Validation reported the license as revoked or the token as invalid.
    ValidateRevoked,
    /// Push: the license was revoked.
    PushRevoked,
    /// Push: the license expires soon. Display-only.
    PushExpiring { days_remaining: i64 },
    /// Push: free-form admin message. Display-only.
    PushMessage { title: String, body: String },
    /// Explicit user-driven clear, preparing for a new activation.
    ClearAndReset,
}

/// A user-visible notification raised by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The license expires in `days_remaining` days.
    ExpiryWarning { days_remaining: i64 },
    /// The license is no longer valid.
    LicenseInvalid,
    /// Free-form admin message.
    Message { title: String, body: String },
}

/// A side effect the caller must apply after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Persist the refreshed cache record.
    Persist,
    /// Atomically clear the entire cache record.
    ClearCache,
    /// Raise a local notification.
    Notify(Notice),
}

/// The result of feeding one input to the machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: LifecycleState,
    pub effects: Vec<Effect>,
}

/// Computes the next lifecycle state and its side effects.
#[must_use]
pub fn transition(state: LifecycleState, input: &LifecycleInput) -> Transition {
    use Effect::{ClearCache, Notify, Persist};
    use LifecycleState::{Active, Expired, Revoked, Unactivated};

    match input {
        LifecycleInput::ActivateSuccess => Transition {
            next: Active,
            effects: vec![Persist],
        },

        LifecycleInput::ValidateActive => match state {
            // Refresh expiry/token.
            Active => Transition {
                next: Active,
                effects: vec![Persist],
            },
            // Terminal states never recover from a poll result.
            Expired | Revoked | Unactivated => Transition {
                next: state,
                effects: vec![],
            },
        },

        LifecycleInput::ValidateExpired => match state {
            Active | Expired => Transition {
                next: Expired,
                effects: vec![Persist],
            },
            Revoked | Unactivated => Transition {
                next: state,
                effects: vec![],
            },
        },

        // Revocation always wins, regardless of state or arrival order.
        LifecycleInput::ValidateRevoked | LifecycleInput::PushRevoked => match state {
            Unactivated => Transition {
                next: Unactivated,
                effects: vec![ClearCache],
            },
            Active | Expired | Revoked => Transition {
                next: Revoked,
                effects: vec![ClearCache, Notify(Notice::LicenseInvalid)],
            },
        },

        LifecycleInput::PushExpiring { days_remaining } => Transition {
            next: state,
            effects: vec![Notify(Notice::ExpiryWarning {
                days_remaining: *days_remaining,
            })],
        },

        LifecycleInput::PushMessage { title, body } => Transition {
            next: state,
            effects: vec![Notify(Notice::Message {
                title: title.clone(),
                body: body.clone(),
            })],
        },

        LifecycleInput::ClearAndReset => Transition {
            next: Unactivated,
            effects: vec![ClearCache],
        },
    }
}
