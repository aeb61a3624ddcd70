//! Device-side licensing for Keygate.
//!
//! This crate handles:
//! - The local activation cache behind the [`SecureStore`] contract
//! - Activation and revalidation against the authority
//! - The periodic background revalidator
//! - Push event reception (revocation, expiry warnings, admin messages)
//!
//! # Design Principles
//!
//! - **One state machine**: every status change flows through the pure
//!   [`transition`] function, which returns the next lifecycle state plus
//!   the side effects to apply. Push and poll paths share it, which is
//!   what makes "revocation always wins" enforceable.
//! - **Offline-friendly, not offline-trusting**: `is_locally_active` lets
//!   the UI render immediately, but it is advisory only and must be backed
//!   by a recent server-side validation.
//! - **Transient failures never deny**: network errors, timeouts, and
//!   malformed server responses are retried, never treated as revocation.

mod api;
mod cache;
mod device;
mod error;
mod lifecycle;
mod push;
mod revalidator;
mod validator;

pub use api::{ActivationGrant, ApiError, AuthorityApi, ValidationReport};
pub use cache::{CacheRecord, FileStore, MemoryStore, SecureStore};
pub use device::DeviceIdentity;
pub use error::{ClientError, ClientResult, Denial};
pub use lifecycle::{transition, Effect, LifecycleInput, LifecycleState, Notice, Transition};
pub use push::PushReceiver;
pub use revalidator::{
    AlwaysReachable, Connectivity, Revalidator, RevalidatorConfig, RunOutcome,
    EXPIRY_WARNING_DAYS, REVALIDATE_FLEX, REVALIDATE_PERIOD,
};
pub use validator::{Revalidation, ValidationClient};

#[cfg(feature = "online")]
pub use api::HttpApi;
