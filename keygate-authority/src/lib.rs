//! The license authority.
//!
//! Owns license records and device bindings and decides every activation
//! and validation outcome. All server-side state lives behind one
//! `RwLock`; the write guard is the serialization discipline that makes
//! quota checks and binding creation a single atomic decision, and
//! guarantees validation never observes a stale revoke.
//!
//! Side effects leave through two seams:
//! - the [`PushDispatcher`] trait, which carries revocation/expiry events
//!   to registered device channels
//! - the append-only audit log, queryable via `recent_audit`

mod authority;
mod dispatch;
mod error;
mod state;

pub use authority::{ActivationOutcome, Authority, ValidationOutcome};
pub use dispatch::{ChannelDispatcher, NullDispatcher, PushDispatcher};
pub use error::{ActivationError, AdminError, ValidationError};
