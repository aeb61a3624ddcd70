//! Push event dispatch.
//!
//! The authority emits [`PushEvent`]s through this seam whenever a revoke
//! or expiry sweep needs to reach devices faster than their polling
//! interval. The real FCM transport lives outside this crate; embedders
//! and tests use [`ChannelDispatcher`], which forwards events over an
//! in-process channel.

use keygate_types::PushEvent;
use tokio::sync::mpsc;
use tracing::debug;

/// Delivers push events to a device's registered channel token.
///
/// Implementations must be fire-and-forget: dispatch failures are logged,
/// never propagated into the authority's decision path.
pub trait PushDispatcher: Send + Sync {
    /// Sends an event to the channel identified by `channel_token`.
    fn dispatch(&self, channel_token: &str, event: &PushEvent);
}

/// Dispatcher that drops every event. Useful when no push transport is
/// configured.
#[derive(Debug, Default)]
pub struct NullDispatcher;

impl PushDispatcher for NullDispatcher {
    fn dispatch(&self, channel_token: &str, event: &PushEvent) {
        debug!(channel_token, kind = event.kind(), "push dispatch (null)");
    }
}

/// Dispatcher that forwards `(channel_token, event)` pairs over an
/// unbounded in-process channel.
pub struct ChannelDispatcher {
    tx: mpsc::UnboundedSender<(String, PushEvent)>,
}

impl ChannelDispatcher {
    /// Creates a dispatcher and the receiving half of its channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(String, PushEvent)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PushDispatcher for ChannelDispatcher {
    fn dispatch(&self, channel_token: &str, event: &PushEvent) {
        debug!(channel_token, kind = event.kind(), "push dispatch");
        // A closed receiver means nobody is listening; that is not an error
        // for the authority.
        let _ = self.tx.send((channel_token.to_string(), event.clone()));
    }
}
