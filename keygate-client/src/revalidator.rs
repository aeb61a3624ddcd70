//! The background revalidator.
//!
//! Runs a validation pass on a fixed period with bounded jitter so a fleet
//! of devices does not hit the authority in lockstep. Network reachability
//! is a precondition; an offline run defers instead of failing.
//!
//! At most one periodic task is logically in flight per device: scheduling
//! while already scheduled is a no-op that keeps the existing schedule.

use crate::api::AuthorityApi;
use crate::cache::SecureStore;
use crate::error::ClientError;
use crate::lifecycle::Notice;
use crate::validator::{Revalidation, ValidationClient};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Fixed revalidation period (4 hours).
pub const REVALIDATE_PERIOD: Duration = Duration::from_secs(4 * 60 * 60);

/// Jitter window added to each period (up to 1 hour).
pub const REVALIDATE_FLEX: Duration = Duration::from_secs(60 * 60);

/// Days-remaining threshold at which runs raise an expiry warning.
pub const EXPIRY_WARNING_DAYS: i64 = 3;

/// Reports whether the network is currently reachable.
pub trait Connectivity: Send + Sync {
    fn is_reachable(&self) -> bool;
}

/// Connectivity stub that always reports reachable.
#[derive(Debug, Default)]
pub struct AlwaysReachable;

impl Connectivity for AlwaysReachable {
    fn is_reachable(&self) -> bool {
        true
    }
}

/// Result of one background run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing to do, or the license checked out.
    Success,
    /// Transient condition; the scheduler reattempts on the next period.
    Retry,
    /// The license was authoritatively expired or revoked.
    Invalidated,
}

/// Scheduling parameters.
#[derive(Debug, Clone)]
pub struct RevalidatorConfig {
    pub period: Duration,
    pub flex: Duration,
    pub warning_days: i64,
}

impl Default for RevalidatorConfig {
    fn default() -> Self {
        Self {
            period: REVALIDATE_PERIOD,
            flex: REVALIDATE_FLEX,
            warning_days: EXPIRY_WARNING_DAYS,
        }
    }
}

/// Periodic background revalidation driver.
pub struct Revalidator<A, S> {
    client: Arc<ValidationClient<A, S>>,
    config: RevalidatorConfig,
    connectivity: Arc<dyn Connectivity>,
    scheduled: AtomicBool,
    notices: mpsc::UnboundedSender<Notice>,
}

impl<A, S> Revalidator<A, S>
where
    A: AuthorityApi + 'static,
    S: SecureStore + 'static,
{
    /// Creates a revalidator. Notices raised by background runs arrive on
    /// the returned receiver.
    pub fn new(
        client: Arc<ValidationClient<A, S>>,
        config: RevalidatorConfig,
        connectivity: Arc<dyn Connectivity>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let revalidator = Arc::new(Self {
            client,
            config,
            connectivity,
            scheduled: AtomicBool::new(false),
            notices: tx,
        });
        (revalidator, rx)
    }

    /// Runs one validation pass immediately.
    pub async fn run_once(&self) -> RunOutcome {
        if !self.connectivity.is_reachable() {
            debug!("network unreachable, deferring revalidation");
            return RunOutcome::Retry;
        }

        match self.client.revalidate().await {
            Ok(Revalidation::NotActivated) => RunOutcome::Success,
            Ok(Revalidation::Valid { days_remaining, .. }) => {
                if let Some(days) = days_remaining {
                    if days <= self.config.warning_days {
                        self.notify(Notice::ExpiryWarning {
                            days_remaining: days,
                        });
                    }
                }
                RunOutcome::Success
            }
            Ok(Revalidation::Expired) | Ok(Revalidation::Revoked) => {
                self.notify(Notice::LicenseInvalid);
                RunOutcome::Invalidated
            }
            Err(ClientError::Network(e)) => {
                debug!(error = %e, "transient revalidation failure");
                RunOutcome::Retry
            }
            Err(e) => {
                // Background context never surfaces hard failures.
                warn!(error = %e, "revalidation error, will retry");
                RunOutcome::Retry
            }
        }
    }

    /// Starts the periodic schedule.
    ///
    /// Returns false if a schedule is already registered; the existing
    /// schedule is kept, not reset.
    pub fn schedule(self: &Arc<Self>) -> bool {
        if self.scheduled.swap(true, Ordering::SeqCst) {
            return false;
        }
        let this = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(this.next_delay()).await;
                let outcome = this.run_once().await;
                debug!(?outcome, "periodic revalidation run");
            }
        });
        true
    }

    /// Returns true if the periodic schedule is registered.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled.load(Ordering::SeqCst)
    }

    /// Period plus uniform jitter in `[0, flex)`.
    fn next_delay(&self) -> Duration {
        let flex_secs = self.config.flex.as_secs();
        let jitter = if flex_secs == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(rand::thread_rng().gen_range(0..flex_secs))
        };
        self.config.period + jitter
    }

    fn notify(&self, notice: Notice) {
        // A dropped receiver just means nobody displays notices.
        let _ = self.notices.send(notice);
    }
}
