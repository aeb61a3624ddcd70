//! In-memory authority state.
//!
//! One struct holds every record the authority owns. It is always accessed
//! through the `RwLock` in [`crate::Authority`]; the methods here assume
//! the caller already holds the appropriate guard and therefore contain no
//! locking of their own.

use keygate_types::{AuditEntry, DeviceBinding, LicenseRecord};
use std::collections::HashMap;

/// All authority-owned records.
#[derive(Debug, Default)]
pub(crate) struct AuthorityState {
    /// License records keyed by license key.
    pub licenses: HashMap<String, LicenseRecord>,
    /// Device bindings keyed by device id. A device is bound to at most
    /// one license, so the device id is the natural key.
    pub bindings: HashMap<String, DeviceBinding>,
    /// Append-only audit log.
    pub audit: Vec<AuditEntry>,
}

impl AuthorityState {
    /// Counts live bindings for a license.
    pub fn bound_count(&self, license_key: &str) -> usize {
        self.bindings
            .values()
            .filter(|b| b.license_key == license_key)
            .count()
    }

    /// Appends an audit entry.
    pub fn record(&mut self, entry: AuditEntry) {
        self.audit.push(entry);
    }
}
