//! The local activation cache.
//!
//! The cache holds the device's last known license state: token, status
//! snapshot, expiry snapshot, last validation instant, and the activated
//! flag. It is authoritative only until superseded by a server response or
//! a push event.
//!
//! Persistence goes through the [`SecureStore`] contract. On real devices
//! the implementation wraps the platform's encrypted key/value store; this
//! crate ships a JSON-file implementation with atomic writes and an
//! in-memory one for tests.

use crate::error::{ClientError, ClientResult};
use chrono::{DateTime, Utc};
use keygate_types::LicenseStatus;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// The device's cached license state. One record, updated atomically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// The last issued bearer token.
    pub token: String,
    /// License status as of the last server contact.
    pub status: LicenseStatus,
    /// Expiry snapshot as of the last server contact.
    pub expires_at: Option<DateTime<Utc>>,
    /// When the record was last confirmed by the authority.
    pub last_validated_at: DateTime<Utc>,
    /// True once activation succeeded. Implies `token` and `status` are
    /// meaningful; clearing the record resets all fields together.
    pub activated: bool,
}

impl CacheRecord {
    /// Builds an activated record from a fresh server response.
    #[must_use]
    pub fn new(
        token: impl Into<String>,
        status: LicenseStatus,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            token: token.into(),
            status,
            expires_at,
            last_validated_at: Utc::now(),
            activated: true,
        }
    }

    /// Fast, network-free activity check for immediate UI rendering.
    ///
    /// Advisory only: it must be backed by a recent server-side validation
    /// and never grants offline access beyond one revalidation interval.
    #[must_use]
    pub fn is_locally_active(&self, now: DateTime<Utc>) -> bool {
        self.activated
            && self.status == LicenseStatus::Active
            && self.expires_at.is_none_or(|exp| exp > now)
    }
}

/// Atomic persistence contract for the cache record.
///
/// `save`, `load`, and `clear` are atomic with respect to each other: no
/// partial record is ever observable.
pub trait SecureStore: Send + Sync {
    /// Persists the record, replacing any previous one.
    fn save(&self, record: &CacheRecord) -> ClientResult<()>;

    /// Loads the stored record, or `None` if absent.
    fn load(&self) -> ClientResult<Option<CacheRecord>>;

    /// Removes the record. Clearing always wipes every field at once.
    fn clear(&self) -> ClientResult<()>;
}

/// In-memory store for tests and ephemeral embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Option<CacheRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecureStore for MemoryStore {
    fn save(&self, record: &CacheRecord) -> ClientResult<()> {
        *self.inner.lock().expect("store poisoned") = Some(record.clone());
        Ok(())
    }

    fn load(&self) -> ClientResult<Option<CacheRecord>> {
        Ok(self.inner.lock().expect("store poisoned").clone())
    }

    fn clear(&self) -> ClientResult<()> {
        *self.inner.lock().expect("store poisoned") = None;
        Ok(())
    }
}

/// JSON-file store with atomic replace semantics.
///
/// Writes go to a sibling temp file followed by a rename, so a crash in
/// the middle of a save leaves either the old record or the new one, never
/// a torn mix. An unreadable or corrupt file is reported as absent rather
/// than an error; a damaged cache must behave like a missing one.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store at the given file path. Parent directories are
    /// created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl SecureStore for FileStore {
    fn save(&self, record: &CacheRecord) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ClientError::Storage(e.to_string()))?;
        }
        let json = serde_json::to_vec(record)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, &json).map_err(|e| ClientError::Storage(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| ClientError::Storage(e.to_string()))?;
        Ok(())
    }

    fn load(&self) -> ClientResult<Option<CacheRecord>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ClientError::Storage(e.to_string())),
        };
        match serde_json::from_slice(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt cache record, treating as absent");
                Ok(None)
            }
        }
    }

    fn clear(&self) -> ClientResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage(e.to_string())),
        }
    }
}
