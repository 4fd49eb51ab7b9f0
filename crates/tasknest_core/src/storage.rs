//! Project collection persistence over a key-value store.
//!
//! # Responsibility
//! - Serialize the full project collection into one JSON blob under one key.
//! - Probe store availability before every real operation.
//! - Contain every store/serialization failure; callers only see `bool`/`Option`.
//!
//! # Invariants
//! - A save overwrites the whole blob; there is no partial update.
//! - Absent, unavailable, unparseable and non-array payloads all load as `None`.
//! - Nothing in this module panics or propagates an error to its caller.

use crate::model::project::Project;
use crate::store::{KeyValueStore, StoreError};
use log::{debug, error, info, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Well-known key holding the project blob.
pub const STORAGE_KEY: &str = "todoApp_projects";
const AVAILABILITY_PROBE_KEY: &str = "__storage_test__";

/// Internal failure taxonomy, logged and then collapsed at the boundary.
#[derive(Debug)]
pub enum StorageError {
    Unavailable,
    Store(StoreError),
    Json(serde_json::Error),
    NotAnArray,
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "storage is not available"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "invalid project payload: {err}"),
            Self::NotAnArray => write!(f, "project payload is not an array"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Unavailable | Self::NotAnArray => None,
        }
    }
}

impl From<StoreError> for StorageError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Best-effort persistence adapter for the project collection.
pub struct ProjectStorage<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> ProjectStorage<S> {
    /// Uses [`STORAGE_KEY`].
    pub fn new(store: S) -> Self {
        Self::with_key(store, STORAGE_KEY)
    }

    /// Uses a custom key, e.g. to keep several collections in one store.
    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Write/delete round-trip of a throwaway key.
    pub fn is_available(&mut self) -> bool {
        let probe = self
            .store
            .set_item(AVAILABILITY_PROBE_KEY, AVAILABILITY_PROBE_KEY)
            .and_then(|()| self.store.remove_item(AVAILABILITY_PROBE_KEY));
        match probe {
            Ok(()) => true,
            Err(err) => {
                debug!(
                    "event=storage_probe module=storage status=unavailable error={}",
                    err
                );
                false
            }
        }
    }

    /// Overwrites the blob with every project. Returns whether it was written.
    pub fn save_projects(&mut self, projects: &[Project]) -> bool {
        match self.try_save(projects) {
            Ok(bytes) => {
                debug!(
                    "event=storage_save module=storage status=ok projects={} bytes={}",
                    projects.len(),
                    bytes
                );
                true
            }
            Err(StorageError::Unavailable) => {
                warn!("event=storage_save module=storage status=skipped reason=unavailable");
                false
            }
            Err(err) => {
                error!(
                    "event=storage_save module=storage status=error error={}",
                    err
                );
                false
            }
        }
    }

    /// Reconstructs the persisted collection, or `None` for "nothing usable".
    pub fn load_projects(&mut self) -> Option<Vec<Project>> {
        match self.try_load() {
            Ok(Some(projects)) => {
                info!(
                    "event=storage_load module=storage status=ok projects={}",
                    projects.len()
                );
                Some(projects)
            }
            Ok(None) => {
                info!("event=storage_load module=storage status=empty");
                None
            }
            Err(StorageError::Unavailable) => {
                warn!("event=storage_load module=storage status=skipped reason=unavailable");
                None
            }
            Err(err) => {
                error!(
                    "event=storage_load module=storage status=error error={}",
                    err
                );
                None
            }
        }
    }

    /// Removes the blob. Returns whether the removal went through.
    pub fn clear_data(&mut self) -> bool {
        if !self.is_available() {
            return false;
        }
        match self.store.remove_item(&self.key) {
            Ok(()) => {
                info!("event=storage_clear module=storage status=ok");
                true
            }
            Err(err) => {
                error!(
                    "event=storage_clear module=storage status=error error={}",
                    err
                );
                false
            }
        }
    }

    fn try_save(&mut self, projects: &[Project]) -> Result<usize, StorageError> {
        if !self.is_available() {
            return Err(StorageError::Unavailable);
        }
        let payload = serde_json::to_string(projects)?;
        self.store.set_item(&self.key, &payload)?;
        Ok(payload.len())
    }

    fn try_load(&mut self) -> Result<Option<Vec<Project>>, StorageError> {
        if !self.is_available() {
            return Err(StorageError::Unavailable);
        }
        let raw = match self.store.get_item(&self.key)? {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(None),
        };
        let value: Value = serde_json::from_str(&raw)?;
        if !value.is_array() {
            return Err(StorageError::NotAnArray);
        }
        Ok(Some(serde_json::from_value(value)?))
    }
}
