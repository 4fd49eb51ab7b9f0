//! Key-value blob stores backing project persistence.
//!
//! # Responsibility
//! - Define the opaque string-keyed store contract used by storage.
//! - Provide an in-memory store and a directory-of-files store.
//!
//! # Invariants
//! - `set_item` replaces the whole value; readers never observe a partial write.
//! - Reading an absent key is `Ok(None)`, not an error.
//! - Removing an absent key succeeds.

use log::{debug, error};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

const FILE_EXTENSION: &str = "json";
const TEMP_SUFFIX: &str = "tmp";

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by a key-value store backend.
#[derive(Debug)]
pub enum StoreError {
    /// Keys must be non-empty and limited to `[A-Za-z0-9_-]`.
    InvalidKey(String),
    /// Backend refused the operation outright.
    Unavailable(String),
    /// File-system failure while touching one key.
    Io {
        key: String,
        source: std::io::Error,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey(key) => write!(f, "invalid store key: `{key}`"),
            Self::Unavailable(reason) => write!(f, "store unavailable: {reason}"),
            Self::Io { key, source } => write!(f, "store io failure for `{key}`: {source}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidKey(_) | Self::Unavailable(_) => None,
        }
    }
}

/// Opaque string-keyed blob store.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()>;
    fn remove_item(&mut self, key: &str) -> StoreResult<()>;
}

/// In-memory store.
///
/// Clones share one backing map, the way every page of one origin shares
/// the same local storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
    /// Creates an empty store with its own backing map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether no key is stored at all.
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Returns whether `key` currently holds a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.items.borrow().contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StoreResult<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// Store keeping one `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (and creates if needed) the store directory.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| {
            error!(
                "event=store_open module=store status=error dir={} error={}",
                dir.display(),
                source
            );
            StoreError::Io {
                key: String::new(),
                source,
            }
        })?;
        debug!(
            "event=store_open module=store status=ok dir={}",
            dir.display()
        );
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{FILE_EXTENSION}")))
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(io_error(key, source)),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let temp_path = path.with_extension(format!("{FILE_EXTENSION}.{TEMP_SUFFIX}"));
        fs::write(&temp_path, value).map_err(|source| io_error(key, source))?;
        fs::rename(&temp_path, &path).map_err(|source| {
            let _ = fs::remove_file(&temp_path);
            io_error(key, source)
        })
    }

    fn remove_item(&mut self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(io_error(key, source)),
        }
    }
}

fn validate_key(key: &str) -> StoreResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

fn io_error(key: &str, source: std::io::Error) -> StoreError {
    StoreError::Io {
        key: key.to_string(),
        source,
    }
}
