//! Persistent client-side storage for the session identifier.
//!
//! The identifier is generated once per store and reused for as long as the
//! store keeps it. Storage that cannot be read or written degrades to a fresh
//! identifier per call.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{from_reader, to_writer_pretty};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Fixed key the session identifier lives under.
pub const SESSION_KEY: &str = "session_id";

/// A key/value store that survives restarts of the client.
pub trait SessionStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value under `key`, if present.
    fn remove(&self, key: &str) -> Result<()>;
}

/// The outcome of resolving the session identifier.
#[derive(Debug, Clone)]
pub struct SessionId {
    /// The identifier to send with every request.
    pub id: String,
    /// Set when storage failed and the identifier will not survive a restart.
    pub storage_error: Option<Error>,
}

impl SessionId {
    /// True when the identifier was persisted (or already present).
    pub fn is_persistent(&self) -> bool {
        self.storage_error.is_none()
    }
}

/// Return the stored session identifier, creating and storing one on first use.
pub fn get_or_create_session_id(store: &dyn SessionStore) -> SessionId {
    match store.get(SESSION_KEY) {
        Ok(Some(id)) if !id.is_empty() => SessionId {
            id,
            storage_error: None,
        },
        Ok(_) => {
            let id = new_session_id();
            let storage_error = store.set(SESSION_KEY, &id).err();
            SessionId { id, storage_error }
        }
        Err(err) => SessionId {
            id: new_session_id(),
            storage_error: Some(err),
        },
    }
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/////////////////////////////////////////// FileSessionStore ///////////////////////////////////////////

/// A JSON object file holding string values.
///
/// Keys other than the ones this client writes are left untouched.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The default location, `$HOME/.chatline/storage.json`.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(|home| PathBuf::from(home).join(".chatline").join("storage.json"))
    }

    /// The file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => {
                return Err(Error::storage(
                    format!("failed to open {}", self.path.display()),
                    Some(Box::new(err)),
                ));
            }
        };
        from_reader(BufReader::new(file)).map_err(|err| {
            Error::storage(
                format!("failed to parse {}", self.path.display()),
                Some(Box::new(err)),
            )
        })
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| {
                Error::storage(
                    format!("failed to create {}", parent.display()),
                    Some(Box::new(err)),
                )
            })?;
        }
        let file = File::create(&self.path).map_err(|err| {
            Error::storage(
                format!("failed to create {}", self.path.display()),
                Some(Box::new(err)),
            )
        })?;
        let mut writer = BufWriter::new(file);
        to_writer_pretty(&mut writer, entries).map_err(|err| {
            Error::storage(
                format!("failed to write {}", self.path.display()),
                Some(Box::new(err)),
            )
        })?;
        writer.flush().map_err(|err| {
            Error::storage(
                format!("failed to write {}", self.path.display()),
                Some(Box::new(err)),
            )
        })
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

////////////////////////////////////////// MemorySessionStore //////////////////////////////////////////

/// An in-process store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::storage("memory store lock poisoned", None))
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl SessionStore for BrokenStore {
        fn get(&self, _: &str) -> Result<Option<String>> {
            Err(Error::storage("unavailable", None))
        }

        fn set(&self, _: &str, _: &str) -> Result<()> {
            Err(Error::storage("unavailable", None))
        }

        fn remove(&self, _: &str) -> Result<()> {
            Err(Error::storage("unavailable", None))
        }
    }

    #[test]
    fn memory_store_is_idempotent() {
        let store = MemorySessionStore::new();
        let first = get_or_create_session_id(&store);
        let second = get_or_create_session_id(&store);
        assert!(first.is_persistent());
        assert_eq!(first.id, second.id);
        assert!(Uuid::parse_str(&first.id).is_ok());
    }

    #[test]
    fn clearing_storage_yields_new_id() {
        let store = MemorySessionStore::new();
        let first = get_or_create_session_id(&store);
        store.remove(SESSION_KEY).unwrap();
        let second = get_or_create_session_id(&store);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn empty_stored_value_is_replaced() {
        let store = MemorySessionStore::new();
        store.set(SESSION_KEY, "").unwrap();
        let session = get_or_create_session_id(&store);
        assert!(!session.id.is_empty());
        assert_eq!(store.get(SESSION_KEY).unwrap(), Some(session.id));
    }

    #[test]
    fn unavailable_storage_degrades_to_ephemeral() {
        let first = get_or_create_session_id(&BrokenStore);
        let second = get_or_create_session_id(&BrokenStore);
        assert!(!first.is_persistent());
        assert!(first.storage_error.as_ref().unwrap().is_storage());
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let first = get_or_create_session_id(&FileSessionStore::new(&path));
        let second = get_or_create_session_id(&FileSessionStore::new(&path));
        assert!(first.is_persistent());
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn file_store_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, r#"{"theme":"dark"}"#).unwrap();

        let store = FileSessionStore::new(&path);
        let session = get_or_create_session_id(&store);
        assert_eq!(store.get("theme").unwrap(), Some("dark".to_string()));
        assert_eq!(store.get(SESSION_KEY).unwrap(), Some(session.id));

        store.remove(SESSION_KEY).unwrap();
        assert_eq!(store.get(SESSION_KEY).unwrap(), None);
        assert_eq!(store.get("theme").unwrap(), Some("dark".to_string()));
    }

    #[test]
    fn corrupt_file_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();

        let session = get_or_create_session_id(&FileSessionStore::new(&path));
        assert!(!session.is_persistent());
        assert!(!session.id.is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_flush_is_a_storage_error() {
        let store = FileSessionStore::new("/dev/full");
        let mut entries = BTreeMap::new();
        entries.insert(SESSION_KEY.to_string(), "abc-123".to_string());
        let err = store.save(&entries).unwrap_err();
        assert!(err.is_storage());
    }
}
