// Persisted credential storage
//
// Two string keys survive process restarts: the bearer token and the
// serialized user record. Every component that needs them (HTTP client,
// session store, navigation guard) receives the same `CredentialStore`
// handle instead of reaching for ambient state. Writes broadcast a
// `StorageEvent` so other handles on the same store can re-sync.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::Error;

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "auth_token";
/// Storage key holding the JSON-serialized user record.
pub const USER_KEY: &str = "user";

const EVENT_CHANNEL_SIZE: usize = 64;

/// What happened to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageChange {
    Set,
    Removed,
}

/// Change notification emitted on every effective write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub change: StorageChange,
}

/// Key-value store for persisted credentials.
///
/// Reads and writes are synchronous. `remove` on an absent key is a no-op
/// and emits no event.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Remove a key. Returns `true` if it was present.
    fn remove(&self, key: &str) -> Result<bool, Error>;

    /// Subscribe to change events from every handle on this store.
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;

    // ── Credential helpers ───────────────────────────────────────────

    /// The persisted token. Storage failures read as "no token".
    fn token(&self) -> Option<String> {
        self.get(TOKEN_KEY).unwrap_or_else(|e| {
            warn!(error = %e, "failed to read auth token");
            None
        })
    }

    /// The raw persisted user record. Storage failures read as absent.
    fn user_record(&self) -> Option<String> {
        self.get(USER_KEY).unwrap_or_else(|e| {
            warn!(error = %e, "failed to read user record");
            None
        })
    }

    /// Persist a token and (optionally) the serialized user record.
    ///
    /// The user record is written first so a listener reacting to the
    /// token change already sees the matching user.
    fn store_credentials(&self, token: &str, user_json: Option<&str>) -> Result<(), Error> {
        match user_json {
            Some(user) => self.set(USER_KEY, user)?,
            None => {
                self.remove(USER_KEY)?;
            }
        }
        self.set(TOKEN_KEY, token)
    }

    /// Remove both credential keys. Returns `true` if a token was present.
    /// Failures are logged, never propagated.
    fn clear_credentials(&self) -> bool {
        let had_token = self.remove(TOKEN_KEY).unwrap_or_else(|e| {
            warn!(error = %e, "failed to remove auth token");
            false
        });
        if let Err(e) = self.remove(USER_KEY) {
            warn!(error = %e, "failed to remove user record");
        }
        if had_token {
            debug!("persisted credentials cleared");
        }
        had_token
    }
}

fn emit(tx: &broadcast::Sender<StorageEvent>, key: &str, change: StorageChange) {
    // No receivers is fine.
    let _ = tx.send(StorageEvent {
        key: key.to_owned(),
        change,
    });
}

// ── In-memory ────────────────────────────────────────────────────────

/// Process-local store. Share one `Arc<MemoryStore>` between handles to
/// model several clients ("tabs") over the same persisted state.
pub struct MemoryStore {
    entries: DashMap<String, String>,
    events: broadcast::Sender<StorageEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            entries: DashMap::new(),
            events,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.entries.insert(key.to_owned(), value.to_owned());
        emit(&self.events, key, StorageChange::Set);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, Error> {
        let removed = self.entries.remove(key).is_some();
        if removed {
            emit(&self.events, key, StorageChange::Removed);
        }
        Ok(removed)
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

// ── JSON file ────────────────────────────────────────────────────────

/// Store backed by a small JSON object on disk (`{ "auth_token": .., "user": .. }`).
///
/// The file is re-read on every access, so reads see writes made by other
/// `FileStore` values or processes. Change events are not: a subscriber
/// only hears about writes made through the same `FileStore` value.
/// Writes go through a temp file and a rename.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
    events: broadcast::Sender<StorageEvent>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            events,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, Error> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|e| {
            Error::Storage(format!("corrupt credential file {}: {e}", self.path.display()))
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("failed to create {}: {e}", parent.display())))?;
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| Error::Storage(format!("failed to encode credentials: {e}")))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| Error::Storage(format!("failed to write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| Error::Storage(format!("failed to replace {}: {e}", self.path.display())))
    }
}

impl CredentialStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        {
            let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
            let mut entries = self.read_all()?;
            entries.insert(key.to_owned(), value.to_owned());
            self.write_all(&entries)?;
        }
        emit(&self.events, key, StorageChange::Set);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, Error> {
        let removed = {
            let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
            let mut entries = self.read_all()?;
            let removed = entries.remove(key).is_some();
            if removed {
                self.write_all(&entries)?;
            }
            removed
        };
        if removed {
            emit(&self.events, key, StorageChange::Removed);
        }
        Ok(removed)
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip_and_events() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe();

        store.store_credentials("tok", Some(r#"{"id":1}"#)).unwrap();
        assert_eq!(store.token().as_deref(), Some("tok"));
        assert_eq!(store.user_record().as_deref(), Some(r#"{"id":1}"#));

        assert_eq!(rx.try_recv().unwrap().key, USER_KEY);
        let token_event = rx.try_recv().unwrap();
        assert_eq!(token_event.key, TOKEN_KEY);
        assert_eq!(token_event.change, StorageChange::Set);
    }

    #[test]
    fn clearing_twice_only_reports_the_first() {
        let store = MemoryStore::new();
        store.store_credentials("tok", None).unwrap();
        let mut rx = store.subscribe();

        assert!(store.clear_credentials());
        assert!(!store.clear_credentials());
        assert!(store.is_empty());

        let event = rx.try_recv().unwrap();
        assert_eq!(event.key, TOKEN_KEY);
        assert_eq!(event.change, StorageChange::Removed);
        assert!(rx.try_recv().is_err(), "second clear must not emit");
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");

        let store = FileStore::new(&path);
        assert!(store.token().is_none());
        store.store_credentials("persisted", Some(r#"{"id":2}"#)).unwrap();
        drop(store);

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.token().as_deref(), Some("persisted"));
        assert!(reopened.clear_credentials());
        assert!(reopened.token().is_none());
        assert!(reopened.user_record().is_none());
    }

    #[test]
    fn separate_file_stores_share_data_but_not_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let writer = FileStore::new(&path);
        let reader = FileStore::new(&path);
        let mut writer_rx = writer.subscribe();
        let mut reader_rx = reader.subscribe();

        writer.store_credentials("shared", None).unwrap();

        assert_eq!(reader.token().as_deref(), Some("shared"));
        assert_eq!(writer_rx.try_recv().unwrap().key, TOKEN_KEY);
        assert!(reader_rx.try_recv().is_err());
    }

    #[test]
    fn corrupt_file_reads_as_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(store.get(TOKEN_KEY), Err(Error::Storage(_))));
        assert!(store.token().is_none());
    }
}
