// File-backed state store
//
// The whole store is one JSON object kept in memory and written back to disk
// after every change, so state survives between invocations the way local
// storage survives between page loads.
//
// Writes go to a sibling temp file first and are renamed into place, so a
// crash mid-write leaves the previous state intact.

use super::{SessionStore, StoreError};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Key-value store persisted as a JSON object on disk
///
/// Every `set` rewrites the whole file with blocking I/O under the lock. That
/// suits one short-lived invocation per interaction, not a long-running service.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, loading existing state if present
    ///
    /// A missing file starts empty. A file that exists but does not parse is
    /// logged and also starts empty; it is replaced on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        "State file {} is malformed, starting empty: {}",
                        path.display(),
                        e
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        tracing::debug!("State store opened: {}", path.display());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let json = serde_json::to_string_pretty(entries).map_err(|source| StoreError::Encode {
            key: "*".to_string(),
            source,
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)?;
        file.flush().map_err(write_err)?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(write_err)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
        self.persist(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::keys;

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = FileStore::open(&path).unwrap();
        store.set(keys::SESSION_ID, "abc-123").unwrap();
        store.set(keys::REPLAY_SENT, "true").unwrap();
        store.remove(keys::REPLAY_SENT).unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(keys::SESSION_ID).unwrap().as_deref(),
            Some("abc-123")
        );
        assert_eq!(reopened.get(keys::REPLAY_SENT).unwrap(), None);
    }

    #[test]
    fn test_malformed_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "this is not json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get(keys::SESSION_ID).unwrap(), None);

        // First write replaces the broken file
        store.set(keys::SESSION_ID, "fresh").unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("fresh"));
    }

    #[test]
    fn test_clear_empties_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStore::open(&path).unwrap();
        store.set(keys::SESSION_ID, "abc").unwrap();
        store.clear().unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(keys::SESSION_ID).unwrap(), None);
    }
}
