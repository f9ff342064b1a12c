use log::{info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::storage::{KeyValueStore, StorageError};

const STORE_FILE: &str = "session-store.json";

/// Keys kept in a single JSON object on disk. The file is rewritten on every `set`
/// through a temporary file and a rename.
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens (or prepares) the store under `dir`. An unreadable or corrupt file starts
    /// an empty store.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(STORE_FILE);
        let values = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring corrupt store {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        info!("Using session store {} ({} keys)", path.display(), values.len());
        Ok(Self { path, values })
    }

    fn flush(&self) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(&self.values)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

/// In-memory store, used in tests and when the data directory is unusable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("chess-board-app-{}", Uuid::new_v4()))
    }

    #[test]
    fn values_survive_reopen() {
        let dir = scratch_dir();
        {
            let mut store = FileStore::open(&dir).unwrap();
            store.set("chess.position", "fen").unwrap();
            store.set("chess.theme", "dark").unwrap();
        }
        let store = FileStore::open(&dir).unwrap();
        assert_eq!(store.get("chess.position").as_deref(), Some("fen"));
        assert_eq!(store.get("chess.theme").as_deref(), Some("dark"));
        assert!(store.get("missing").is_none());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(STORE_FILE), "{ not json").unwrap();
        let mut store = FileStore::open(&dir).unwrap();
        assert!(store.get("chess.position").is_none());
        store.set("chess.position", "fen").unwrap();
        assert_eq!(FileStore::open(&dir).unwrap().get("chess.position").as_deref(), Some("fen"));
        let _ = fs::remove_dir_all(&dir);
    }
}
