//! Best-effort local key-value persistence for a session.

pub mod file_store;

pub use file_store::{FileStore, MemoryStore};

use chess::Color;
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::game::store::MoveRecord;

pub const POSITION_KEY: &str = "chess.position";
pub const HISTORY_KEY: &str = "chess.history";
pub const THEME_KEY: &str = "chess.theme";
pub const SETTINGS_KEY: &str = "chess.settings";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key-value storage.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

pub type SharedStore = Arc<Mutex<dyn KeyValueStore>>;

/// Player-facing mode settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub vs_computer: bool,
    pub human_is_white: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vs_computer: true,
            human_is_white: true,
        }
    }
}

impl Settings {
    pub fn human_side(&self) -> Color {
        if self.human_is_white {
            Color::White
        } else {
            Color::Black
        }
    }
}

/// Everything read back at session start.
#[derive(Debug, Clone, Default)]
pub struct PersistedSession {
    pub position: Option<String>,
    pub history: Vec<MoveRecord>,
    pub settings: Settings,
    pub theme: Option<String>,
}

/// Typed access to the session keys. Writes never fail from the caller's point of view.
#[derive(Clone)]
pub struct Persistence {
    store: SharedStore,
}

impl Persistence {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    fn get(&self, key: &str) -> Option<String> {
        match self.store.lock() {
            Ok(store) => store.get(key),
            Err(_) => {
                warn!("Storage lock poisoned, reading {} as empty", key);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        let result = match self.store.lock() {
            Ok(mut store) => store.set(key, value),
            Err(_) => {
                warn!("Storage lock poisoned, not writing {}", key);
                return;
            }
        };
        if let Err(e) = result {
            warn!("Could not persist {}: {}", key, e);
        }
    }

    fn get_json<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring corrupt {}: {}", key, e);
                None
            }
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, &raw),
            Err(e) => warn!("Could not serialize {}: {}", key, e),
        }
    }

    pub fn load(&self) -> PersistedSession {
        PersistedSession {
            position: self.get(POSITION_KEY),
            history: self.get_json(HISTORY_KEY).unwrap_or_default(),
            settings: self.get_json(SETTINGS_KEY).unwrap_or_default(),
            theme: self.get(THEME_KEY),
        }
    }

    pub fn save_position(&self, fen: &str, history: &[MoveRecord]) {
        self.set(POSITION_KEY, fen);
        self.set_json(HISTORY_KEY, &history);
    }

    pub fn save_settings(&self, settings: &Settings) {
        self.set_json(SETTINGS_KEY, settings);
    }

    pub fn save_theme(&self, theme: &str) {
        self.set(THEME_KEY, theme);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persistence() -> (Persistence, Arc<Mutex<MemoryStore>>) {
        let store = Arc::new(Mutex::new(MemoryStore::default()));
        let shared: SharedStore = store.clone();
        (Persistence::new(shared), store)
    }

    #[test]
    fn empty_store_loads_defaults() {
        let (persistence, _) = persistence();
        let session = persistence.load();
        assert!(session.position.is_none());
        assert!(session.history.is_empty());
        assert_eq!(session.settings, Settings::default());
        assert!(session.theme.is_none());
    }

    #[test]
    fn corrupt_json_is_treated_as_absent() {
        let (persistence, store) = persistence();
        store.lock().unwrap().set(HISTORY_KEY, "[{oops").unwrap();
        store.lock().unwrap().set(SETTINGS_KEY, "42").unwrap();
        let session = persistence.load();
        assert!(session.history.is_empty());
        assert_eq!(session.settings, Settings::default());
    }

    #[test]
    fn values_round_trip() {
        let (persistence, _) = persistence();
        let settings = Settings {
            vs_computer: false,
            human_is_white: false,
        };
        persistence.save_position("8/8/8/8/8/8/8/8 w - - 0 1", &[]);
        persistence.save_settings(&settings);
        persistence.save_theme("dark");

        let session = persistence.load();
        assert_eq!(session.position.as_deref(), Some("8/8/8/8/8/8/8/8 w - - 0 1"));
        assert_eq!(session.settings, settings);
        assert_eq!(session.settings.human_side(), Color::Black);
        assert_eq!(session.theme.as_deref(), Some("dark"));
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")))
        }
    }

    #[test]
    fn write_failures_are_swallowed() {
        let shared: SharedStore = Arc::new(Mutex::new(BrokenStore));
        let persistence = Persistence::new(shared);
        persistence.save_position("whatever", &[]);
        persistence.save_theme("dark");
        assert!(persistence.load().position.is_none());
    }
}
