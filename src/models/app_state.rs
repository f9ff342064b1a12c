use log::warn;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::storage::{FileStore, MemoryStore, Persistence, SharedStore};

/// Application state shared between connections
pub struct AppState {
    pub config: Config,
    pub persistence: Persistence,
}

impl AppState {
    /// Opens the on-disk store, or keeps sessions in memory if the data directory is unusable.
    pub fn new(config: Config) -> Self {
        let store: SharedStore = match FileStore::open(&config.data_dir) {
            Ok(store) => Arc::new(Mutex::new(store)),
            Err(e) => {
                warn!(
                    "Cannot use data directory {} ({}), sessions will not survive a restart",
                    config.data_dir.display(),
                    e
                );
                Arc::new(Mutex::new(MemoryStore::default()))
            }
        };
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: SharedStore) -> Self {
        AppState {
            config,
            persistence: Persistence::new(store),
        }
    }
}
