//! Desktop platform implementations
//!
//! File-backed storage under the platform config directory and the system
//! clock.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use directories::ProjectDirs;

use crate::ports::outbound::{StorageProvider, TimeProvider};

/// Desktop time provider using the system clock
#[derive(Clone, Default)]
pub struct DesktopTimeProvider;

impl TimeProvider for DesktopTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// File-backed key-value storage.
///
/// The whole map is rewritten on every change, through a sibling temp file so
/// a crash mid-write leaves the previous contents intact. Default location is
/// `storage.json` in the platform config directory for `io.galaxytalk.player`.
#[derive(Clone)]
pub struct DesktopStorageProvider {
    storage_path: PathBuf,
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl Default for DesktopStorageProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DesktopStorageProvider {
    pub fn new() -> Self {
        let storage_path = ProjectDirs::from("io", "galaxytalk", "player")
            .map(|dirs| dirs.config_dir().join("storage.json"))
            .unwrap_or_else(|| PathBuf::from("galaxytalk_storage.json"));
        Self::at(storage_path)
    }

    /// Storage backed by an explicit file; existing contents are loaded.
    pub fn at(storage_path: impl Into<PathBuf>) -> Self {
        let storage_path = storage_path.into();
        let cache = read_map(&storage_path);
        tracing::debug!(path = %storage_path.display(), entries = cache.len(), "Opened storage");
        Self {
            storage_path,
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    fn update(&self, change: impl FnOnce(&mut HashMap<String, String>) -> bool) {
        let snapshot = {
            let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
            if !change(&mut cache) {
                return;
            }
            cache.clone()
        };
        if let Err(e) = write_map(&self.storage_path, &snapshot) {
            tracing::error!(path = %self.storage_path.display(), "Failed to persist storage: {}", e);
        }
    }
}

fn read_map(path: &Path) -> HashMap<String, String> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return HashMap::new(),
        Err(e) => {
            tracing::warn!("Failed to read storage file: {}", e);
            return HashMap::new();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!("Ignoring unreadable storage file: {}", e);
        HashMap::new()
    })
}

fn write_map(path: &Path, map: &HashMap<String, String>) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(map)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)
}

impl StorageProvider for DesktopStorageProvider {
    fn save(&self, key: &str, value: &str) {
        self.update(|map| map.insert(key.to_string(), value.to_string()).as_deref() != Some(value));
    }

    fn load(&self, key: &str) -> Option<String> {
        self.cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn remove(&self, key: &str) {
        self.update(|map| map.remove(key).is_some());
    }
}
