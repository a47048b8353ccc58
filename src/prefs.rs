//! Persisted setup inputs.
//!
//! Preferences are a flat key -> string map. A missing key means "use the
//! built-in default"; a value that doesn't parse is treated the same way.

use crate::types::{
    DEFAULT_IMPOSTER_COUNT, DEFAULT_TIMER_SECONDS, MIN_TIMER_SECONDS,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

pub const KEY_NAMES: &str = "wi:names";
pub const KEY_IMPOSTERS: &str = "wi:imps";
pub const KEY_STEALTH: &str = "wi:stealth";
pub const KEY_TIMER: &str = "wi:timer";

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("Failed to write preferences: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode preferences: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), PrefsError>;
}

#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences kept in a small JSON object on disk
#[derive(Debug)]
pub struct JsonFilePreferenceStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl JsonFilePreferenceStore {
    /// Open the store. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!(
                        "Ignoring corrupt preferences file {}: {}",
                        path.display(),
                        e
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read preferences {}: {}", path.display(), e);
                HashMap::new()
            }
        };

        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, values: &HashMap<String, String>) -> Result<(), PrefsError> {
        let json = serde_json::to_string_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PrefsError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        self.write(&values)
    }
}

/// The setup screen inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupInput {
    pub names_raw: String,
    pub imposter_count: u32,
    pub stealth: bool,
    pub timer_seconds: u32,
}

impl Default for SetupInput {
    fn default() -> Self {
        Self {
            names_raw: String::new(),
            imposter_count: DEFAULT_IMPOSTER_COUNT,
            stealth: false,
            timer_seconds: DEFAULT_TIMER_SECONDS,
        }
    }
}

impl SetupInput {
    /// Seed setup from stored preferences, falling back per key
    pub fn load(store: &dyn PreferenceStore) -> Self {
        let defaults = Self::default();

        Self {
            names_raw: store.get(KEY_NAMES).unwrap_or(defaults.names_raw),
            imposter_count: store
                .get(KEY_IMPOSTERS)
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|&n| n >= 1)
                .unwrap_or(defaults.imposter_count),
            stealth: store
                .get(KEY_STEALTH)
                .map(|v| v == "1")
                .unwrap_or(defaults.stealth),
            timer_seconds: store
                .get(KEY_TIMER)
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|&s| s >= MIN_TIMER_SECONDS)
                .unwrap_or(defaults.timer_seconds),
        }
    }
}

/// Normalise a requested imposter count (minimum 1)
pub fn normalize_imposter_count(requested: u32) -> u32 {
    requested.max(1)
}

/// Normalise a requested timer duration (minimum 5 seconds)
pub fn normalize_timer_seconds(requested: u32) -> u32 {
    requested.max(MIN_TIMER_SECONDS)
}

/// Write a preference without letting a failure reach gameplay. Stores may
/// block on disk, so the write runs on the blocking pool.
pub async fn persist(store: Arc<dyn PreferenceStore>, key: &'static str, value: String) {
    let result = tokio::task::spawn_blocking(move || store.set(key, &value)).await;
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("Failed to persist preference {}: {}", key, e),
        Err(e) => tracing::warn!("Preference write for {} did not complete: {}", key, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults_from_empty_store() {
        let store = MemoryPreferenceStore::new();
        assert_eq!(SetupInput::load(&store), SetupInput::default());
    }

    #[test]
    fn test_load_stored_values() {
        let store = MemoryPreferenceStore::new();
        store.set(KEY_NAMES, "Alex, Sam\nJamie").unwrap();
        store.set(KEY_IMPOSTERS, "2").unwrap();
        store.set(KEY_STEALTH, "1").unwrap();
        store.set(KEY_TIMER, "90").unwrap();

        let setup = SetupInput::load(&store);
        assert_eq!(setup.names_raw, "Alex, Sam\nJamie");
        assert_eq!(setup.imposter_count, 2);
        assert!(setup.stealth);
        assert_eq!(setup.timer_seconds, 90);
    }

    #[test]
    fn test_load_rejects_out_of_range_values() {
        let store = MemoryPreferenceStore::new();
        store.set(KEY_IMPOSTERS, "0").unwrap();
        store.set(KEY_STEALTH, "yes").unwrap();
        store.set(KEY_TIMER, "3").unwrap();

        let setup = SetupInput::load(&store);
        assert_eq!(setup.imposter_count, 1);
        assert!(!setup.stealth);
        assert_eq!(setup.timer_seconds, 60);

        store.set(KEY_IMPOSTERS, "many").unwrap();
        store.set(KEY_TIMER, "").unwrap();
        let setup = SetupInput::load(&store);
        assert_eq!(setup.imposter_count, 1);
        assert_eq!(setup.timer_seconds, 60);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_imposter_count(0), 1);
        assert_eq!(normalize_imposter_count(3), 3);
        assert_eq!(normalize_timer_seconds(1), 5);
        assert_eq!(normalize_timer_seconds(120), 120);
    }

    #[test]
    fn test_json_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let store = JsonFilePreferenceStore::open(&path);
        assert!(store.get(KEY_NAMES).is_none());
        store.set(KEY_NAMES, "Alex, Sam, Jamie").unwrap();
        store.set(KEY_STEALTH, "1").unwrap();

        let reopened = JsonFilePreferenceStore::open(&path);
        assert_eq!(reopened.get(KEY_NAMES).as_deref(), Some("Alex, Sam, Jamie"));
        assert_eq!(reopened.get(KEY_STEALTH).as_deref(), Some("1"));
    }

    #[test]
    fn test_json_file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonFilePreferenceStore::open(&path);
        assert!(store.get(KEY_NAMES).is_none());

        // Writing replaces the corrupt file
        store.set(KEY_TIMER, "30").unwrap();
        let reopened = JsonFilePreferenceStore::open(&path);
        assert_eq!(reopened.get(KEY_TIMER).as_deref(), Some("30"));
    }

    #[tokio::test]
    async fn test_persist_swallows_errors() {
        let dir = tempfile::tempdir().unwrap();
        // Parent directory doesn't exist, so every write fails
        let store = Arc::new(JsonFilePreferenceStore::open(
            dir.path().join("missing").join("prefs.json"),
        ));

        persist(store.clone(), KEY_NAMES, "Alex".to_string()).await;
        assert_eq!(store.get(KEY_NAMES).as_deref(), Some("Alex"));
    }

    #[tokio::test]
    async fn test_persist_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let store = Arc::new(JsonFilePreferenceStore::open(&path));

        persist(store.clone(), KEY_TIMER, "45".to_string()).await;
        persist(store, KEY_STEALTH, "1".to_string()).await;

        let reopened = JsonFilePreferenceStore::open(&path);
        assert_eq!(reopened.get(KEY_TIMER).as_deref(), Some("45"));
        assert_eq!(reopened.get(KEY_STEALTH).as_deref(), Some("1"));
    }
}
