//! Durable key-value store backed by one JSON file per key
//!
//! This is the local-storage collaborator of the game: every store
//! (pet, ledger, training, tacodex) persists through it. Reads of a
//! missing key return `None`; a corrupted key is cleared and treated
//! as absent rather than failing the caller. Writes are best-effort
//! and logged on failure, never propagated.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// JSON file-per-key store. A single lock serializes all access so
/// each namespace has exactly one writer at a time.
pub struct JsonStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).context("Failed to create storage directory")?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    /// Open the default store under the platform data directory
    pub fn default_store() -> Result<Self> {
        Self::open(crate::config::data_dir()?.join("state"))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }

    /// Read a key. Missing key is `None`; an unreadable or unparsable
    /// key is proactively removed and reported as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let _guard = self.lock.lock().ok()?;
        let path = self.path_for(key);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return None,
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Clearing corrupted key '{}': {}", key, e);
                let _ = std::fs::remove_file(&path);
                None
            }
        }
    }

    /// Write a key. Failures are logged and swallowed: the value simply
    /// appears absent on the next load.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) {
        let Ok(_guard) = self.lock.lock() else { return };
        let path = self.path_for(key);
        match serde_json::to_string_pretty(value) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    warn!("Failed to persist key '{}': {}", key, e);
                }
            }
            Err(e) => warn!("Failed to serialize key '{}': {}", key, e),
        }
    }

    /// Delete a key if present
    pub fn remove(&self, key: &str) {
        let Ok(_guard) = self.lock.lock() else { return };
        let _ = std::fs::remove_file(self.path_for(key));
    }

    /// Whether a key currently exists on disk
    pub fn contains(&self, key: &str) -> bool {
        self.path_for(key).exists()
    }
}

/// Qualify a base key with an identity namespace. Anonymous play and
/// each signed-in identity keep fully independent state.
pub fn scoped_key(base: &str, identity: Option<&str>) -> String {
    match identity {
        Some(id) if !id.is_empty() => format!("{}-{}", base, id),
        _ => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        n: u32,
        s: String,
    }

    fn temp_store() -> (tempfile::TempDir, JsonStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn put_then_get_round_trips() {
        let (_dir, store) = temp_store();
        let value = Sample {
            n: 7,
            s: "salsa".into(),
        };
        store.put("sample", &value);
        assert_eq!(store.get::<Sample>("sample"), Some(value));
    }

    #[test]
    fn missing_key_is_none() {
        let (_dir, store) = temp_store();
        assert_eq!(store.get::<Sample>("nope"), None);
    }

    #[test]
    fn corrupted_key_is_cleared_and_none() {
        let (dir, store) = temp_store();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        assert_eq!(store.get::<Sample>("bad"), None);
        assert!(!dir.path().join("bad.json").exists());
    }

    #[test]
    fn remove_deletes_key() {
        let (_dir, store) = temp_store();
        store.put("gone", &1u32);
        assert!(store.contains("gone"));
        store.remove("gone");
        assert!(!store.contains("gone"));
        assert_eq!(store.get::<u32>("gone"), None);
    }

    #[test]
    fn scoped_keys_namespace_by_identity() {
        assert_eq!(scoped_key("tacomon-salsa", None), "tacomon-salsa");
        assert_eq!(
            scoped_key("tacomon-salsa", Some("user-1")),
            "tacomon-salsa-user-1"
        );
        assert_eq!(scoped_key("tacomon-salsa", Some("")), "tacomon-salsa");
    }
}
