//! Durable key-value state backed by a single JSON document.
//!
//! Every update rewrites the whole file through a temp file and rename.
//! A missing file starts empty; an unreadable one is logged and replaced
//! on the next write.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::error::{AppError, Result};

pub const SCHEDULE_CACHE_KEY: &str = "prayerScheduleCache";
pub const LAST_CHECK_DATE_KEY: &str = "lastCheckDate";
pub const SETTINGS_KEY: &str = "settings";

#[derive(Clone, Debug)]
pub struct StateStore {
    inner: Arc<Mutex<Map<String, Value>>>,
    path: Option<PathBuf>,
}

impl StateStore {
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Map::new())),
            path: None,
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Map<String, Value>>(&raw) {
                Ok(values) => values,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "state file is corrupt, starting empty");
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "state file unreadable, starting empty");
                Map::new()
            }
        };

        debug!(path = %path.display(), keys = values.len(), "state store opened");
        Self {
            inner: Arc::new(Mutex::new(values)),
            path: Some(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Typed read. Entries that no longer match `T` read as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let values = self.lock();
        let value = values.get(key)?.clone();
        drop(values);

        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                warn!(key, error = %e, "ignoring stored value with unexpected shape");
                None
            }
        }
    }

    pub fn update<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| AppError::StorageError(format!("cannot encode {}: {}", key, e)))?;

        // The guard is held through the write so file updates land in order.
        let mut values = self.lock();
        values.insert(key.to_string(), value);
        self.persist(&values)
    }

    /// Writes a sibling temp file and renames it over the state file, so a
    /// reader never sees a partial document.
    fn persist(&self, values: &Map<String, Value>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::StorageError(format!("{}: {}", parent.display(), e)))?;
        }

        let body = serde_json::to_string_pretty(values)
            .map_err(|e| AppError::StorageError(e.to_string()))?;
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, body)
            .map_err(|e| AppError::StorageError(format!("{}: {}", staging.display(), e)))?;
        std::fs::rename(&staging, path)
            .map_err(|e| AppError::StorageError(format!("{}: {}", path.display(), e)))
    }

    fn lock(&self) -> MutexGuard<'_, Map<String, Value>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = StateStore::open(&path);
        store.update(LAST_CHECK_DATE_KEY, &"2024-06-10").unwrap();

        let reopened = StateStore::open(&path);
        assert_eq!(
            reopened.get::<String>(LAST_CHECK_DATE_KEY).as_deref(),
            Some("2024-06-10")
        );
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ broken").unwrap();

        let store = StateStore::open(&path);
        assert_eq!(store.get::<String>(LAST_CHECK_DATE_KEY), None);

        store.update(LAST_CHECK_DATE_KEY, &"2024-06-11").unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("2024-06-11"));
    }

    #[test]
    fn concurrent_updates_all_reach_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        for run in 0..20 {
            let store = StateStore::open(&path);
            let writers: Vec<_> = (0..8)
                .map(|i| {
                    let store = store.clone();
                    std::thread::spawn(move || {
                        store
                            .update(&format!("k{}", i), &format!("{}-{}", run, "x".repeat(20_000)))
                            .unwrap();
                    })
                })
                .collect();
            for writer in writers {
                writer.join().unwrap();
            }

            let reopened = StateStore::open(&path);
            for i in 0..8 {
                let value = reopened.get::<String>(&format!("k{}", i));
                assert!(
                    value.is_some_and(|v| v.starts_with(&format!("{}-", run))),
                    "run {} lost key k{} on disk",
                    run,
                    i
                );
            }
            assert!(!path.with_extension("json.tmp").exists());
        }
    }

    #[test]
    fn mismatched_shape_reads_as_absent() {
        let store = StateStore::in_memory();
        store.update(LAST_CHECK_DATE_KEY, &42).unwrap();
        assert_eq!(store.get::<String>(LAST_CHECK_DATE_KEY), None);
        assert_eq!(store.path(), None);
    }
}
