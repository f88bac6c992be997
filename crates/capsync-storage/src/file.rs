//! JSON file key-value store.
//!
//! All entries live in a single JSON object. The file is read on first access
//! and rewritten (temp file + rename) after every mutation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};
use crate::store::KeyValueStore;

/// Key-value store persisted to a JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<Option<HashMap<String, String>>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the file contents. A missing or corrupt file is an empty store.
    async fn load(&self) -> StorageResult<HashMap<String, String>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "Store file missing, starting empty");
                return Ok(HashMap::new());
            }
            Err(e) => return Err(StorageError::from(e)),
        };

        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }

        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Store file is corrupt, starting empty");
                Ok(HashMap::new())
            }
        }
    }

    async fn persist(&self, entries: &HashMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let payload = serde_json::to_string(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Run `f` against the loaded entries, persisting when it reports a change.
    async fn with_entries<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, String>) -> (T, bool),
    ) -> StorageResult<T> {
        let mut guard = self.entries.lock().await;
        if guard.is_none() {
            *guard = Some(self.load().await?);
        }
        let entries = guard
            .as_mut()
            .ok_or_else(|| StorageError::corrupt("store not loaded"))?;

        let (value, changed) = f(entries);
        if changed {
            self.persist(entries).await?;
        }
        Ok(value)
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.with_entries(|entries| (entries.get(key).cloned(), false))
            .await
    }

    async fn set(&self, key: &str, value: String) -> StorageResult<()> {
        self.with_entries(|entries| {
            entries.insert(key.to_string(), value);
            ((), true)
        })
        .await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.with_entries(|entries| ((), entries.remove(key).is_some()))
            .await
    }

    async fn clear(&self) -> StorageResult<()> {
        self.with_entries(|entries| {
            entries.clear();
            ((), true)
        })
        .await
    }
}
