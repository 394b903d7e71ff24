//! Key/value state store.
//!
//! Local state is a flat JSON object keyed by name. [`JsonFileStore`] keeps
//! it in one file, rewritten through a temp file and rename.

use std::path::{Path, PathBuf};

use multievent_providers::BoxFuture;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {path} is not a JSON object: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A JSON key/value store.
pub trait KeyValueStore: Send + Sync {
    /// Returns the entries for `keys` that exist.
    fn get<'a>(&'a self, keys: &'a [&'a str]) -> BoxFuture<'a, StoreResult<Map<String, Value>>>;

    /// Writes `entries`, leaving other keys untouched.
    fn set(&self, entries: Map<String, Value>) -> BoxFuture<'_, StoreResult<()>>;
}

/// Store backed by a single JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn read_all(&self) -> StoreResult<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        match serde_json::from_str(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StoreError::Corrupt {
                path: self.path.clone(),
                reason: "top-level value is not an object".to_string(),
            }),
            Err(e) => Err(StoreError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
        }
    }

    async fn write_all(&self, map: &Map<String, Value>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let content = serde_json::to_string_pretty(map).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, content)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!("saved state to {:?}", self.path);
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get<'a>(&'a self, keys: &'a [&'a str]) -> BoxFuture<'a, StoreResult<Map<String, Value>>> {
        Box::pin(async move {
            let mut all = self.read_all().await?;
            Ok(keys
                .iter()
                .filter_map(|key| all.remove(*key).map(|value| (key.to_string(), value)))
                .collect())
        })
    }

    fn set(&self, entries: Map<String, Value>) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            // A corrupt file is replaced rather than blocking every save.
            let mut all = match self.read_all().await {
                Ok(all) => all,
                Err(StoreError::Corrupt { .. }) => Map::new(),
                Err(e) => return Err(e),
            };
            all.extend(entries);
            self.write_all(&all).await
        })
    }
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    pub(crate) entries: std::sync::Mutex<Map<String, Value>>,
    /// Fail every call when set.
    pub(crate) broken: bool,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get<'a>(&'a self, keys: &'a [&'a str]) -> BoxFuture<'a, StoreResult<Map<String, Value>>> {
        let result = if self.broken {
            Err(StoreError::Corrupt {
                path: PathBuf::from("memory"),
                reason: "broken".to_string(),
            })
        } else {
            let entries = self.entries.lock().unwrap();
            Ok(keys
                .iter()
                .filter_map(|k| entries.get(*k).map(|v| (k.to_string(), v.clone())))
                .collect())
        };
        Box::pin(async move { result })
    }

    fn set(&self, entries: Map<String, Value>) -> BoxFuture<'_, StoreResult<()>> {
        let result = if self.broken {
            Err(StoreError::Io {
                path: PathBuf::from("memory"),
                source: std::io::Error::other("broken"),
            })
        } else {
            self.entries.lock().unwrap().extend(entries);
            Ok(())
        };
        Box::pin(async move { result })
    }
}
