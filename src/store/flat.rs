//! Flat JSON key-value file.

use std::io;
use std::path::PathBuf;

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// Errors that can occur while reading or writing a store file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access store file: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse store file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store file does not contain a JSON object")]
    NotAnObject,

    #[error("Granting {days} days overflows the calendar")]
    DateOverflow { days: i64 },
}

/// A whole-file JSON object used as a string-keyed map.
///
/// Read-modify-write cycles issued through [`FlatStore::update`] are
/// serialised by an in-process mutex. Other processes writing the same file
/// still race, and the last write wins.
#[derive(Debug)]
pub struct FlatStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FlatStore {
    /// Creates a store backed by the given file. The file need not exist.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Reads the whole map, reporting every failure.
    ///
    /// A missing file is not a failure and yields an empty map.
    pub async fn try_load(&self) -> Result<Map<String, Value>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Store file {} not found, starting empty", self.path.display());
                return Ok(Map::new());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject),
        }
    }

    /// Reads the whole map, substituting an empty one on any failure.
    pub async fn load(&self) -> Map<String, Value> {
        match self.try_load().await {
            Ok(map) => map,
            Err(e @ (StoreError::Json(_) | StoreError::NotAnObject)) => {
                warn!("Corrupt store file {}: {} - resetting", self.path.display(), e);
                Map::new()
            }
            Err(e) => {
                error!("Error reading {}: {}", self.path.display(), e);
                Map::new()
            }
        }
    }

    /// Rewrites the whole file with the given map.
    pub async fn save(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
        let content = serde_json::to_string(map)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    /// Returns the raw value stored under `key`.
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.load().await.remove(key)
    }

    /// Loads the map, applies `mutate`, and persists the result.
    ///
    /// A failed write is logged and otherwise ignored.
    pub async fn update<T>(&self, mutate: impl FnOnce(&mut Map<String, Value>) -> T) -> T {
        let _guard = self.write_lock.lock().await;

        let mut map = self.load().await;
        let result = mutate(&mut map);

        if let Err(e) = self.save(&map).await {
            error!("Error writing {}: {}", self.path.display(), e);
        }

        result
    }
}
