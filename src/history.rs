//! Durable chat history
//!
//! Keeps the newest messages under a single key of an opaque key-value
//! store. Loading never fails outward: missing or corrupt data loads as an
//! empty history.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::session::Message;
use crate::{Error, Result};

/// Storage key for the message list
pub const HISTORY_KEY: &str = "chatbot_history";

/// Maximum persisted messages
pub const MAX_MESSAGES: usize = 100;

/// Minimal key-value storage
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    ///
    /// # Errors
    ///
    /// Returns error if the backing storage cannot be read
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value
    ///
    /// # Errors
    ///
    /// Returns error if the backing storage cannot be written
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value; deleting a missing key is not an error
    ///
    /// # Errors
    ///
    /// Returns error if the backing storage cannot be modified
    fn remove(&self, key: &str) -> Result<()>;
}

/// One JSON file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store files under `dir`, creating it on first write
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Directory holding the files
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        // Write then rename so a crash never leaves half a file behind
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Exported history document
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryExport<'a> {
    export_date: DateTime<Utc>,
    message_count: usize,
    messages: &'a [Message],
}

/// Chat history over a [`KeyValueStore`]
#[derive(Clone)]
pub struct ChatHistoryStore {
    store: Arc<dyn KeyValueStore>,
    max_messages: usize,
}

impl ChatHistoryStore {
    /// Create a history store over `store`
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            max_messages: MAX_MESSAGES,
        }
    }

    /// File-backed history under `data_dir`
    #[must_use]
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::new(data_dir)))
    }

    /// Persist the newest messages, dropping the oldest beyond the cap
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written
    pub fn save(&self, messages: &[Message]) -> Result<()> {
        let start = messages.len().saturating_sub(self.max_messages);
        let kept = &messages[start..];
        let json = serde_json::to_string(kept)?;
        self.store.set(HISTORY_KEY, &json)?;
        tracing::trace!(saved = kept.len(), dropped = start, "history saved");
        Ok(())
    }

    /// Load history, treating absence or corruption as empty
    #[must_use]
    pub fn load(&self) -> Vec<Message> {
        match self.try_load() {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(error = %e, "could not load chat history, starting empty");
                Vec::new()
            }
        }
    }

    /// Load history, reporting corruption
    ///
    /// # Errors
    ///
    /// Returns `StorageCorrupt` if the stored value cannot be decoded
    pub fn try_load(&self) -> Result<Vec<Message>> {
        let Some(raw) = self.store.get(HISTORY_KEY)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|e| Error::StorageCorrupt(e.to_string()))
    }

    /// Remove all stored history; clearing twice is fine
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be modified
    pub fn clear(&self) -> Result<()> {
        self.store.remove(HISTORY_KEY)?;
        tracing::debug!("history cleared");
        Ok(())
    }

    /// Pretty JSON document of the stored history
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn export(&self) -> Result<String> {
        let messages = self.load();
        let doc = HistoryExport {
            export_date: Utc::now(),
            message_count: messages.len(),
            messages: &messages,
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }
}
