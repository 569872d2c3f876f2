//! [`KeyValueStore`] implementations.
//!
//! - [`MemoryKeyValueStore`] keeps everything in a `HashMap`; nothing is
//!   persisted.
//! - [`FileKeyValueStore`] writes one `<key>.json` file per key under a
//!   directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::application::{KeyValueStore, StorageError};

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One file per key.  Keys must be plain file names.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid storage key '{key}'"),
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)?) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        // Write-then-rename so a crash never leaves a half-written file.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use uuid::Uuid;

    use crate::application::{ChatHistory, ChatMessage};

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("vision_inspector_kv_{}", Uuid::new_v4()))
    }

    #[test]
    fn test_memory_store_returns_none_for_missing_key() {
        let store = MemoryKeyValueStore::new();
        assert!(store.get("chat-storage").unwrap().is_none());
    }

    #[test]
    fn test_memory_store_put_overwrites() {
        let store = MemoryKeyValueStore::new();
        store.put("k", "one").unwrap();
        store.put("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        // Arrange
        let dir = temp_dir();
        FileKeyValueStore::new(&dir).put("chat-storage", "[]").unwrap();

        // Act
        let value = FileKeyValueStore::new(&dir).get("chat-storage").unwrap();

        // Assert
        assert_eq!(value.as_deref(), Some("[]"));
        assert!(dir.join("chat-storage.json").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_file_store_missing_dir_reads_as_empty() {
        let store = FileKeyValueStore::new(temp_dir());
        assert!(store.get("chat-storage").unwrap().is_none());
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let store = FileKeyValueStore::new(temp_dir());
        assert!(store.put("../escape", "x").is_err());
        assert!(store.get("a/b").is_err());
    }

    #[test]
    fn test_chat_history_survives_reload_through_file_store() {
        // Arrange
        let dir = temp_dir();
        let store: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(&dir));
        let mut history = ChatHistory::load(Arc::clone(&store)).unwrap();
        history.add_message(ChatMessage::user("how many people?")).unwrap();

        // Act
        let reloaded = ChatHistory::load(store).unwrap();

        // Assert
        assert_eq!(reloaded.messages(), history.messages());

        std::fs::remove_dir_all(&dir).ok();
    }
}
