//! Persistence of the most recent upload.
//!
//! The storage network's index lags behind fresh uploads. Keeping the last
//! upload locally lets the gallery show it right away when asked to
//! highlight it.

use super::{Storage, StorageError, StorageResult};
use crate::memory::Memory;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Key holding the most recent upload.
pub const LAST_UPLOAD_KEY: &str = "postmark:last-upload";

/// A memory together with when it was uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastUpload {
    pub memory: Memory,
    /// Seconds since the Unix epoch.
    pub uploaded_at: u64,
}

/// Reads and writes the last upload through a storage backend.
pub struct LastUploadStore<S: Storage + ?Sized> {
    storage: Arc<S>,
}

impl<S: Storage + ?Sized> Clone for LastUploadStore<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: Storage + ?Sized> LastUploadStore<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Replace the stored record.
    pub async fn save(&self, upload: &LastUpload) -> StorageResult<()> {
        let json = serde_json::to_string(upload)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.set(LAST_UPLOAD_KEY, &json).await?;
        log::info!("Stored last upload: {}", upload.memory.id);
        Ok(())
    }

    /// The stored record, if any.
    pub async fn load(&self) -> StorageResult<Option<LastUpload>> {
        let Some(json) = self.storage.get(LAST_UPLOAD_KEY).await? else {
            return Ok(None);
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StorageError::Serialization(format!("Failed to parse last upload: {}", e)))
    }

    /// The stored record if it is the memory with id `highlight`.
    ///
    /// Unreadable records are logged and treated as absent.
    pub async fn highlight(&self, highlight: &str) -> Option<LastUpload> {
        match self.load().await {
            Ok(Some(upload)) if upload.memory.id == highlight => Some(upload),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Ignoring stored upload: {}", e);
                None
            }
        }
    }

    pub async fn clear(&self) -> StorageResult<()> {
        self.storage.remove(LAST_UPLOAD_KEY).await
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Visibility;
    use crate::storage::{MemoryStorage, block_on};

    fn upload(id: &str) -> LastUpload {
        LastUpload {
            memory: Memory {
                id: id.to_string(),
                content_type: "image/png".to_string(),
                title: Some("Harbor".to_string()),
                location: Some("Lisbon".to_string()),
                handle: None,
                visibility: Visibility::Public,
                unix_time: Some(1_700_000_000),
                app_version: Some("1.0.0".to_string()),
            },
            uploaded_at: 1_700_000_001,
        }
    }

    #[test]
    fn test_save_and_load() {
        let store = LastUploadStore::new(Arc::new(MemoryStorage::new()));
        assert_eq!(block_on(store.load()).unwrap(), None);

        block_on(store.save(&upload("tx1"))).unwrap();
        block_on(store.save(&upload("tx2"))).unwrap();
        assert_eq!(block_on(store.load()).unwrap(), Some(upload("tx2")));
    }

    #[test]
    fn test_highlight_requires_matching_id() {
        let store = LastUploadStore::new(Arc::new(MemoryStorage::new()));
        block_on(store.save(&upload("tx1"))).unwrap();

        assert_eq!(block_on(store.highlight("tx1")), Some(upload("tx1")));
        assert_eq!(block_on(store.highlight("other")), None);

        block_on(store.clear()).unwrap();
        assert_eq!(block_on(store.highlight("tx1")), None);
    }

    #[test]
    fn test_corrupt_record() {
        let storage = Arc::new(MemoryStorage::new());
        block_on(storage.set(LAST_UPLOAD_KEY, "{not json")).unwrap();
        let store = LastUploadStore::new(storage);

        assert!(matches!(block_on(store.load()), Err(StorageError::Serialization(_))));
        assert_eq!(block_on(store.highlight("tx1")), None);
    }
}
