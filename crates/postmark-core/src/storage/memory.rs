//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>> {
        let key = key.to_string();
        Box::pin(async move {
            let values = self.values.read().map_err(lock_error)?;
            Ok(values.get(&key).cloned())
        })
    }

    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let value = value.to_string();
        Box::pin(async move {
            let mut values = self.values.write().map_err(lock_error)?;
            values.insert(key, value);
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut values = self.values.write().map_err(lock_error)?;
            values.remove(&key);
            Ok(())
        })
    }

    fn keys(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let values = self.values.read().map_err(lock_error)?;
            Ok(values.keys().cloned().collect())
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let key = key.to_string();
        Box::pin(async move {
            let values = self.values.read().map_err(lock_error)?;
            Ok(values.contains_key(&key))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::block_on;

    #[test]
    fn test_set_and_get() {
        let storage = MemoryStorage::new();
        block_on(storage.set("greeting", "hello")).unwrap();
        assert_eq!(block_on(storage.get("greeting")).unwrap().as_deref(), Some("hello"));

        block_on(storage.set("greeting", "bye")).unwrap();
        assert_eq!(block_on(storage.get("greeting")).unwrap().as_deref(), Some("bye"));
    }

    #[test]
    fn test_missing_key() {
        let storage = MemoryStorage::new();
        assert_eq!(block_on(storage.get("nonexistent")).unwrap(), None);
        assert!(!block_on(storage.exists("nonexistent")).unwrap());
    }

    #[test]
    fn test_remove() {
        let storage = MemoryStorage::new();
        block_on(storage.set("k", "v")).unwrap();
        block_on(storage.remove("k")).unwrap();
        assert!(!block_on(storage.exists("k")).unwrap());
        block_on(storage.remove("k")).unwrap();
    }

    #[test]
    fn test_keys() {
        let storage = MemoryStorage::new();
        block_on(storage.set("a", "1")).unwrap();
        block_on(storage.set("b", "2")).unwrap();

        let mut keys = block_on(storage.keys()).unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }
}
