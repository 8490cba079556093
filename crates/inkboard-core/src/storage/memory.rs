//! In-memory storage implementation.

use super::{BoxFuture, KeyValueStore, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory storage for testing and ephemeral use.
pub struct MemoryStorage {
    records: RwLock<HashMap<String, String>>,
    available: AtomicBool,
    writes: AtomicUsize,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            writes: AtomicUsize::new(0),
        }
    }
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backing store going away (or coming back).
    ///
    /// While unavailable every operation fails with
    /// [`StorageError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of successful `put` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("memory storage is offline".to_string()))
        }
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Unavailable(format!("Lock error: {}", e))
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>> {
        let key = key.to_string();
        Box::pin(async move {
            self.check_available()?;
            let records = self.records.read().map_err(lock_error)?;
            Ok(records.get(&key).cloned())
        })
    }

    fn put(&self, key: &str, value: String) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            self.check_available()?;
            let mut records = self.records.write().map_err(lock_error)?;
            records.insert(key, value);
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            self.check_available()?;
            let mut records = self.records.write().map_err(lock_error)?;
            records.remove(&key);
            Ok(())
        })
    }

    fn keys(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            self.check_available()?;
            let records = self.records.read().map_err(lock_error)?;
            Ok(records.keys().cloned().collect())
        })
    }

    fn contains(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let key = key.to_string();
        Box::pin(async move {
            self.check_available()?;
            let records = self.records.read().map_err(lock_error)?;
            Ok(records.contains_key(&key))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;

    #[test]
    fn test_put_and_get() {
        let storage = MemoryStorage::new();

        block_on(storage.put("test", "{}".to_string())).unwrap();
        let loaded = block_on(storage.get("test")).unwrap();

        assert_eq!(loaded.as_deref(), Some("{}"));
        assert_eq!(storage.write_count(), 1);
    }

    #[test]
    fn test_missing_key() {
        let storage = MemoryStorage::new();
        assert_eq!(block_on(storage.get("nonexistent")).unwrap(), None);
    }

    #[test]
    fn test_put_overwrites() {
        let storage = MemoryStorage::new();

        block_on(storage.put("k", "first".to_string())).unwrap();
        block_on(storage.put("k", "second".to_string())).unwrap();

        assert_eq!(block_on(storage.get("k")).unwrap().as_deref(), Some("second"));
        assert_eq!(block_on(storage.keys()).unwrap().len(), 1);
    }

    #[test]
    fn test_contains_and_delete() {
        let storage = MemoryStorage::new();

        assert!(!block_on(storage.contains("test")).unwrap());
        block_on(storage.put("test", "x".to_string())).unwrap();
        assert!(block_on(storage.contains("test")).unwrap());

        block_on(storage.delete("test")).unwrap();
        assert!(!block_on(storage.contains("test")).unwrap());
        // Deleting again is fine
        block_on(storage.delete("test")).unwrap();
    }

    #[test]
    fn test_unavailable() {
        let storage = MemoryStorage::new();
        block_on(storage.put("k", "v".to_string())).unwrap();

        storage.set_available(false);
        assert!(matches!(
            block_on(storage.get("k")),
            Err(StorageError::Unavailable(_))
        ));
        assert!(matches!(
            block_on(storage.put("k", "w".to_string())),
            Err(StorageError::Unavailable(_))
        ));
        assert_eq!(storage.write_count(), 1);

        storage.set_available(true);
        assert_eq!(block_on(storage.get("k")).unwrap().as_deref(), Some("v"));
    }
}
