//! Settings kept in the browser's `localStorage`.

use super::SettingsStore;
use crate::storage::{StorageError, StorageResult};

/// `window.localStorage`-backed settings for WebAssembly.
pub struct LocalStorageSettings {
    storage: web_sys::Storage,
}

impl LocalStorageSettings {
    /// Attach to the page's `localStorage`.
    pub fn new() -> StorageResult<Self> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("No window object".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("localStorage error: {:?}", e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage not available".to_string()))?;
        Ok(Self { storage })
    }
}

impl SettingsStore for LocalStorageSettings {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Io(format!("getItem({}) failed: {:?}", key, e)))
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Io(format!("setItem({}) failed: {:?}", key, e)))
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::Io(format!("removeItem({}) failed: {:?}", key, e)))
    }
}
