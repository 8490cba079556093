//! In-memory settings store.

use super::SettingsStore;
use crate::storage::{StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory settings for testing and ephemeral use.
#[derive(Default)]
pub struct MemorySettings {
    items: RwLock<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Unavailable(format!("Lock error: {}", e))
}

impl SettingsStore for MemorySettings {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let items = self.items.read().map_err(lock_error)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut items = self.items.write().map_err(lock_error)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut items = self.items.write().map_err(lock_error)?;
        items.remove(key);
        Ok(())
    }
}
