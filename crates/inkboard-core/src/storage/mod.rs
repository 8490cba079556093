//! Storage abstraction for document persistence.

mod document_store;
mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(target_arch = "wasm32")]
mod indexeddb;

pub use document_store::DocumentStore;
pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use indexeddb::IndexedDbStorage;

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
#[cfg(not(target_arch = "wasm32"))]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Boxed future for async operations (compatible with WASM).
#[cfg(target_arch = "wasm32")]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Asynchronous string key-value store.
///
/// Implementations can keep records in memory, on the filesystem or in
/// IndexedDB (WASM). Values are opaque strings; `put` overwrites whatever
/// was stored under the key before.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>>;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: String) -> BoxFuture<'_, StorageResult<()>>;

    /// Remove the value stored under `key`. Missing keys are not an error.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all stored keys.
    fn keys(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a value is stored under `key`.
    fn contains(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Asynchronous string key-value store (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait KeyValueStore {
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>>;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: String) -> BoxFuture<'_, StorageResult<()>>;

    /// Remove the value stored under `key`. Missing keys are not an error.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all stored keys.
    fn keys(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a value is stored under `key`.
    fn contains(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}
