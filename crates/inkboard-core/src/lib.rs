//! Inkboard Core Library
//!
//! Persistence for the Inkboard note and drawing editor: document storage,
//! user settings and debounced autosave of the active document.

pub mod binding;
pub mod config;
pub mod debounce;
pub mod document;
pub mod settings;
pub mod storage;

pub use binding::{
    BindingState, DEFAULT_DEBOUNCE_WINDOW, EditorBinding, FlushOutcome, HydrationTicket,
};
pub use config::{ConfigError, InkboardConfig};
pub use debounce::{Debouncer, Instant};
pub use document::{DocumentContent, DocumentDescriptor, DocumentId};
pub use settings::{MemorySettings, SettingKey, Settings, SettingsStore};
pub use storage::{
    DocumentStore, KeyValueStore, MemoryStorage, StorageError, StorageResult,
};

#[cfg(not(target_arch = "wasm32"))]
pub use settings::FileSettings;
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use settings::LocalStorageSettings;
#[cfg(target_arch = "wasm32")]
pub use storage::IndexedDbStorage;
