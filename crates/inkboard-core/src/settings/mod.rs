//! User settings.
//!
//! Settings are a handful of independent string entries kept in a small
//! synchronous store (a JSON file natively, `localStorage` in the browser).
//! [`Settings`] wraps a store with one typed accessor per entry.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(target_arch = "wasm32")]
mod local_storage;

pub use memory::MemorySettings;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileSettings;

#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageSettings;

use crate::document::DocumentId;
use crate::storage::{StorageError, StorageResult};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Separator of the custom font list.
const FONT_SEPARATOR: char = ',';

/// Synchronous string key-value store for settings.
pub trait SettingsStore {
    /// Read the value stored under `key`.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`. Missing keys are not an error.
    fn remove_item(&self, key: &str) -> StorageResult<()>;
}

/// The settings Inkboard keeps, each under its own key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Which sidebar menus are expanded.
    OpenMenuKeys,
    /// The document that was active last.
    CurrentDocumentId,
    /// User-added board fonts.
    BoardCustomFonts,
    /// UI language code.
    Language,
    /// Whether custom board fonts are enabled.
    FontSwitch,
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        SettingKey::OpenMenuKeys,
        SettingKey::CurrentDocumentId,
        SettingKey::BoardCustomFonts,
        SettingKey::Language,
        SettingKey::FontSwitch,
    ];

    /// The key used in the backing store.
    pub fn storage_key(self) -> &'static str {
        match self {
            SettingKey::OpenMenuKeys => "inkboard:openMenuKeys",
            SettingKey::CurrentDocumentId => "inkboard:currentDocumentId",
            SettingKey::BoardCustomFonts => "inkboard:boardCustomFonts",
            SettingKey::Language => "inkboard:language",
            SettingKey::FontSwitch => "inkboard:fontSwitch",
        }
    }

    /// Short name for command lines and logs.
    pub fn name(self) -> &'static str {
        match self {
            SettingKey::OpenMenuKeys => "open-menu-keys",
            SettingKey::CurrentDocumentId => "current-document-id",
            SettingKey::BoardCustomFonts => "board-custom-fonts",
            SettingKey::Language => "language",
            SettingKey::FontSwitch => "font-switch",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SettingKey {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.name() == s || key.storage_key() == s)
            .ok_or_else(|| StorageError::InvalidKey(format!("unknown setting {:?}", s)))
    }
}

/// Typed access to the user's settings.
pub struct Settings<S: SettingsStore> {
    store: Arc<S>,
}

impl<S: SettingsStore> Clone for Settings<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: SettingsStore> Settings<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Raw stored value of a setting.
    pub fn get(&self, key: SettingKey) -> StorageResult<Option<String>> {
        self.store.get_item(key.storage_key())
    }

    /// Overwrite a setting with a raw value.
    pub fn set(&self, key: SettingKey, value: &str) -> StorageResult<()> {
        log::debug!("Setting {} = {:?}", key, value);
        self.store.set_item(key.storage_key(), value)
    }

    /// Remove a setting, so reads return its default again.
    pub fn clear(&self, key: SettingKey) -> StorageResult<()> {
        self.store.remove_item(key.storage_key())
    }

    pub fn open_menu_keys(&self) -> StorageResult<Vec<String>> {
        match self.get(SettingKey::OpenMenuKeys)? {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| StorageError::Serialization(format!("open menu keys: {}", e))),
            None => Ok(Vec::new()),
        }
    }

    pub fn set_open_menu_keys(&self, keys: &[String]) -> StorageResult<()> {
        let json = serde_json::to_string(keys)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.set(SettingKey::OpenMenuKeys, &json)
    }

    /// The document that was active last, if it is still a valid id.
    pub fn current_document_id(&self) -> StorageResult<Option<DocumentId>> {
        match self.get(SettingKey::CurrentDocumentId)? {
            Some(raw) => match DocumentId::parse(raw) {
                Ok(id) => Ok(Some(id)),
                Err(e) => {
                    log::warn!("Ignoring stored current document id: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    pub fn set_current_document_id(&self, id: &DocumentId) -> StorageResult<()> {
        self.set(SettingKey::CurrentDocumentId, id.as_str())
    }

    pub fn board_custom_fonts(&self) -> StorageResult<Vec<String>> {
        Ok(self
            .get(SettingKey::BoardCustomFonts)?
            .map(|joined| {
                joined
                    .split(FONT_SEPARATOR)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Replace the custom font list. Repeated names are kept once, in
    /// order of first appearance.
    pub fn set_board_custom_fonts(&self, fonts: &[String]) -> StorageResult<()> {
        let mut unique: Vec<&str> = Vec::with_capacity(fonts.len());
        for font in fonts {
            validate_font_name(font)?;
            if !unique.contains(&font.as_str()) {
                unique.push(font.as_str());
            }
        }
        self.set(SettingKey::BoardCustomFonts, &unique.join(","))
    }

    /// Add a font to the custom font list unless it is already there.
    ///
    /// Returns true if the list changed.
    pub fn add_board_custom_font(&self, name: &str) -> StorageResult<bool> {
        validate_font_name(name)?;

        let mut fonts = self.board_custom_fonts()?;
        if fonts.iter().any(|font| font == name) {
            return Ok(false);
        }
        fonts.push(name.to_string());
        self.set(SettingKey::BoardCustomFonts, &fonts.join(","))?;
        log::info!("Added custom board font {:?}", name);
        Ok(true)
    }

    pub fn language(&self) -> StorageResult<Option<String>> {
        self.get(SettingKey::Language)
    }

    pub fn set_language(&self, code: &str) -> StorageResult<()> {
        self.set(SettingKey::Language, code)
    }

    /// Defaults to off.
    pub fn font_switch(&self) -> StorageResult<bool> {
        Ok(matches!(
            self.get(SettingKey::FontSwitch)?.as_deref(),
            Some("true")
        ))
    }

    pub fn set_font_switch(&self, enabled: bool) -> StorageResult<()> {
        self.set(SettingKey::FontSwitch, if enabled { "true" } else { "false" })
    }

    /// Get a reference to the settings store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

fn validate_font_name(name: &str) -> StorageResult<()> {
    if name.trim().is_empty() {
        return Err(StorageError::Serialization("font name is empty".to_string()));
    }
    if name.contains(FONT_SEPARATOR) {
        return Err(StorageError::Serialization(format!(
            "font name {:?} contains '{}'",
            name, FONT_SEPARATOR
        )));
    }
    Ok(())
}
