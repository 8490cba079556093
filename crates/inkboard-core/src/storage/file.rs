//! File-based storage implementation for native platforms.

use super::{BoxFuture, KeyValueStore, StorageError, StorageResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const RECORD_EXTENSION: &str = "json";

/// File-based storage for native platforms.
///
/// Stores one record per file in a specified directory. Keys are
/// percent-encoded into file names, so every distinct key maps to a
/// distinct file. Document ids are short enough that the encoded name
/// always fits in a file name.
pub struct FileStorage {
    /// Base directory for record storage.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Unavailable(format!(
                    "Failed to create storage directory {}: {}",
                    base_path.display(),
                    e
                ))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/inkboard/documents/`
    /// On Windows: `%LOCALAPPDATA%\inkboard\documents\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| {
                StorageError::Unavailable("Could not determine home directory".to_string())
            })?;

        Self::new(base.join("inkboard").join("documents"))
    }

    /// Get the file path for a key.
    fn record_path(&self, key: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.{}", encode_key(key), RECORD_EXTENSION))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

fn encode_key(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

fn decode_key(name: &str) -> Option<String> {
    urlencoding::decode(name).ok().map(|key| key.into_owned())
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>> {
        let path = self.record_path(key);

        Box::pin(async move {
            match fs::read_to_string(&path) {
                Ok(value) => Ok(Some(value)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(StorageError::Io(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                ))),
            }
        })
    }

    fn put(&self, key: &str, value: String) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.record_path(key);

        Box::pin(async move {
            if !self.base_path.is_dir() {
                return Err(StorageError::Unavailable(format!(
                    "Storage directory {} is gone",
                    self.base_path.display()
                )));
            }
            fs::write(&path, value).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
            })
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.record_path(key);

        Box::pin(async move {
            match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StorageError::Io(format!(
                    "Failed to delete {}: {}",
                    path.display(),
                    e
                ))),
            }
        })
    }

    fn keys(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();

        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }

            let entries = fs::read_dir(&base).map_err(|e| {
                StorageError::Io(format!("Failed to read directory: {}", e))
            })?;

            let mut keys = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                // Only include record files
                if path.extension().is_none_or(|ext| ext != RECORD_EXTENSION) {
                    continue;
                }
                if let Some(key) = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(decode_key)
                {
                    keys.push(key);
                }
            }
            Ok(keys)
        })
    }

    fn contains(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.record_path(key);
        Box::pin(async move { Ok(path.is_file()) })
    }
}
