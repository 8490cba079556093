//! Document identity and content.

use crate::storage::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Longest accepted document identifier, in bytes.
///
/// Percent-encoded for file storage, each byte takes at most three
/// characters, which keeps the record file name under 255 bytes.
pub const MAX_ID_LEN: usize = 80;

/// A validated document identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Validate a raw identifier.
    ///
    /// Empty identifiers, identifiers longer than [`MAX_ID_LEN`] and
    /// identifiers containing control characters are rejected.
    pub fn parse(raw: impl Into<String>) -> StorageResult<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(StorageError::InvalidKey("document id is empty".to_string()));
        }
        if raw.len() > MAX_ID_LEN {
            return Err(StorageError::InvalidKey(format!(
                "document id is {} bytes, limit is {}",
                raw.len(),
                MAX_ID_LEN
            )));
        }
        if raw.chars().any(char::is_control) {
            return Err(StorageError::InvalidKey(format!(
                "document id {:?} contains control characters",
                raw
            )));
        }
        Ok(Self(raw))
    }

    /// Mint a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for DocumentId {
    type Error = StorageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What the hosting UI knows about the document it wants edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    /// Unique document identifier.
    pub id: DocumentId,
    /// Display name.
    pub name: String,
}

impl DocumentDescriptor {
    pub fn new(id: DocumentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Create a descriptor for a brand new document.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(DocumentId::generate(), name)
    }

    /// Create a descriptor for a brand new, unnamed document.
    pub fn untitled() -> Self {
        Self::named("Untitled")
    }
}

/// Serialized drawing state of a document.
///
/// The structure is opaque to the persistence layer: anything that
/// serializes to JSON is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentContent(Value);

impl Default for DocumentContent {
    fn default() -> Self {
        Self::empty()
    }
}

impl DocumentContent {
    /// The empty scene, used when nothing has been stored yet.
    pub fn empty() -> Self {
        Self(serde_json::json!({ "elements": [] }))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Serialize an editor model into document content.
    pub fn from_model<T: Serialize + ?Sized>(model: &T) -> StorageResult<Self> {
        serde_json::to_value(model)
            .map(Self)
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Decode content into a concrete editor model.
    pub fn to_model<T: for<'de> Deserialize<'de>>(&self) -> StorageResult<T> {
        T::deserialize(&self.0).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Whether this is the empty scene.
    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Serialize the content to its stored form.
    pub fn to_json(&self) -> StorageResult<String> {
        serde_json::to_string(&self.0).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Parse content from its stored form.
    pub fn from_json(json: &str) -> StorageResult<Self> {
        serde_json::from_str(json)
            .map(Self)
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}
