//! Document-level view over a key-value store.

use super::{KeyValueStore, StorageResult};
use crate::document::{DocumentContent, DocumentId};
use std::sync::Arc;

/// Reads and writes serialized document content, one record per document id.
///
/// This is the only path to the underlying store; the editor binding goes
/// through it for hydration and autosave.
pub struct DocumentStore<S: KeyValueStore> {
    backend: Arc<S>,
}

impl<S: KeyValueStore> Clone for DocumentStore<S> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<S: KeyValueStore> DocumentStore<S> {
    pub fn new(backend: Arc<S>) -> Self {
        Self { backend }
    }

    /// Fetch the stored content for `id`.
    ///
    /// Returns the empty scene when nothing has been stored for `id`.
    pub async fn get(&self, id: &DocumentId) -> StorageResult<DocumentContent> {
        match self.backend.get(id.as_str()).await? {
            Some(json) => DocumentContent::from_json(&json),
            None => Ok(DocumentContent::empty()),
        }
    }

    /// Store `content` for `id`, replacing whatever was there.
    pub async fn put(&self, id: &DocumentId, content: &DocumentContent) -> StorageResult<()> {
        let json = content.to_json()?;
        self.put_raw(id, json).await
    }

    /// Store already-serialized content for `id`.
    pub(crate) async fn put_raw(&self, id: &DocumentId, json: String) -> StorageResult<()> {
        self.backend.put(id.as_str(), json).await?;
        log::debug!("Stored document {}", id);
        Ok(())
    }

    /// Remove the record for `id`.
    pub async fn delete(&self, id: &DocumentId) -> StorageResult<()> {
        self.backend.delete(id.as_str()).await
    }

    /// Check whether a record exists for `id`.
    pub async fn exists(&self, id: &DocumentId) -> StorageResult<bool> {
        self.backend.contains(id.as_str()).await
    }

    /// List stored document ids, sorted.
    ///
    /// Keys that are not valid document ids are skipped.
    pub async fn list(&self) -> StorageResult<Vec<DocumentId>> {
        let mut ids: Vec<DocumentId> = self
            .backend
            .keys()
            .await?
            .into_iter()
            .filter_map(|key| match DocumentId::parse(key.clone()) {
                Ok(id) => Some(id),
                Err(e) => {
                    log::warn!("Skipping stored key {:?}: {}", key, e);
                    None
                }
            })
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Get a reference to the storage backend.
    pub fn backend(&self) -> &Arc<S> {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageError};
    use pollster::block_on;
    use serde_json::json;

    fn store() -> DocumentStore<MemoryStorage> {
        DocumentStore::new(Arc::new(MemoryStorage::new()))
    }

    fn id(raw: &str) -> DocumentId {
        DocumentId::parse(raw).unwrap()
    }

    #[test]
    fn test_get_without_put_is_empty() {
        let store = store();
        let content = block_on(store.get(&id("never-written"))).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let store = store();
        let doc = id("doc");
        let first = DocumentContent::from_value(json!({ "elements": [1] }));
        let second = DocumentContent::from_value(json!({ "elements": [1, 2] }));

        block_on(store.put(&doc, &first)).unwrap();
        block_on(store.put(&doc, &second)).unwrap();

        assert_eq!(block_on(store.get(&doc)).unwrap(), second);
        assert_eq!(block_on(store.list()).unwrap(), vec![doc]);
    }

    #[test]
    fn test_corrupt_record() {
        let store = store();
        block_on(store.backend().put("broken", "{oops".to_string())).unwrap();

        assert!(matches!(
            block_on(store.get(&id("broken"))),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_unavailable_backend() {
        let store = store();
        store.backend().set_available(false);

        assert!(matches!(
            block_on(store.get(&id("doc"))),
            Err(StorageError::Unavailable(_))
        ));
        assert!(matches!(
            block_on(store.put(&id("doc"), &DocumentContent::empty())),
            Err(StorageError::Unavailable(_))
        ));
    }

    #[test]
    fn test_list_sorted_and_skips_invalid_keys() {
        let store = store();
        block_on(store.put(&id("b"), &DocumentContent::empty())).unwrap();
        block_on(store.put(&id("a"), &DocumentContent::empty())).unwrap();
        block_on(store.backend().put("", "{}".to_string())).unwrap();

        assert_eq!(block_on(store.list()).unwrap(), vec![id("a"), id("b")]);
    }

    #[test]
    fn test_delete_and_exists() {
        let store = store();
        let doc = id("doc");

        assert!(!block_on(store.exists(&doc)).unwrap());
        block_on(store.put(&doc, &DocumentContent::empty())).unwrap();
        assert!(block_on(store.exists(&doc)).unwrap());

        block_on(store.delete(&doc)).unwrap();
        assert!(!block_on(store.exists(&doc)).unwrap());
        assert!(block_on(store.get(&doc)).unwrap().is_empty());
    }
}
