//! Binds the editor's in-memory document to the document store.
//!
//! The binding loads a document when it becomes active and writes edits back
//! once the user pauses. The host calls [`EditorBinding::on_change`] for
//! every edit and [`EditorBinding::poll`] from its event loop; storage
//! failures are logged and reported, never raised to the editor.

use crate::debounce::{Debouncer, Instant};
use crate::document::{DocumentContent, DocumentDescriptor, DocumentId};
use crate::storage::{DocumentStore, KeyValueStore, StorageResult};
use serde::Serialize;
use std::time::Duration;

/// Default quiescence window before an edit is written.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration =
    Duration::from_millis(crate::config::DEFAULT_DEBOUNCE_MS);

/// Lifecycle of the active document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// Nothing fetched yet; the editor should render nothing.
    Unloaded,
    /// Content loaded and every edit written.
    Hydrated,
    /// An edit is waiting for its write.
    DirtyPending,
}

/// Result of one attempted write.
#[derive(Debug, Clone, PartialEq)]
pub struct FlushOutcome {
    pub document_id: DocumentId,
    pub result: StorageResult<()>,
}

impl FlushOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Ticket for an in-flight hydration.
///
/// Hosts that run the store read on their own executor take a ticket with
/// [`EditorBinding::begin_hydration`] and hand the result back through
/// [`EditorBinding::complete_hydration`]. A ticket issued before the
/// active document changed is ignored on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydrationTicket {
    pub document_id: DocumentId,
    generation: u64,
}

/// Keeps the active document's content and its debounced autosave.
pub struct EditorBinding<S: KeyValueStore> {
    store: DocumentStore<S>,
    active: Option<DocumentDescriptor>,
    /// Renderer-local copy of the active document; `None` until hydrated.
    content: Option<DocumentContent>,
    pending: Debouncer<DocumentId, String>,
    generation: u64,
}

impl<S: KeyValueStore> EditorBinding<S> {
    pub fn new(store: DocumentStore<S>) -> Self {
        Self::with_window(store, DEFAULT_DEBOUNCE_WINDOW)
    }

    pub fn with_window(store: DocumentStore<S>, window: Duration) -> Self {
        Self {
            store,
            active: None,
            content: None,
            pending: Debouncer::new(window),
            generation: 0,
        }
    }

    pub fn state(&self) -> BindingState {
        if self.content.is_none() {
            BindingState::Unloaded
        } else if self.pending.is_empty() {
            BindingState::Hydrated
        } else {
            BindingState::DirtyPending
        }
    }

    pub fn active(&self) -> Option<&DocumentDescriptor> {
        self.active.as_ref()
    }

    /// Content to render, `None` while the document is still loading.
    pub fn content(&self) -> Option<&DocumentContent> {
        self.content.as_ref()
    }

    pub fn has_pending_write(&self) -> bool {
        !self.pending.is_empty()
    }

    /// When the host should next call [`poll`](Self::poll).
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.next_deadline()
    }

    pub fn window(&self) -> Duration {
        self.pending.window()
    }

    pub fn store(&self) -> &DocumentStore<S> {
        &self.store
    }

    /// Make `descriptor` the active document.
    ///
    /// Any write still pending for the previous document is dropped, not
    /// flushed. The binding is Unloaded until hydration completes.
    pub fn activate(&mut self, descriptor: DocumentDescriptor) {
        self.discard_pending();
        log::debug!("Activating document {} ({})", descriptor.id, descriptor.name);
        self.active = Some(descriptor);
        self.content = None;
        self.generation += 1;
    }

    /// Leave the active document without saving pending edits.
    pub fn deactivate(&mut self) {
        self.discard_pending();
        self.active = None;
        self.content = None;
        self.generation += 1;
    }

    fn discard_pending(&mut self) {
        if let Some(previous) = &self.active {
            if self.pending.is_pending(&previous.id) {
                log::warn!("Discarding unsaved changes to {}", previous.id);
            }
        }
        self.pending.clear();
    }

    /// Start loading the active document.
    ///
    /// Returns `None` when there is no active document or it is already
    /// hydrated.
    pub fn begin_hydration(&self) -> Option<HydrationTicket> {
        if self.content.is_some() {
            return None;
        }
        self.active.as_ref().map(|descriptor| HydrationTicket {
            document_id: descriptor.id.clone(),
            generation: self.generation,
        })
    }

    /// Finish loading with the store's answer.
    ///
    /// A failed read hydrates the empty scene. Returns false if the ticket
    /// is stale and the result was dropped.
    pub fn complete_hydration(
        &mut self,
        ticket: HydrationTicket,
        fetched: StorageResult<DocumentContent>,
    ) -> bool {
        if ticket.generation != self.generation || self.content.is_some() {
            log::debug!("Dropping stale hydration of {}", ticket.document_id);
            return false;
        }

        let content = match fetched {
            Ok(content) => {
                log::info!("Hydrated document {}", ticket.document_id);
                content
            }
            Err(e) => {
                log::error!(
                    "Failed to load document {}, starting empty: {}",
                    ticket.document_id,
                    e
                );
                DocumentContent::empty()
            }
        };
        self.content = Some(content);
        true
    }

    /// Load the active document from the store.
    pub async fn hydrate(&mut self) -> Option<&DocumentContent> {
        if let Some(ticket) = self.begin_hydration() {
            let fetched = self.store.get(&ticket.document_id).await;
            self.complete_hydration(ticket, fetched);
        }
        self.content.as_ref()
    }

    /// Activate and hydrate in one step.
    pub async fn open(&mut self, descriptor: DocumentDescriptor) -> Option<&DocumentContent> {
        self.activate(descriptor);
        self.hydrate().await
    }

    /// Record an edit of the active document.
    ///
    /// The model replaces the in-memory content and a write is scheduled
    /// for when no further edit arrives within the window. Returns false if
    /// nothing was scheduled: no hydrated document, or the model could not
    /// be serialized (the previous content is kept).
    pub fn on_change<T: Serialize + ?Sized>(&mut self, model: &T, now: Instant) -> bool {
        let Some(descriptor) = &self.active else {
            log::warn!("Ignoring edit with no active document");
            return false;
        };
        if self.content.is_none() {
            log::warn!("Ignoring edit to {} before it finished loading", descriptor.id);
            return false;
        }

        let encoded = DocumentContent::from_model(model)
            .and_then(|content| content.to_json().map(|json| (content, json)));
        let (content, json) = match encoded {
            Ok(encoded) => encoded,
            Err(e) => {
                log::error!("Not saving edit to {}: {}", descriptor.id, e);
                return false;
            }
        };

        let id = descriptor.id.clone();
        if self.pending.schedule(id.clone(), json, now) {
            log::debug!("Superseded pending write of {}", id);
        }
        self.content = Some(content);
        true
    }

    /// Write every edit whose window has elapsed at `now`.
    pub async fn poll(&mut self, now: Instant) -> Vec<FlushOutcome> {
        let due = self.pending.take_due(now);
        self.write_all(due).await
    }

    /// Write the active document's pending edit right away.
    pub async fn flush_now(&mut self) -> Vec<FlushOutcome> {
        let Some(descriptor) = &self.active else {
            return Vec::new();
        };
        let id = descriptor.id.clone();
        let due = self
            .pending
            .take_now(&id)
            .into_iter()
            .map(|json| (id.clone(), json))
            .collect();
        self.write_all(due).await
    }

    async fn write_all(&self, due: Vec<(DocumentId, String)>) -> Vec<FlushOutcome> {
        let mut outcomes = Vec::with_capacity(due.len());
        for (document_id, json) in due {
            let result = self.store.put_raw(&document_id, json).await;
            match &result {
                Ok(()) => log::info!("Saved document {}", document_id),
                Err(e) => log::error!("Changes to {} were not saved: {}", document_id, e),
            }
            outcomes.push(FlushOutcome {
                document_id,
                result,
            });
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageError};
    use pollster::block_on;
    use serde_json::json;
    use std::sync::Arc;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn binding() -> EditorBinding<MemoryStorage> {
        EditorBinding::new(DocumentStore::new(Arc::new(MemoryStorage::new())))
    }

    fn descriptor(id: &str) -> DocumentDescriptor {
        DocumentDescriptor::new(DocumentId::parse(id).unwrap(), id)
    }

    #[test]
    fn test_starts_unloaded() {
        let binding = binding();
        assert_eq!(binding.state(), BindingState::Unloaded);
        assert!(binding.content().is_none());
        assert!(binding.begin_hydration().is_none());
    }

    #[test]
    fn test_activate_then_hydrate() {
        let mut binding = binding();
        binding.activate(descriptor("doc"));
        assert_eq!(binding.state(), BindingState::Unloaded);
        assert!(binding.content().is_none());

        let content = block_on(binding.hydrate()).cloned();
        assert_eq!(content, Some(DocumentContent::empty()));
        assert_eq!(binding.state(), BindingState::Hydrated);
    }

    #[test]
    fn test_hydrate_reads_stored_content() {
        let mut binding = binding();
        let stored = DocumentContent::from_value(json!({ "elements": ["line"] }));
        block_on(
            binding
                .store()
                .put(&DocumentId::parse("doc").unwrap(), &stored),
        )
        .unwrap();

        assert_eq!(block_on(binding.open(descriptor("doc"))), Some(&stored));
    }

    #[test]
    fn test_failed_read_hydrates_empty() {
        let mut binding = binding();
        binding.store().backend().set_available(false);

        let content = block_on(binding.open(descriptor("doc"))).cloned();
        assert_eq!(content, Some(DocumentContent::empty()));
        assert_eq!(binding.state(), BindingState::Hydrated);
    }

    #[test]
    fn test_edit_before_hydration_ignored() {
        let mut binding = binding();
        binding.activate(descriptor("doc"));

        assert!(!binding.on_change(&json!({ "elements": [1] }), Instant::now()));
        assert!(!binding.has_pending_write());
    }

    #[test]
    fn test_edit_marks_dirty_until_flushed() {
        let mut binding = binding();
        block_on(binding.open(descriptor("doc")));
        let t0 = Instant::now();

        assert!(binding.on_change(&json!({ "elements": [1] }), t0));
        assert_eq!(binding.state(), BindingState::DirtyPending);
        assert_eq!(binding.next_deadline(), Some(t0 + DEFAULT_DEBOUNCE_WINDOW));

        assert!(block_on(binding.poll(t0 + ms(100))).is_empty());
        let outcomes = block_on(binding.poll(t0 + ms(200)));
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_ok());
        assert_eq!(binding.state(), BindingState::Hydrated);
        assert_eq!(binding.store().backend().write_count(), 1);
    }

    #[test]
    fn test_failed_write_keeps_memory() {
        let mut binding = binding();
        block_on(binding.open(descriptor("doc")));
        let t0 = Instant::now();
        let edit = json!({ "elements": ["kept"] });

        binding.store().backend().set_available(false);
        binding.on_change(&edit, t0);
        let outcomes = block_on(binding.poll(t0 + ms(200)));

        assert!(matches!(
            outcomes[0].result,
            Err(StorageError::Unavailable(_))
        ));
        assert_eq!(binding.content(), Some(&DocumentContent::from_value(edit)));
        // Not retried
        assert!(!binding.has_pending_write());
        assert_eq!(binding.state(), BindingState::Hydrated);
    }

    #[test]
    fn test_unserializable_edit_keeps_previous_content() {
        use std::collections::HashMap;

        let mut binding = binding();
        block_on(binding.open(descriptor("doc")));
        let t0 = Instant::now();
        binding.on_change(&json!({ "elements": [1] }), t0);
        block_on(binding.poll(t0 + ms(200)));

        // JSON object keys must be strings
        let mut bad = HashMap::new();
        bad.insert(vec![1u8], "x");
        assert!(!binding.on_change(&bad, t0 + ms(300)));

        assert_eq!(
            binding.content(),
            Some(&DocumentContent::from_value(json!({ "elements": [1] })))
        );
        assert!(!binding.has_pending_write());
    }

    #[test]
    fn test_switch_discards_pending_write() {
        let mut binding = binding();
        block_on(binding.open(descriptor("first")));
        let t0 = Instant::now();
        binding.on_change(&json!({ "elements": ["unsaved"] }), t0);

        block_on(binding.open(descriptor("second")));
        assert!(!binding.has_pending_write());
        assert!(block_on(binding.poll(t0 + ms(1000))).is_empty());
        assert_eq!(binding.store().backend().write_count(), 0);
    }

    #[test]
    fn test_stale_hydration_dropped() {
        let mut binding = binding();
        binding.activate(descriptor("first"));
        let stale = binding.begin_hydration().unwrap();

        binding.activate(descriptor("second"));
        let fresh = binding.begin_hydration().unwrap();

        let old = DocumentContent::from_value(json!({ "elements": ["first"] }));
        assert!(!binding.complete_hydration(stale, Ok(old)));
        assert_eq!(binding.state(), BindingState::Unloaded);

        assert!(binding.complete_hydration(fresh, Ok(DocumentContent::empty())));
        assert_eq!(binding.state(), BindingState::Hydrated);
    }

    #[test]
    fn test_flush_now() {
        let mut binding = binding();
        block_on(binding.open(descriptor("doc")));
        binding.on_change(&json!({ "elements": [7] }), Instant::now());

        let outcomes = block_on(binding.flush_now());
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].document_id.as_str(), "doc");
        assert!(!binding.has_pending_write());
        assert!(block_on(binding.flush_now()).is_empty());
    }

    #[test]
    fn test_deactivate() {
        let mut binding = binding();
        block_on(binding.open(descriptor("doc")));
        binding.on_change(&json!({ "elements": [7] }), Instant::now());

        binding.deactivate();
        assert!(binding.active().is_none());
        assert_eq!(binding.state(), BindingState::Unloaded);
        assert!(!binding.has_pending_write());
    }
}
