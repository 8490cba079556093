//! Keyed debouncing.
//!
//! Each key owns at most one pending slot. Scheduling again while the slot
//! is still inside its quiescence window supersedes the earlier payload and
//! restarts the window. The host drives time by passing `now` in, typically
//! from its event loop.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
pub use std::time::Instant;

#[cfg(target_arch = "wasm32")]
pub use web_time::Instant;

struct Slot<V> {
    deadline: Instant,
    payload: V,
}

/// Debounces payloads per key.
pub struct Debouncer<K, V> {
    window: Duration,
    slots: HashMap<K, Slot<V>>,
    /// Payloads whose window elapsed before they were collected.
    ready: Vec<(K, Slot<V>)>,
}

impl<K: Eq + Hash + Clone, V> Debouncer<K, V> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            slots: HashMap::new(),
            ready: Vec::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedule `payload` for `key`, firing once `window` passes without
    /// another schedule for the same key.
    ///
    /// Returns true if a payload still inside its window was superseded.
    /// A payload whose window already elapsed is kept for the next
    /// [`take_due`](Self::take_due) rather than dropped.
    pub fn schedule(&mut self, key: K, payload: V, now: Instant) -> bool {
        let deadline = now + self.window;
        match self.slots.insert(key.clone(), Slot { deadline, payload }) {
            Some(previous) if previous.deadline <= now => {
                self.ready.push((key, previous));
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Drop anything pending for `key` without firing it.
    ///
    /// Returns the discarded slot payload, if any.
    pub fn cancel(&mut self, key: &K) -> Option<V> {
        self.ready.retain(|(k, _)| k != key);
        self.slots.remove(key).map(|slot| slot.payload)
    }

    /// Drop everything without firing.
    pub fn clear(&mut self) {
        self.ready.clear();
        self.slots.clear();
    }

    /// Collect every payload whose window has elapsed at `now`.
    ///
    /// Payloads for the same key come out in scheduling order.
    pub fn take_due(&mut self, now: Instant) -> Vec<(K, V)> {
        let mut due: Vec<(K, V)> = std::mem::take(&mut self.ready)
            .into_iter()
            .map(|(key, slot)| (key, slot.payload))
            .collect();

        let expired: Vec<K> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();

        for key in expired {
            if let Some(slot) = self.slots.remove(&key) {
                due.push((key, slot.payload));
            }
        }
        due
    }

    /// Take whatever is pending for `key` immediately, due or not.
    pub fn take_now(&mut self, key: &K) -> Vec<V> {
        let mut out = Vec::new();
        let mut kept = Vec::with_capacity(self.ready.len());
        for (k, slot) in self.ready.drain(..) {
            if &k == key {
                out.push(slot.payload);
            } else {
                kept.push((k, slot));
            }
        }
        self.ready = kept;
        if let Some(slot) = self.slots.remove(key) {
            out.push(slot.payload);
        }
        out
    }

    /// The earliest instant at which something becomes due.
    ///
    /// Already-elapsed payloads make this return a past deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots
            .values()
            .chain(self.ready.iter().map(|(_, slot)| slot))
            .map(|slot| slot.deadline)
            .min()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.slots.contains_key(key) || self.ready.iter().any(|(k, _)| k == key)
    }

    /// Number of payloads waiting to fire.
    pub fn len(&self) -> usize {
        self.slots.len() + self.ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty() && self.ready.is_empty()
    }
}
