//! Backing store interface
//!
//! The persistent key-value service that preferences and statistics live in.
//! Keys are arbitrary strings and values are arbitrary JSON; there is no
//! schema enforcement at this layer.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};

/// A batch of key/value pairs as read from or written to a backing store.
pub type Entries = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("backing store unavailable: {0}")]
    Unavailable(String),
    #[error("quota exceeded: the store holds at most {max_items} items")]
    QuotaExceeded { max_items: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("corrupt store file {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
    #[error("stored '{key}' is malformed: {reason}")]
    Malformed { key: String, reason: String },
}

/// Asynchronous key-value store shared by every surface.
///
/// Writes are last-write-wins per key. A multi-key `set` is not a
/// transaction: an implementation may apply some entries and then fail.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Fetch the given keys. Keys with no stored value are absent from the result.
    async fn get(&self, names: &[&str]) -> Result<Entries, StoreError>;

    /// Store every entry, overwriting existing values.
    async fn set(&self, entries: Entries) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: BackingStore + ?Sized> BackingStore for Arc<T> {
    async fn get(&self, names: &[&str]) -> Result<Entries, StoreError> {
        (**self).get(names).await
    }

    async fn set(&self, entries: Entries) -> Result<(), StoreError> {
        (**self).set(entries).await
    }
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, Value>,
    outage: Option<String>,
}

/// Process-local backing store.
///
/// Supports an item quota and simulated outages so callers can exercise the
/// failure paths of the stores layered on top of it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    max_items: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of distinct keys the store will hold.
    pub fn with_quota(max_items: usize) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            max_items: Some(max_items),
        }
    }

    /// Seed the store with raw entries.
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let store = Self::new();
        store
            .state
            .lock()
            .entries
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v)));
        store
    }

    /// Make every following call fail with `StoreError::Unavailable`.
    pub fn fail_with(&self, reason: impl Into<String>) {
        self.state.lock().outage = Some(reason.into());
    }

    /// End a simulated outage.
    pub fn restore(&self) {
        self.state.lock().outage = None;
    }

    /// Raw value under `key`, bypassing the outage flag.
    pub fn raw(&self, key: &str) -> Option<Value> {
        self.state.lock().entries.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BackingStore for MemoryStore {
    async fn get(&self, names: &[&str]) -> Result<Entries, StoreError> {
        let state = self.state.lock();
        if let Some(reason) = &state.outage {
            return Err(StoreError::Unavailable(reason.clone()));
        }
        Ok(names
            .iter()
            .filter_map(|name| {
                state
                    .entries
                    .get(*name)
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect())
    }

    async fn set(&self, entries: Entries) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if let Some(reason) = &state.outage {
            return Err(StoreError::Unavailable(reason.clone()));
        }
        // Entries are applied in key order; a quota failure keeps the ones already written.
        for (key, value) in entries {
            if let Some(max_items) = self.max_items {
                if !state.entries.contains_key(&key) && state.entries.len() >= max_items {
                    return Err(StoreError::QuotaExceeded { max_items });
                }
            }
            state.entries.insert(key, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entries(pairs: &[(&str, Value)]) -> Entries {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_get_returns_only_present_keys() {
        let store = MemoryStore::with_entries([("opacity", json!(50)), ("stale", json!(1))]);
        let got = smol::block_on(store.get(&["opacity", "theme"])).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got["opacity"], json!(50));
    }

    #[test]
    fn test_set_is_last_write_wins() {
        let store = MemoryStore::new();
        smol::block_on(async {
            store.set(entries(&[("theme", json!("dark"))])).await.unwrap();
            store.set(entries(&[("theme", json!("neon"))])).await.unwrap();
        });
        assert_eq!(store.raw("theme"), Some(json!("neon")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_quota_failure_keeps_earlier_entries() {
        let store = MemoryStore::with_quota(2);
        let batch = entries(&[("a", json!(1)), ("b", json!(2)), ("c", json!(3))]);

        let err = smol::block_on(store.set(batch)).unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { max_items: 2 }));
        assert_eq!(store.len(), 2);
        assert_eq!(store.raw("c"), None);

        // Overwriting an existing key does not count against the quota.
        smol::block_on(store.set(entries(&[("a", json!(10))]))).unwrap();
        assert_eq!(store.raw("a"), Some(json!(10)));
    }

    #[test]
    fn test_batch_applies_in_key_order() {
        let store = MemoryStore::with_quota(1);
        let batch = entries(&[("zeta", json!(1)), ("alpha", json!(2))]);

        assert!(smol::block_on(store.set(batch)).is_err());
        assert_eq!(store.raw("alpha"), Some(json!(2)));
        assert_eq!(store.raw("zeta"), None);
    }

    #[test]
    fn test_outage_fails_reads_and_writes() {
        let store = MemoryStore::with_entries([("opacity", json!(50))]);
        store.fail_with("offline");

        let read = smol::block_on(store.get(&["opacity"]));
        assert!(matches!(read, Err(StoreError::Unavailable(ref r)) if r == "offline"));
        let write = smol::block_on(store.set(entries(&[("opacity", json!(1))])));
        assert!(write.is_err());
        assert_eq!(store.raw("opacity"), Some(json!(50)));

        store.restore();
        assert!(smol::block_on(store.get(&["opacity"])).is_ok());
    }

    #[test]
    fn test_shared_through_arc() {
        let store = Arc::new(MemoryStore::new());
        let other = Arc::clone(&store);
        smol::block_on(other.set(entries(&[("ambientMode", json!(true))]))).unwrap();
        let got = smol::block_on(store.get(&["ambientMode"])).unwrap();
        assert_eq!(got["ambientMode"], json!(true));
    }
}
