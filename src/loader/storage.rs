/*!
 * Loader-Local Storage
 *
 * Caller-defined metadata attached to a loader: a concurrent map created
 * once and living for the loader's lifetime. Access is read-mostly and the
 * map takes no part in delegation calls, so it is never involved in the
 * deadlock hazard.
 */

use ahash::RandomState;
use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;

/// Shared value slot; callers downcast to their own types.
pub type StoredValue = Arc<dyn Any + Send + Sync>;

/// Concurrent key-value store scoped to one loader.
pub struct LocalStorage {
    map: DashMap<String, StoredValue, RandomState>,
}

impl LocalStorage {
    pub(crate) fn new() -> Self {
        Self {
            map: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Store a value, returning the previous one under the same key.
    pub fn insert(&self, key: impl Into<String>, value: StoredValue) -> Option<StoredValue> {
        self.map.insert(key.into(), value)
    }

    /// Fetch a value as stored.
    pub fn get(&self, key: &str) -> Option<StoredValue> {
        self.map.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Fetch a value downcast to a concrete type; `None` when absent or of
    /// another type.
    pub fn get_as<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.get(key).and_then(|value| value.downcast::<T>().ok())
    }

    /// Remove a value, returning it.
    pub fn remove(&self, key: &str) -> Option<StoredValue> {
        self.map.remove(key).map(|(_, value)| value)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
