//! Keyed caches with per-key build-once slots
//!
//! The table lock is only held long enough to find or create a key's slot;
//! builds run under the slot's own lock. Two threads asking for the same new
//! key build once, unrelated keys build in parallel. A failed build leaves the
//! slot empty so the next caller retries.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

/// One cache entry: empty until a build succeeds
pub type Slot<V> = Arc<Mutex<Option<Arc<V>>>>;

/// Lock a mutex, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub struct OnceMap<K, V> {
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> Default for OnceMap<K, V> {
    fn default() -> Self {
        Self { slots: Mutex::new(HashMap::new()) }
    }
}

impl<K: Eq + Hash + Clone, V> OnceMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the slot for `key`, creating an empty one if needed
    pub fn slot(&self, key: &K) -> Slot<V> {
        let mut slots = lock(&self.slots);
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Return the cached value, or build and store it
    ///
    /// # Errors
    /// Propagates the build error; nothing is stored in that case
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &K,
        build: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        let slot = self.slot(key);
        let mut entry = lock(&slot);
        if let Some(value) = entry.as_ref() {
            return Ok(Arc::clone(value));
        }
        match build() {
            Ok(value) => {
                let value = Arc::new(value);
                *entry = Some(Arc::clone(&value));
                Ok(value)
            }
            Err(e) => {
                drop(entry);
                self.discard_if_empty(key, &slot);
                Err(e)
            }
        }
    }

    /// Drop `slot` from the table if it is still the slot for `key` and holds
    /// no value. A slot another caller is building into is left alone.
    pub fn discard_if_empty(&self, key: &K, slot: &Slot<V>) {
        let mut slots = lock(&self.slots);
        if !slots.get(key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            return;
        }
        let empty = match slot.try_lock() {
            Ok(entry) => entry.is_none(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().is_none(),
            Err(TryLockError::WouldBlock) => false,
        };
        if empty {
            slots.remove(key);
        }
    }

    /// Cached value, if a build for `key` has succeeded
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let slot = lock(&self.slots).get(key).cloned()?;
        let entry = lock(&slot);
        entry.clone()
    }

    /// Drop the entry for `key`; returns whether a value was cached
    pub fn remove(&self, key: &K) -> bool {
        let Some(slot) = lock(&self.slots).remove(key) else {
            return false;
        };
        let had_value = lock(&slot).is_some();
        had_value
    }

    pub fn clear(&self) {
        lock(&self.slots).clear();
    }

    /// Number of keys holding a value
    pub fn len(&self) -> usize {
        let slots: Vec<Slot<V>> = lock(&self.slots).values().cloned().collect();
        slots.iter().filter(|slot| lock(slot).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of keys with a slot, empty or not
    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        lock(&self.slots).len()
    }
}
