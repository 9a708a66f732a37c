//! Keyed mutual exclusion for the recompute stages.
//!
//! The engine keeps two of these: one keyed by (student, scope) around each
//! read-compute-write of a derived row, and one keyed by (cohort, scope)
//! around each rank pass. Batches on disjoint keys run freely, and no caller
//! holds two guards at once.

use std::{
  collections::HashMap,
  hash::Hash,
  sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::OwnedMutexGuard;

type Slot = Arc<tokio::sync::Mutex<()>>;

#[derive(Debug)]
pub struct KeyedLocks<K> {
  slots: Mutex<HashMap<K, Slot>>,
}

impl<K> Default for KeyedLocks<K> {
  fn default() -> Self { Self { slots: Mutex::new(HashMap::new()) } }
}

impl<K: Eq + Hash> KeyedLocks<K> {
  /// Wait for exclusive access to `key`. The lock is released when the
  /// guard drops.
  pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
    let slot = {
      let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
      // Slots nobody holds or waits on are only referenced by the map.
      slots.retain(|_, slot| Arc::strong_count(slot) > 1);
      slots.entry(key).or_default().clone()
    };
    slot.lock_owned().await
  }
}
