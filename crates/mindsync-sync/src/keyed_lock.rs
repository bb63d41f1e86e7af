//! Per-key async locking
//!
//! [`KeyedLock`] hands out one async mutex per key so that operations on
//! the same entity id run one at a time while different ids proceed in
//! parallel. Mutexes are created on first use and dropped from the map as
//! soon as nobody holds or waits for them.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap<K> = Arc<DashMap<K, Arc<Mutex<()>>>>;

/// A set of async mutexes indexed by key
pub struct KeyedLock<K>
where
    K: Eq + Hash + Clone,
{
    locks: LockMap<K>,
}

impl<K> KeyedLock<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Waits until `key` is free and returns a guard holding it
    ///
    /// Dropping the returned future while it waits releases its claim on
    /// the map entry just like dropping the guard does.
    pub async fn lock(&self, key: K) -> KeyGuard<K> {
        let mutex = Arc::clone(self.locks.entry(key.clone()).or_default().value());
        // Declared before the acquire so it is dropped after the waiting
        // future and sees the final reference count.
        let slot = KeySlot {
            locks: Arc::clone(&self.locks),
            key,
        };
        let guard = mutex.lock_owned().await;

        KeyGuard {
            guard: Some(guard),
            slot,
        }
    }

    /// Number of keys currently held or waited on
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K> Default for KeyedLock<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Claim on a map entry held by a waiter or a guard
///
/// Removes the entry on drop once the map holds the only reference.
struct KeySlot<K>
where
    K: Eq + Hash + Clone,
{
    locks: LockMap<K>,
    key: K,
}

impl<K> Drop for KeySlot<K>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Exclusive hold on one key; released on drop
pub struct KeyGuard<K>
where
    K: Eq + Hash + Clone,
{
    guard: Option<OwnedMutexGuard<()>>,
    slot: KeySlot<K>,
}

impl<K> Drop for KeyGuard<K>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        // Release before `slot` is dropped so the map entry is the only
        // remaining reference when nobody else is waiting.
        drop(self.guard.take());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_entry_removed_after_release() {
        let locks = KeyedLock::new();
        {
            let _guard = locks.lock("a").await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_same_key_is_serialized() {
        let locks = Arc::new(KeyedLock::new());
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let active = Arc::clone(&active);
            let max_active = Arc::clone(&max_active);
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock("same").await;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_active.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLock::new();
        let _a = locks.lock(1).await;

        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock(2)).await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_aborted_waiter_leaves_no_entry() {
        let locks = Arc::new(KeyedLock::new());
        let holder = locks.lock("a").await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("a").await;
            })
        };
        // Let the waiter queue up behind the holder
        tokio::task::yield_now().await;

        drop(holder);
        waiter.abort();
        let _ = waiter.await;

        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_timed_out_waiter_leaves_no_entry() {
        let locks = KeyedLock::new();
        {
            let _holder = locks.lock("a").await;
            let waited = tokio::time::timeout(Duration::from_millis(10), locks.lock("a")).await;
            assert!(waited.is_err());
        }
        assert!(locks.is_empty());

        // The key is usable again afterwards
        let _guard = locks.lock("a").await;
        assert_eq!(locks.len(), 1);
    }
}
