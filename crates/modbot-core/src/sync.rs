use std::{collections::HashMap, hash::Hash, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lazily created async mutex per key.
///
/// Holders of different keys never contend; holders of the same key are
/// serialized in FIFO order (tokio's mutex is fair).
pub struct KeyedLocks<K> {
    inner: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Copy,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drop locks nobody holds or waits on. Returns how many were removed.
    pub async fn prune(&self) -> usize {
        let mut map = self.inner.lock().await;
        let before = map.len();
        // The map's own Arc is the only reference once no guard or waiter remains.
        map.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - map.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_serialized() {
        let locks = Arc::new(KeyedLocks::<i64>::new());
        let guard = locks.lock(1).await;

        let locks2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = locks2.lock(1).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = KeyedLocks::<i64>::new();
        let _a = locks.lock(1).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock(2)).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn prune_keeps_held_locks() {
        let locks = KeyedLocks::<i64>::new();
        let held = locks.lock(1).await;
        drop(locks.lock(2).await);

        assert_eq!(locks.len().await, 2);
        assert_eq!(locks.prune().await, 1);
        assert_eq!(locks.len().await, 1);

        drop(held);
        assert_eq!(locks.prune().await, 1);
        assert!(locks.is_empty().await);
    }
}
