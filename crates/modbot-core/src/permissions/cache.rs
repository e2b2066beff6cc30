use std::{collections::HashMap, time::Duration};

use tokio::{sync::Mutex, time::Instant};

use crate::domain::{ChatId, PermissionRecord};

/// Deadline used when `now + ttl` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

#[derive(Clone, Copy, Debug)]
struct CacheEntry {
    record: PermissionRecord,
    deadline: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.deadline
    }
}

/// In-memory `ChatId -> PermissionRecord` map with a per-entry deadline.
///
/// Expiry is passive: a lookup past the deadline behaves like a miss and
/// drops the entry. Entries are never mutated in place, only replaced.
#[derive(Debug, Default)]
pub struct PermissionCache {
    entries: Mutex<HashMap<ChatId, CacheEntry>>,
    capacity: Option<usize>,
}

impl PermissionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the number of entries. On overflow, expired entries go first,
    /// then the entry closest to its deadline.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: Some(capacity.max(1)),
        }
    }

    pub async fn get(&self, chat_id: ChatId) -> Option<PermissionRecord> {
        self.get_at(chat_id, Instant::now()).await
    }

    pub async fn get_at(&self, chat_id: ChatId, now: Instant) -> Option<PermissionRecord> {
        let mut map = self.entries.lock().await;
        match map.get(&chat_id) {
            Some(entry) if entry.is_live(now) => Some(entry.record),
            Some(_) => {
                map.remove(&chat_id);
                None
            }
            None => None,
        }
    }

    pub async fn put(&self, chat_id: ChatId, record: PermissionRecord, ttl: Duration) {
        self.put_at(chat_id, record, ttl, Instant::now()).await
    }

    pub async fn put_at(
        &self,
        chat_id: ChatId,
        record: PermissionRecord,
        ttl: Duration,
        now: Instant,
    ) {
        let mut map = self.entries.lock().await;

        if let Some(cap) = self.capacity {
            if !map.contains_key(&chat_id) && map.len() >= cap {
                map.retain(|_, e| e.is_live(now));
                if map.len() >= cap {
                    let victim = map
                        .iter()
                        .min_by_key(|(_, e)| e.deadline)
                        .map(|(id, _)| *id);
                    if let Some(id) = victim {
                        map.remove(&id);
                    }
                }
            }
        }

        let deadline = now
            .checked_add(ttl)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        map.insert(chat_id, CacheEntry { record, deadline });
    }

    pub async fn invalidate(&self, chat_id: ChatId) {
        self.entries.lock().await.remove(&chat_id);
    }

    /// Drop every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now()).await
    }

    pub async fn purge_expired_at(&self, now: Instant) -> usize {
        let mut map = self.entries.lock().await;
        let before = map.len();
        map.retain(|_, e| e.is_live(now));
        before - map.len()
    }

    /// Number of stored entries, expired ones included until reclaimed.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
