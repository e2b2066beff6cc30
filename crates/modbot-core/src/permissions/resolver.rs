use std::{future::Future, sync::Arc, time::Duration};

use crate::{
    domain::{ChatId, Membership, PermissionRecord},
    errors::Error,
    permissions::PermissionCache,
    ports::ChatPlatform,
    sync::KeyedLocks,
    Result,
};

/// TTL and timeout knobs for permission resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PermissionPolicy {
    /// How long a confirmed delete capability is trusted.
    pub granted_ttl: Duration,
    /// How long a missing capability is trusted (short, so a newly granted
    /// admin right is picked up quickly).
    pub denied_ttl: Duration,
    /// Upper bound for each remote call.
    pub remote_timeout: Duration,
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self {
            granted_ttl: Duration::from_secs(3600),
            denied_ttl: Duration::from_secs(30),
            remote_timeout: Duration::from_secs(10),
        }
    }
}

impl PermissionPolicy {
    pub fn ttl_for(&self, record: PermissionRecord) -> Duration {
        if record.can_delete {
            self.granted_ttl
        } else {
            self.denied_ttl
        }
    }
}

/// Resolves the bot's delete capability per chat, cache first.
///
/// Misses for the same chat are single-flight: concurrent callers queue on a
/// per-chat lock and the ones behind the first re-read the freshly written
/// entry instead of calling the platform again. Different chats never wait on
/// each other.
pub struct PermissionResolver {
    platform: Arc<dyn ChatPlatform>,
    cache: PermissionCache,
    locks: KeyedLocks<ChatId>,
    policy: PermissionPolicy,
}

impl PermissionResolver {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        cache: PermissionCache,
        policy: PermissionPolicy,
    ) -> Self {
        Self {
            platform,
            cache,
            locks: KeyedLocks::new(),
            policy,
        }
    }

    pub fn policy(&self) -> PermissionPolicy {
        self.policy
    }

    pub fn cache(&self) -> &PermissionCache {
        &self.cache
    }

    pub async fn resolve(&self, chat_id: ChatId) -> Result<PermissionRecord> {
        if let Some(record) = self.cache.get(chat_id).await {
            tracing::debug!(
                chat_id = chat_id.0,
                can_delete = record.can_delete,
                "permission cache hit"
            );
            return Ok(record);
        }

        let _guard = self.locks.lock(chat_id).await;

        // Another task may have resolved this chat while we waited.
        if let Some(record) = self.cache.get(chat_id).await {
            tracing::debug!(chat_id = chat_id.0, "permission resolved by concurrent lookup");
            return Ok(record);
        }

        let membership = self.fetch_membership(chat_id).await?;
        let record = PermissionRecord {
            can_delete: membership.can_delete_messages,
        };
        let ttl = self.policy.ttl_for(record);
        self.cache.put(chat_id, record, ttl).await;

        tracing::debug!(
            chat_id = chat_id.0,
            role = ?membership.role,
            can_delete = record.can_delete,
            ttl_secs = ttl.as_secs(),
            "permission resolved"
        );
        Ok(record)
    }

    pub async fn invalidate(&self, chat_id: ChatId) {
        self.cache.invalidate(chat_id).await;
    }

    /// Reclaim expired cache entries and idle per-chat locks.
    pub async fn sweep(&self) -> (usize, usize) {
        let entries = self.cache.purge_expired().await;
        let locks = self.locks.prune().await;
        (entries, locks)
    }

    async fn fetch_membership(&self, chat_id: ChatId) -> Result<Membership> {
        let bot_id = self.bounded("getMe", self.platform.self_id()).await?;
        self.bounded("getChatMember", self.platform.membership(chat_id, bot_id))
            .await
    }

    async fn bounded<T>(&self, what: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.policy.remote_timeout, fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(Error::RemoteUnavailable(msg))) => Err(Error::RemoteUnavailable(msg)),
            Ok(Err(other)) => Err(Error::RemoteUnavailable(format!("{what}: {other}"))),
            Err(_) => Err(Error::RemoteUnavailable(format!(
                "{what} timed out after {:?}",
                self.policy.remote_timeout
            ))),
        }
    }
}
