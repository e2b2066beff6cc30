//! Per-message moderation decision.
//!
//! Each inbound message runs through a short state machine:
//! private chat -> permission check -> text extraction -> banned-word match ->
//! delete. A delete rejected as forbidden / bad request invalidates the cached
//! permission for the chat and re-runs the permission check once; the message
//! itself is not deleted again.

use std::{future::Future, sync::Arc, time::Duration};

use crate::{
    config::Config,
    domain::{ChatId, ChatKind, InboundMessage, MessageId},
    errors::Error,
    filter::MessageFilter,
    permissions::{PermissionCache, PermissionResolver},
    ports::ChatPlatform,
    Result,
};

pub const PRIVATE_CHAT_NOTICE: &str = "This bot only works in groups.";
pub const NO_PERMISSION_NOTICE: &str = "I don't have permission to delete messages.";

/// What happened to one inbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModerationOutcome {
    PrivateChatRejected,
    PermissionDenied,
    /// Membership lookup failed; nothing was deleted.
    PermissionUnavailable,
    /// No text payload (photo, sticker, ...).
    Ignored,
    NoMatch,
    Deleted,
    /// `recheck` is the result of the one-shot permission recheck, `None` if
    /// no recheck ran or it could not complete.
    DeleteFailed { recheck: Option<bool> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PermissionCheck {
    Granted,
    Denied,
    Unavailable,
}

pub struct ModerationPipeline {
    platform: Arc<dyn ChatPlatform>,
    resolver: PermissionResolver,
    filter: MessageFilter,
}

impl ModerationPipeline {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        resolver: PermissionResolver,
        filter: MessageFilter,
    ) -> Self {
        Self {
            platform,
            resolver,
            filter,
        }
    }

    pub fn from_config(cfg: &Config, platform: Arc<dyn ChatPlatform>) -> Self {
        let cache = match cfg.permission_cache_capacity {
            Some(cap) => PermissionCache::with_capacity_limit(cap),
            None => PermissionCache::new(),
        };
        let resolver = PermissionResolver::new(platform.clone(), cache, cfg.permission_policy());
        Self::new(
            platform,
            resolver,
            MessageFilter::new(cfg.banned_words.clone()),
        )
    }

    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    pub async fn handle(&self, msg: &InboundMessage) -> ModerationOutcome {
        let chat_id = msg.chat_id;

        if msg.chat_kind == ChatKind::Private {
            self.notify(chat_id, PRIVATE_CHAT_NOTICE).await;
            return ModerationOutcome::PrivateChatRejected;
        }

        match self.check_permission(chat_id).await {
            PermissionCheck::Granted => {}
            PermissionCheck::Denied => return ModerationOutcome::PermissionDenied,
            PermissionCheck::Unavailable => return ModerationOutcome::PermissionUnavailable,
        }

        let Some(text) = msg.text.as_deref() else {
            return ModerationOutcome::Ignored;
        };

        if !self.filter.matches(text) {
            tracing::debug!(
                chat_id = chat_id.0,
                message_id = msg.message_id.0,
                "clean message"
            );
            return ModerationOutcome::NoMatch;
        }

        match self.delete(chat_id, msg.message_id).await {
            Ok(()) => {
                tracing::info!(
                    chat_id = chat_id.0,
                    message_id = msg.message_id.0,
                    sender_is_bot = msg.sender_is_bot,
                    "deleted message with banned word"
                );
                ModerationOutcome::Deleted
            }
            Err(e) if e.is_delete_permission() => {
                tracing::warn!(
                    chat_id = chat_id.0,
                    message_id = msg.message_id.0,
                    error = %e,
                    "delete rejected; rechecking permission"
                );
                self.resolver.invalidate(chat_id).await;
                let recheck = match self.check_permission(chat_id).await {
                    PermissionCheck::Granted => Some(true),
                    PermissionCheck::Denied => Some(false),
                    PermissionCheck::Unavailable => None,
                };
                ModerationOutcome::DeleteFailed { recheck }
            }
            Err(e) => {
                tracing::warn!(
                    chat_id = chat_id.0,
                    message_id = msg.message_id.0,
                    error = %e,
                    "delete failed"
                );
                ModerationOutcome::DeleteFailed { recheck: None }
            }
        }
    }

    /// Resolve permission and send the no-permission notice when it is missing.
    /// Lookup failures fail closed without a notice.
    async fn check_permission(&self, chat_id: ChatId) -> PermissionCheck {
        match self.resolver.resolve(chat_id).await {
            Ok(record) if record.can_delete => PermissionCheck::Granted,
            Ok(_) => {
                tracing::debug!(chat_id = chat_id.0, "no delete permission");
                self.notify(chat_id, NO_PERMISSION_NOTICE).await;
                PermissionCheck::Denied
            }
            Err(e) => {
                tracing::warn!(chat_id = chat_id.0, error = %e, "permission check failed");
                PermissionCheck::Unavailable
            }
        }
    }

    async fn delete(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        let timeout = self.remote_timeout();
        bounded(timeout, self.platform.delete_message(chat_id, message_id))
            .await
            .unwrap_or_else(|| {
                Err(Error::DeleteOther(format!(
                    "deleteMessage timed out after {timeout:?}"
                )))
            })
    }

    /// Best-effort notice; failures are logged, never escalated.
    async fn notify(&self, chat_id: ChatId, text: &str) {
        let timeout = self.remote_timeout();
        let res = bounded(timeout, self.platform.reply(chat_id, text))
            .await
            .unwrap_or_else(|| {
                Err(Error::Reply(format!(
                    "sendMessage timed out after {timeout:?}"
                )))
            });
        if let Err(e) = res {
            tracing::warn!(chat_id = chat_id.0, error = %e, "failed to send notice");
        }
    }

    fn remote_timeout(&self) -> Duration {
        self.resolver.policy().remote_timeout
    }
}

async fn bounded<T>(timeout: Duration, fut: impl Future<Output = T>) -> Option<T> {
    tokio::time::timeout(timeout, fut).await.ok()
}
