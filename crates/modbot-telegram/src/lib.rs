//! Telegram adapter (teloxide).
//!
//! This crate implements the `modbot-core` ChatPlatform over the Telegram Bot API.

use async_trait::async_trait;

use teloxide::{prelude::*, types::ChatMemberKind, ApiError, RequestError};

use tokio::sync::OnceCell;

pub mod handlers;
pub mod router;

use modbot_core::{
    domain::{ChatId, MemberRole, Membership, MessageId, UserId},
    errors::Error,
    ports::ChatPlatform,
    Result,
};

#[derive(Clone)]
pub struct TelegramPlatform {
    bot: Bot,
    me: std::sync::Arc<OnceCell<UserId>>,
}

impl TelegramPlatform {
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            me: std::sync::Arc::new(OnceCell::new()),
        }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }
}

/// Owners hold every admin right; non-admin roles carry no delete flag.
/// Left and banned both map to `MemberRole::Left`.
pub(crate) fn membership_from_kind(kind: &ChatMemberKind) -> Membership {
    match kind {
        ChatMemberKind::Owner(_) => Membership {
            role: MemberRole::Owner,
            can_delete_messages: true,
        },
        ChatMemberKind::Administrator(admin) => Membership {
            role: MemberRole::Administrator,
            can_delete_messages: admin.can_delete_messages,
        },
        ChatMemberKind::Member => Membership {
            role: MemberRole::Member,
            can_delete_messages: false,
        },
        ChatMemberKind::Restricted(_) => Membership {
            role: MemberRole::Restricted,
            can_delete_messages: false,
        },
        _ => Membership {
            role: MemberRole::Left,
            can_delete_messages: false,
        },
    }
}

/// Map a failed deleteMessage call onto the core taxonomy.
///
/// Telegram answers 400/403 when the bot may not delete the message; those
/// are treated as permission problems. A message that is already gone, flood
/// control and transport failures are not.
pub(crate) fn classify_delete_error(e: RequestError) -> Error {
    match e {
        RequestError::Api(ApiError::MessageToDeleteNotFound) => {
            Error::DeleteOther(format!("telegram error: {e}"))
        }
        RequestError::Api(_) | RequestError::MigrateToChatId(_) => {
            Error::DeletePermission(format!("telegram error: {e}"))
        }
        other => Error::DeleteOther(format!("telegram error: {other}")),
    }
}

#[async_trait]
impl ChatPlatform for TelegramPlatform {
    async fn self_id(&self) -> Result<UserId> {
        let id = self
            .me
            .get_or_try_init(|| async {
                let me = self
                    .bot
                    .get_me()
                    .await
                    .map_err(|e| Error::RemoteUnavailable(format!("getMe: {e}")))?;
                Ok::<_, Error>(UserId(me.id.0))
            })
            .await?;
        Ok(*id)
    }

    async fn membership(&self, chat_id: ChatId, user_id: UserId) -> Result<Membership> {
        let member = self
            .bot
            .get_chat_member(Self::tg_chat(chat_id), teloxide::types::UserId(user_id.0))
            .await
            .map_err(|e| Error::RemoteUnavailable(format!("getChatMember: {e}")))?;
        Ok(membership_from_kind(&member.kind))
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        self.bot
            .delete_message(Self::tg_chat(chat_id), Self::tg_msg_id(message_id))
            .await
            .map_err(classify_delete_error)?;
        Ok(())
    }

    async fn reply(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.bot
            .send_message(Self::tg_chat(chat_id), text.to_string())
            .await
            .map_err(|e| Error::Reply(format!("telegram error: {e}")))?;
        Ok(())
    }
}
