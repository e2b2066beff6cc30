use async_trait::async_trait;

use crate::{
    domain::{ChatId, Membership, MessageId, UserId},
    Result,
};

/// Hexagonal port for the chat platform.
///
/// Telegram is the only implementation today. Implementations map transport
/// failures into the core error taxonomy:
/// - `self_id` / `membership`: `Error::RemoteUnavailable`
/// - `delete_message`: `Error::DeletePermission` or `Error::DeleteOther`
/// - `reply`: `Error::Reply`
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// The bot's own user id. Implementations may cache it.
    async fn self_id(&self) -> Result<UserId>;

    async fn membership(&self, chat_id: ChatId, user_id: UserId) -> Result<Membership>;

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()>;

    async fn reply(&self, chat_id: ChatId, text: &str) -> Result<()>;
}
