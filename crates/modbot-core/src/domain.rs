/// Chat id (numeric, negative for groups on Telegram).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Message id, unique within a chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// User id (numeric). The bot's own identity is a `UserId` too.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    /// Groups and supergroups.
    Group,
    /// One-to-one conversation with the bot.
    Private,
}

/// One inbound chat message, as delivered by the transport.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub chat_kind: ChatKind,
    pub sender_is_bot: bool,
    /// `None` for photos, stickers and other non-text payloads.
    pub text: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberRole {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
}

/// The bot's own membership record in a chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Membership {
    pub role: MemberRole,
    pub can_delete_messages: bool,
}

/// The only fact cached per chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PermissionRecord {
    pub can_delete: bool,
}
