//! Telegram update handlers.
//!
//! Converts a teloxide `Message` into the core `InboundMessage`, serializes
//! processing per chat and runs the moderation pipeline. Failures are logged
//! by the pipeline; the handler itself never fails an update.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use modbot_core::domain::{ChatId, ChatKind, InboundMessage, MessageId};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let inbound = to_inbound(&msg);

    // Keep per-chat delivery order for moderation decisions.
    let _guard = state.chat_locks.lock(inbound.chat_id).await;
    let outcome = state.pipeline.handle(&inbound).await;

    tracing::debug!(
        chat_id = inbound.chat_id.0,
        message_id = inbound.message_id.0,
        ?outcome,
        "message moderated"
    );
    Ok(())
}

fn to_inbound(msg: &Message) -> InboundMessage {
    InboundMessage {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        chat_kind: chat_kind(msg.chat.is_private()),
        sender_is_bot: msg.from().map(|u| u.is_bot).unwrap_or(false),
        text: msg.text().map(str::to_string),
    }
}

fn chat_kind(is_private: bool) -> ChatKind {
    if is_private {
        ChatKind::Private
    } else {
        ChatKind::Group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(json: serde_json::Value) -> Message {
        serde_json::from_value(json).expect("valid Message fixture")
    }

    #[test]
    fn group_text_from_bot_is_mapped() {
        let msg = message(serde_json::json!({
            "message_id": 17,
            "date": 1_700_000_000,
            "chat": { "id": -1001234, "type": "supergroup", "title": "room" },
            "from": { "id": 7, "is_bot": true, "first_name": "helper" },
            "text": "Hello SPAM"
        }));

        let inbound = to_inbound(&msg);
        assert_eq!(inbound.chat_id, ChatId(-1001234));
        assert_eq!(inbound.message_id, MessageId(17));
        assert_eq!(inbound.chat_kind, ChatKind::Group);
        assert!(inbound.sender_is_bot);
        assert_eq!(inbound.text.as_deref(), Some("Hello SPAM"));
    }

    #[test]
    fn private_photo_has_no_text() {
        let msg = message(serde_json::json!({
            "message_id": 3,
            "date": 1_700_000_000,
            "chat": { "id": 55, "type": "private", "first_name": "ann" },
            "from": { "id": 55, "is_bot": false, "first_name": "ann" },
            "photo": [{
                "file_id": "f",
                "file_unique_id": "u",
                "file_size": 10,
                "width": 1,
                "height": 1
            }]
        }));

        let inbound = to_inbound(&msg);
        assert_eq!(inbound.chat_id, ChatId(55));
        assert_eq!(inbound.chat_kind, ChatKind::Private);
        assert!(!inbound.sender_is_bot);
        assert_eq!(inbound.text, None);
    }

    #[test]
    fn only_private_chats_are_private() {
        assert_eq!(chat_kind(true), ChatKind::Private);
        assert_eq!(chat_kind(false), ChatKind::Group);
    }
}
