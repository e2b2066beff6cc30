//! Hand-written `ChatPlatform` fake shared by the unit tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::{
    domain::{ChatId, MemberRole, Membership, MessageId, UserId},
    errors::Error,
    ports::ChatPlatform,
    Result,
};

pub(crate) const BOT_ID: UserId = UserId(42);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DeleteBehavior {
    Ok,
    Forbidden,
    NotFound,
    Hang,
}

pub(crate) struct FakePlatform {
    can_delete: Mutex<HashMap<ChatId, bool>>,
    membership_fails: AtomicBool,
    membership_delay: Mutex<Duration>,
    held: Mutex<HashMap<ChatId, Arc<Notify>>>,
    delete_behavior: Mutex<DeleteBehavior>,
    reply_fails: AtomicBool,

    self_id_calls: AtomicUsize,
    membership_calls: Mutex<Vec<ChatId>>,
    deletes: Mutex<Vec<(ChatId, MessageId)>>,
    replies: Mutex<Vec<(ChatId, String)>>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            can_delete: Mutex::new(HashMap::new()),
            membership_fails: AtomicBool::new(false),
            membership_delay: Mutex::new(Duration::ZERO),
            held: Mutex::new(HashMap::new()),
            delete_behavior: Mutex::new(DeleteBehavior::Ok),
            reply_fails: AtomicBool::new(false),
            self_id_calls: AtomicUsize::new(0),
            membership_calls: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            replies: Mutex::new(Vec::new()),
        }
    }
}

impl FakePlatform {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn set_can_delete(&self, chat_id: ChatId, can_delete: bool) {
        self.can_delete.lock().unwrap().insert(chat_id, can_delete);
    }

    pub(crate) fn set_membership_fails(&self, fails: bool) {
        self.membership_fails.store(fails, Ordering::SeqCst);
    }

    pub(crate) fn set_membership_delay(&self, delay: Duration) {
        *self.membership_delay.lock().unwrap() = delay;
    }

    /// Membership lookups for `chat_id` park until the returned notify fires.
    pub(crate) fn hold_membership(&self, chat_id: ChatId) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.held.lock().unwrap().insert(chat_id, notify.clone());
        notify
    }

    pub(crate) fn set_delete_behavior(&self, behavior: DeleteBehavior) {
        *self.delete_behavior.lock().unwrap() = behavior;
    }

    pub(crate) fn set_reply_fails(&self, fails: bool) {
        self.reply_fails.store(fails, Ordering::SeqCst);
    }

    pub(crate) fn membership_calls(&self) -> usize {
        self.membership_calls.lock().unwrap().len()
    }

    pub(crate) fn membership_calls_for(&self, chat_id: ChatId) -> usize {
        self.membership_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == chat_id)
            .count()
    }

    pub(crate) fn self_id_calls(&self) -> usize {
        self.self_id_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn deletes(&self) -> Vec<(ChatId, MessageId)> {
        self.deletes.lock().unwrap().clone()
    }

    pub(crate) fn replies(&self) -> Vec<(ChatId, String)> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn self_id(&self) -> Result<UserId> {
        self.self_id_calls.fetch_add(1, Ordering::SeqCst);
        Ok(BOT_ID)
    }

    async fn membership(&self, chat_id: ChatId, user_id: UserId) -> Result<Membership> {
        assert_eq!(user_id, BOT_ID);
        self.membership_calls.lock().unwrap().push(chat_id);

        let held = self.held.lock().unwrap().get(&chat_id).cloned();
        if let Some(notify) = held {
            notify.notified().await;
        }
        let delay = *self.membership_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.membership_fails.load(Ordering::SeqCst) {
            return Err(Error::RemoteUnavailable("fake outage".to_string()));
        }

        let can_delete = self
            .can_delete
            .lock()
            .unwrap()
            .get(&chat_id)
            .copied()
            .unwrap_or(false);
        Ok(Membership {
            role: if can_delete {
                MemberRole::Administrator
            } else {
                MemberRole::Member
            },
            can_delete_messages: can_delete,
        })
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        self.deletes.lock().unwrap().push((chat_id, message_id));
        let behavior = *self.delete_behavior.lock().unwrap();
        match behavior {
            DeleteBehavior::Ok => Ok(()),
            DeleteBehavior::Forbidden => Err(Error::DeletePermission(
                "message can't be deleted".to_string(),
            )),
            DeleteBehavior::NotFound => Err(Error::DeleteOther(
                "message to delete not found".to_string(),
            )),
            DeleteBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    async fn reply(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.replies
            .lock()
            .unwrap()
            .push((chat_id, text.to_string()));
        if self.reply_fails.load(Ordering::SeqCst) {
            return Err(Error::Reply("fake reply failure".to_string()));
        }
        Ok(())
    }
}
