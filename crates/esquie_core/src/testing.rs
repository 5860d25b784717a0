//! In-memory chat platform for unit tests

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::PlatformError;
use crate::message::{Author, BotIdentity, ChannelId, ChatMessage, MessageId, SentMessage, UserId};
use crate::platform::{ChatPlatform, Result};

pub const BOT_ID: u64 = 1000;
pub const USER_ID: u64 = 7;
pub const CHANNEL: ChannelId = ChannelId(55);

pub fn bot() -> BotIdentity {
    BotIdentity::new(BOT_ID, "Esquie")
}

pub fn bot_author() -> Author {
    Author {
        id: UserId(BOT_ID),
        display_name: "Esquie".to_string(),
        bot: true,
    }
}

pub fn user_author(id: u64) -> Author {
    Author {
        id: UserId(id),
        display_name: format!("user{id}"),
        bot: false,
    }
}

pub fn user_message(
    id: u64,
    content: &str,
    reference: Option<MessageId>,
    mentions_bot: bool,
) -> ChatMessage {
    ChatMessage {
        id: MessageId(id),
        channel_id: CHANNEL,
        author: user_author(USER_ID),
        content: content.to_string(),
        reference,
        mentions: if mentions_bot { vec![bot_author()] } else { vec![] },
        attachments: vec![],
    }
}

pub fn bot_message(id: u64, content: &str, reference: Option<MessageId>) -> ChatMessage {
    ChatMessage {
        id: MessageId(id),
        channel_id: CHANNEL,
        author: bot_author(),
        content: content.to_string(),
        reference,
        mentions: vec![],
        attachments: vec![],
    }
}

/// A recorded outbound platform call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Reply { to: MessageId, content: String },
    Send { channel: ChannelId, content: String },
    Edit { message: MessageId, content: String },
    Delete { message: MessageId },
}

#[derive(Default)]
pub struct FakePlatform {
    pub messages: Mutex<HashMap<MessageId, ChatMessage>>,
    pub calls: Mutex<Vec<Call>>,
    pub fetches: AtomicUsize,
    pub next_id: AtomicU64,
    pub fail_reply: Option<PlatformError>,
    pub fail_send: Option<PlatformError>,
    pub fail_edit: Option<PlatformError>,
    pub fail_delete: Option<PlatformError>,
}

impl FakePlatform {
    pub fn insert(&self, message: ChatMessage) {
        self.messages.lock().unwrap().insert(message.id, message);
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.messages.lock().unwrap().contains_key(&id)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn sent(&self, channel_id: ChannelId) -> SentMessage {
        SentMessage {
            channel_id,
            id: MessageId(900_000 + self.next_id.fetch_add(1, Ordering::SeqCst)),
        }
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn fetch_message(&self, _channel: ChannelId, id: MessageId) -> Result<ChatMessage> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.messages
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(PlatformError::NotFound { message_id: id.0 })
    }

    async fn reply(&self, to: &ChatMessage, content: &str) -> Result<SentMessage> {
        self.record(Call::Reply {
            to: to.id,
            content: content.to_string(),
        });
        match &self.fail_reply {
            Some(e) => Err(e.clone()),
            None => Ok(self.sent(to.channel_id)),
        }
    }

    async fn send(&self, channel: ChannelId, content: &str) -> Result<SentMessage> {
        self.record(Call::Send {
            channel,
            content: content.to_string(),
        });
        match &self.fail_send {
            Some(e) => Err(e.clone()),
            None => Ok(self.sent(channel)),
        }
    }

    async fn edit(&self, message: SentMessage, content: &str) -> Result<()> {
        self.record(Call::Edit {
            message: message.id,
            content: content.to_string(),
        });
        match &self.fail_edit {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    async fn delete(&self, _channel: ChannelId, id: MessageId) -> Result<()> {
        self.record(Call::Delete { message: id });
        match &self.fail_delete {
            Some(e) => Err(e.clone()),
            None => {
                self.messages.lock().unwrap().remove(&id);
                Ok(())
            }
        }
    }
}
