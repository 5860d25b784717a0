use std::sync::Arc;

use async_trait::async_trait;
use esquie_core::ChatPlatform;
use esquie_core::message::{ChannelId, ChatMessage, MessageId, SentMessage};
use esquie_core::platform::Result;
use serenity::builder::{CreateMessage, EditMessage};
use serenity::http::Http;
use serenity::model::id;
use tracing::debug;

use crate::convert;
use crate::error::classify;

/// [`ChatPlatform`] over serenity's REST client
#[derive(Clone)]
pub struct SerenityPlatform {
    http: Arc<Http>,
}

impl SerenityPlatform {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

fn channel(channel: ChannelId) -> id::ChannelId {
    id::ChannelId::new(channel.0)
}

fn message(message: MessageId) -> id::MessageId {
    id::MessageId::new(message.0)
}

#[async_trait]
impl ChatPlatform for SerenityPlatform {
    async fn fetch_message(&self, channel_id: ChannelId, id: MessageId) -> Result<ChatMessage> {
        let fetched = channel(channel_id)
            .message(self.http.as_ref(), message(id))
            .await
            .map_err(|e| classify(e, "fetch message", Some(id.0)))?;
        Ok(convert::chat_message(&fetched))
    }

    async fn reply(&self, to: &ChatMessage, content: &str) -> Result<SentMessage> {
        let builder = CreateMessage::new()
            .content(content)
            .reference_message((channel(to.channel_id), message(to.id)));

        let sent = channel(to.channel_id)
            .send_message(self.http.as_ref(), builder)
            .await
            .map_err(|e| classify(e, "reply", None))?;
        Ok(convert::sent_message(&sent))
    }

    async fn send(&self, channel_id: ChannelId, content: &str) -> Result<SentMessage> {
        let sent = channel(channel_id)
            .send_message(self.http.as_ref(), CreateMessage::new().content(content))
            .await
            .map_err(|e| classify(e, "send message", None))?;
        Ok(convert::sent_message(&sent))
    }

    async fn edit(&self, sent: SentMessage, content: &str) -> Result<()> {
        channel(sent.channel_id)
            .edit_message(
                self.http.as_ref(),
                message(sent.id),
                EditMessage::new().content(content),
            )
            .await
            .map_err(|e| classify(e, "edit message", Some(sent.id.0)))?;
        Ok(())
    }

    async fn delete(&self, channel_id: ChannelId, id: MessageId) -> Result<()> {
        channel(channel_id)
            .delete_message(self.http.as_ref(), message(id))
            .await
            .map_err(|e| classify(e, "delete message", Some(id.0)))
    }

    async fn start_typing(&self, channel_id: ChannelId) {
        if let Err(e) = channel(channel_id).broadcast_typing(self.http.as_ref()).await {
            debug!(channel_id = %channel_id, error = %e, "typing indicator failed");
        }
    }
}
