use async_trait::async_trait;

use crate::error::PlatformError;
use crate::message::{ChannelId, ChatMessage, MessageId, SentMessage};

pub type Result<T> = std::result::Result<T, PlatformError>;

/// The chat operations the bot needs from its transport.
///
/// Implemented over serenity's HTTP client in `esquie-discord`.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Fetch a single message by id.
    async fn fetch_message(&self, channel: ChannelId, id: MessageId) -> Result<ChatMessage>;

    /// Post `content` as a reply to `to`.
    async fn reply(&self, to: &ChatMessage, content: &str) -> Result<SentMessage>;

    /// Post `content` to a channel without a reply reference.
    async fn send(&self, channel: ChannelId, content: &str) -> Result<SentMessage>;

    /// Replace the content of a message the bot posted earlier.
    async fn edit(&self, message: SentMessage, content: &str) -> Result<()>;

    async fn delete(&self, channel: ChannelId, id: MessageId) -> Result<()>;

    /// Show the typing indicator. Best effort; the default does nothing.
    async fn start_typing(&self, _channel: ChannelId) {}
}
