//! Esquie Core - conversation logic for the Esquie Discord bot
//!
//! Everything here is independent of the Discord client library. The
//! transport is reached through [`ChatPlatform`] and the completion API
//! through [`CompletionBackend`], so the whole pipeline can run against
//! in-memory fakes.

pub mod ai;
pub mod config;
pub mod delivery;
pub mod error;
pub mod history;
pub mod message;
pub mod normalize;
pub mod platform;
pub mod reaction;
pub mod responder;

#[cfg(test)]
mod testing;

pub use ai::{CompletionBackend, CompletionRequest, PollinationsClient};
pub use config::EsquieConfig;
pub use delivery::DeliveryOutcome;
pub use error::{AiError, ConfigError, PlatformError};
pub use message::{BotIdentity, ChatMessage};
pub use platform::ChatPlatform;
pub use reaction::{ReactionEvent, ReactionOutcome};
pub use responder::Responder;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        AiError, BotIdentity, ChatMessage, ChatPlatform, CompletionBackend, ConfigError,
        DeliveryOutcome, EsquieConfig, PlatformError, PollinationsClient, ReactionEvent,
        ReactionOutcome, Responder,
        message::{Attachment, Author, ChannelId, MessageId, SentMessage, UserId},
    };
}
