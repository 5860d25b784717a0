//! Esquie Discord - serenity adapter
//!
//! Implements [`esquie_core::ChatPlatform`] over serenity's HTTP client and
//! feeds gateway events into [`esquie_core::Responder`].

pub mod bot;
pub mod convert;
pub mod error;
pub mod handler;
pub mod platform;

pub use bot::{create_client, run_bot};
pub use error::{DiscordError, Result};
pub use handler::EsquieHandler;
pub use platform::SerenityPlatform;

// Re-export serenity for convenience
pub use serenity;
