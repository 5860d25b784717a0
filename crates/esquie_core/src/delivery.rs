//! Posting the final answer
//!
//! The answer replaces the thinking placeholder when possible. When the bot
//! lacks the permission for a route it falls back to a plain reply, then to a
//! channel message that mentions the requester.

use tracing::{error, info, warn};

use crate::error::PlatformError;
use crate::message::{ChatMessage, SentMessage};
use crate::platform::ChatPlatform;

/// Discord's per-message character limit
pub const MESSAGE_LIMIT: usize = 2000;

/// Which route the answer went out on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Edited(SentMessage),
    Replied(SentMessage),
    Sent(SentMessage),
    Failed(PlatformError),
}

/// Deliver `content` in answer to `trigger`.
pub async fn deliver(
    platform: &dyn ChatPlatform,
    trigger: &ChatMessage,
    placeholder: Option<SentMessage>,
    content: &str,
) -> DeliveryOutcome {
    let content = clamp_to_limit(content, MESSAGE_LIMIT);

    if let Some(placeholder) = placeholder {
        match platform.edit(placeholder, &content).await {
            Ok(()) => {
                info!(message_id = %placeholder.id, "edited placeholder with answer");
                return DeliveryOutcome::Edited(placeholder);
            }
            Err(e) if e.is_permission() => {
                warn!(error = %e, "cannot edit placeholder, replying instead");
            }
            Err(e) => {
                error!(error = %e, "failed to edit placeholder");
                return DeliveryOutcome::Failed(e);
            }
        }
    }

    match platform.reply(trigger, &content).await {
        Ok(sent) => {
            info!(author = %trigger.author.display_name, "sent reply");
            return DeliveryOutcome::Replied(sent);
        }
        Err(e) if e.is_permission() => {
            warn!(error = %e, "cannot reply, sending to channel instead");
        }
        Err(e) => {
            error!(error = %e, "failed to send reply");
            return DeliveryOutcome::Failed(e);
        }
    }

    let addressed = clamp_to_limit(
        &format!("{} {}", trigger.author.id.mention(), content),
        MESSAGE_LIMIT,
    );
    match platform.send(trigger.channel_id, &addressed).await {
        Ok(sent) => {
            info!(channel_id = %trigger.channel_id, "sent fallback channel message");
            DeliveryOutcome::Sent(sent)
        }
        Err(e) => {
            error!(error = %e, channel_id = %trigger.channel_id, "fallback send failed");
            DeliveryOutcome::Failed(e)
        }
    }
}

/// Truncate `content` to at most `limit` characters, marking the cut with an
/// ellipsis.
pub fn clamp_to_limit(content: &str, limit: usize) -> String {
    if content.chars().count() <= limit {
        return content.to_string();
    }

    let mut clamped: String = content.chars().take(limit.saturating_sub(1)).collect();
    clamped.push('…');
    clamped
}
