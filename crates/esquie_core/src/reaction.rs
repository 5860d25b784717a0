//! Delete-by-reaction
//!
//! The person who asked can remove the bot's answer by reacting to it with
//! one of the delete emojis.

use tracing::{debug, info, warn};

use crate::message::{BotIdentity, ChannelId, MessageId, UserId};
use crate::platform::ChatPlatform;

/// Variation selector that some clients append to emoji
const VARIATION_SELECTOR: char = '\u{FE0F}';

/// A reaction added to some message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    /// Missing when the platform did not say who reacted
    pub user_id: Option<UserId>,
    /// Unicode emoji, or the name of a custom emoji
    pub emoji: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionOutcome {
    Deleted,
    Ignored,
}

/// Whether `emoji` is one of `delete_emojis`, ignoring variation selectors.
pub fn is_delete_emoji(emoji: &str, delete_emojis: &[String]) -> bool {
    let wanted = strip_variation(emoji);
    delete_emojis.iter().any(|e| strip_variation(e) == wanted)
}

fn strip_variation(emoji: &str) -> String {
    emoji.chars().filter(|c| *c != VARIATION_SELECTOR).collect()
}

/// Delete the reacted-to bot message if the reaction came from whoever the
/// bot was answering. Anything else is a silent no-op.
pub async fn handle_reaction(
    platform: &dyn ChatPlatform,
    bot: &BotIdentity,
    delete_emojis: &[String],
    event: &ReactionEvent,
) -> ReactionOutcome {
    let Some(reactor) = event.user_id else {
        return ReactionOutcome::Ignored;
    };
    if reactor == bot.id || !is_delete_emoji(&event.emoji, delete_emojis) {
        return ReactionOutcome::Ignored;
    }

    let reacted = match platform
        .fetch_message(event.channel_id, event.message_id)
        .await
    {
        Ok(message) => message,
        Err(e) => {
            debug!(message_id = %event.message_id, error = %e, "reacted message unavailable");
            return ReactionOutcome::Ignored;
        }
    };

    if !bot.is_me(&reacted.author) {
        return ReactionOutcome::Ignored;
    }
    let Some(original_id) = reacted.reference else {
        return ReactionOutcome::Ignored;
    };

    let original = match platform.fetch_message(event.channel_id, original_id).await {
        Ok(message) => message,
        Err(e) => {
            debug!(message_id = %original_id, error = %e, "original request unavailable");
            return ReactionOutcome::Ignored;
        }
    };

    if original.author.id != reactor {
        debug!(
            reactor = %reactor,
            requester = %original.author.id,
            "delete reaction from someone other than the requester"
        );
        return ReactionOutcome::Ignored;
    }

    match platform.delete(event.channel_id, event.message_id).await {
        Ok(()) => {
            info!(message_id = %event.message_id, user = %reactor, "deleted answer on request");
            ReactionOutcome::Deleted
        }
        Err(e) => {
            warn!(message_id = %event.message_id, error = %e, "could not delete answer");
            ReactionOutcome::Ignored
        }
    }
}
