//! Reply-chain history reconstruction
//!
//! Walks "in reply to" references upward from a trigger message and turns the
//! messages that belong to a conversation with the bot into [`Turn`]s.

use std::collections::VecDeque;

use tracing::debug;

use crate::message::{BotIdentity, ChatMessage, Turn};
use crate::normalize::{expand_short_prompt, strip_mentions_of};
use crate::platform::ChatPlatform;

/// Bounded reply-chain walker
pub struct HistoryBuilder<'a> {
    platform: &'a dyn ChatPlatform,
    bot: &'a BotIdentity,
    max_depth: usize,
}

impl<'a> HistoryBuilder<'a> {
    pub fn new(platform: &'a dyn ChatPlatform, bot: &'a BotIdentity, max_depth: usize) -> Self {
        Self {
            platform,
            bot,
            max_depth,
        }
    }

    /// Collect the conversation leading up to `trigger`, oldest first.
    ///
    /// The trigger itself is not included.
    pub async fn collect(&self, trigger: &ChatMessage) -> Vec<Turn> {
        let Some(parent_id) = trigger.reference else {
            return Vec::new();
        };
        if self.max_depth == 0 {
            return Vec::new();
        }

        match self
            .platform
            .fetch_message(trigger.channel_id, parent_id)
            .await
        {
            Ok(parent) => self.collect_from(parent).await,
            Err(e) => {
                debug!(message_id = %parent_id, error = %e, "reply target unavailable, no history");
                Vec::new()
            }
        }
    }

    /// Same as [`collect`](Self::collect) when the trigger's parent has
    /// already been fetched. `parent` counts towards the depth limit.
    pub async fn collect_from(&self, parent: ChatMessage) -> Vec<Turn> {
        let mut turns = VecDeque::new();
        if self.max_depth == 0 {
            return Vec::new();
        }

        let mut current = Some(parent);
        let mut depth = 0;
        // The front turn is a bare mention whose default wording depends on
        // whether it replied to the bot
        let mut bare_mention_at_front = false;

        while let Some(message) = current.take() {
            depth += 1;

            if bare_mention_at_front && self.bot.is_me(&message.author) {
                turns[0] = Turn::user(expand_short_prompt("", true, 0));
            }
            bare_mention_at_front = false;

            if let Some((turn, bare_mention)) = self.turn_for(&message) {
                debug!(depth, role = %turn.role, "added history turn");
                turns.push_front(turn);
                bare_mention_at_front = bare_mention;
            }

            if depth >= self.max_depth {
                debug!(depth, "history depth limit reached");
                break;
            }

            let Some(next_id) = message.reference else {
                break;
            };

            current = match self
                .platform
                .fetch_message(message.channel_id, next_id)
                .await
            {
                Ok(next) => Some(next),
                Err(e) => {
                    debug!(depth, message_id = %next_id, error = %e, "reply chain ends early");
                    None
                }
            };
        }

        debug!(turns = turns.len(), "built conversation history");
        turns.into()
    }

    /// A message is part of the conversation if the bot wrote it or it
    /// addresses the bot. Messages without any text (image-only) are left out.
    ///
    /// A user message that was nothing but the bot's mention gets the same
    /// default prompt the bot answered it with. The flag marks such turns.
    fn turn_for(&self, message: &ChatMessage) -> Option<(Turn, bool)> {
        let from_bot = self.bot.is_me(&message.author);
        if !from_bot && !message.mentions_user(self.bot.id) {
            return None;
        }
        if message.content.trim().is_empty() {
            return None;
        }

        let content = strip_mentions_of(&message.content, self.bot.id)
            .trim()
            .to_string();

        if from_bot {
            let content = if content.is_empty() {
                message.content.trim().to_string()
            } else {
                content
            };
            return Some((Turn::assistant(content), false));
        }
        if content.is_empty() {
            return Some((Turn::user(expand_short_prompt("", false, 0)), true));
        }
        Some((Turn::user(content), false))
    }
}
