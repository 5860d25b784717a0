//! The message pipeline
//!
//! [`Responder`] decides whether a message is addressed to the bot, assembles
//! the prompt and history, asks the completion backend and delivers the
//! answer. It owns no platform state; every call receives the
//! [`ChatPlatform`] to act on.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::ai::{CompletionBackend, CompletionRequest};
use crate::config::BehaviorConfig;
use crate::delivery::{DeliveryOutcome, deliver};
use crate::history::HistoryBuilder;
use crate::message::{BotIdentity, ChatMessage};
use crate::normalize::{PromptPolicy, build_prompt};
use crate::platform::ChatPlatform;
use crate::reaction::{ReactionEvent, ReactionOutcome, handle_reaction};

pub struct Responder {
    bot: BotIdentity,
    behavior: BehaviorConfig,
    ai: Arc<dyn CompletionBackend>,
}

impl Responder {
    pub fn new(bot: BotIdentity, behavior: BehaviorConfig, ai: Arc<dyn CompletionBackend>) -> Self {
        Self { bot, behavior, ai }
    }

    pub fn bot(&self) -> &BotIdentity {
        &self.bot
    }

    /// Answer `message` if it is addressed to the bot.
    ///
    /// `referenced` is the message being replied to when the gateway already
    /// delivered it; otherwise it is fetched. Returns `None` for messages
    /// that are not triggers.
    pub async fn handle_message(
        &self,
        platform: &dyn ChatPlatform,
        message: &ChatMessage,
        referenced: Option<ChatMessage>,
    ) -> Option<DeliveryOutcome> {
        if message.author.bot || self.bot.is_me(&message.author) {
            return None;
        }

        let mentioned = message.mentions_user(self.bot.id);
        if !mentioned && message.reference.is_none() {
            return None;
        }

        let referenced = match (referenced, message.reference) {
            (Some(parent), _) => Some(parent),
            (None, Some(parent_id)) => match platform
                .fetch_message(message.channel_id, parent_id)
                .await
            {
                Ok(parent) => Some(parent),
                Err(e) => {
                    debug!(message_id = %parent_id, error = %e, "could not fetch reply target");
                    None
                }
            },
            (None, None) => None,
        };

        let replying_to_bot = referenced
            .as_ref()
            .is_some_and(|parent| self.bot.is_me(&parent.author));
        if !mentioned && !replying_to_bot {
            return None;
        }

        info!(
            author = %message.author.display_name,
            channel_id = %message.channel_id,
            replying_to_bot,
            "handling message"
        );

        let policy = PromptPolicy {
            short_prompt_threshold: self.behavior.short_prompt_threshold,
            include_metadata: self.behavior.prompt_metadata,
        };
        let prompt = build_prompt(message, &self.bot, replying_to_bot, &policy);

        let history = match referenced {
            Some(parent) => {
                HistoryBuilder::new(platform, &self.bot, self.behavior.history_max_depth)
                    .collect_from(parent)
                    .await
            }
            None => Vec::new(),
        };

        platform.start_typing(message.channel_id).await;

        let placeholder = match platform
            .reply(message, &self.behavior.thinking_placeholder)
            .await
        {
            Ok(sent) => Some(sent),
            Err(e) => {
                warn!(error = %e, "could not post thinking placeholder");
                None
            }
        };

        let image_descriptions = self.describe_images(message).await;

        let request = CompletionRequest {
            prompt,
            history,
            image_descriptions,
        };

        let answer = match self.ai.complete(&request).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, "completion failed, sending fallback reply");
                self.behavior.fallback_reply.clone()
            }
        };

        Some(deliver(platform, message, placeholder, &answer).await)
    }

    /// Delete an answer when its requester reacts with a delete emoji.
    pub async fn handle_reaction(
        &self,
        platform: &dyn ChatPlatform,
        event: &ReactionEvent,
    ) -> ReactionOutcome {
        handle_reaction(platform, &self.bot, &self.behavior.delete_emojis, event).await
    }

    async fn describe_images(&self, message: &ChatMessage) -> Vec<String> {
        if !self.behavior.describe_images {
            return Vec::new();
        }

        let mut descriptions = Vec::new();
        for image in message.images().take(self.behavior.max_images) {
            match self.ai.describe_image(&image.url).await {
                Ok(description) => {
                    debug!(filename = %image.filename, "described image");
                    descriptions.push(description);
                }
                Err(e) => {
                    warn!(
                        filename = %image.filename,
                        error = %e,
                        "image description failed, skipping"
                    );
                }
            }
        }
        descriptions
    }
}
