//! Turning raw message text into the prompt sent upstream

use std::sync::LazyLock;

use regex::Regex;

use crate::message::{BotIdentity, ChatMessage, MentionMap, UserId};

/// Matches `<@123>` and the legacy nickname form `<@!123>`
static MENTION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@!?(\d+)>").expect("mention pattern is valid"));

/// How prompts are shaped before they reach the completion API
#[derive(Debug, Clone)]
pub struct PromptPolicy {
    pub short_prompt_threshold: usize,
    pub include_metadata: bool,
}

impl Default for PromptPolicy {
    fn default() -> Self {
        Self {
            short_prompt_threshold: 3,
            include_metadata: false,
        }
    }
}

/// Remove every mention of `user` from `text`. Other mentions are left alone.
pub fn strip_mentions_of(text: &str, user: UserId) -> String {
    MENTION_TOKEN
        .replace_all(text, |caps: &regex::Captures<'_>| {
            if caps[1].parse::<u64>().ok() == Some(user.0) {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Replace mentions of known users with `@DisplayName`.
pub fn resolve_mentions(text: &str, mentions: &MentionMap) -> String {
    MENTION_TOKEN
        .replace_all(text, |caps: &regex::Captures<'_>| {
            caps[1]
                .parse::<u64>()
                .ok()
                .and_then(|id| mentions.name_for(UserId(id)))
                .map(|name| format!("@{name}"))
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Build the prompt for `message`.
///
/// `replying_to_bot` selects the wording used when the text is empty or too
/// short to stand on its own.
pub fn build_prompt(
    message: &ChatMessage,
    bot: &BotIdentity,
    replying_to_bot: bool,
    policy: &PromptPolicy,
) -> String {
    let mentions = message.mention_map(bot.id);

    let mut text = strip_mentions_of(&message.content, bot.id);
    if policy.include_metadata {
        text = resolve_mentions(&text, &mentions);
    }

    let prompt = expand_short_prompt(text.trim(), replying_to_bot, policy.short_prompt_threshold);

    if policy.include_metadata {
        with_metadata(&prompt, &message.author.display_name, &mentions)
    } else {
        prompt
    }
}

/// Substitute a fuller question for empty or very short prompts.
pub fn expand_short_prompt(text: &str, replying_to_bot: bool, threshold: usize) -> String {
    if text.is_empty() {
        return if replying_to_bot {
            "Please continue our conversation.".to_string()
        } else {
            "Hello! Can you introduce yourself?".to_string()
        };
    }

    if text.chars().count() < threshold {
        return if replying_to_bot {
            format!("Continuing our conversation: '{text}'")
        } else {
            format!("Hello! Someone said '{text}'. Can you respond to that?")
        };
    }

    text.to_string()
}

fn with_metadata(prompt: &str, sender: &str, mentions: &MentionMap) -> String {
    let mut header = format!("[From: {sender}]");
    if !mentions.is_empty() {
        let names = mentions
            .iter()
            .map(|(name, id)| format!("{name} ({id})"))
            .collect::<Vec<_>>()
            .join(", ");
        header.push_str(&format!("\n[Mentioned: {names}]"));
    }
    format!("{header}\n{prompt}")
}
