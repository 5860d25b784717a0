//! Serenity model to core model conversions

use esquie_core::ReactionEvent;
use esquie_core::message::{
    Attachment, Author, ChannelId, ChatMessage, MessageId, SentMessage, UserId,
};
use serenity::model::channel::{Message, Reaction, ReactionType};
use serenity::model::user::User;

/// Server nickname, then global display name, then username.
pub fn display_name(nick: Option<&str>, global_name: Option<&str>, username: &str) -> String {
    [nick, global_name]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
        .unwrap_or(username)
        .to_string()
}

pub fn author(user: &User, nick: Option<&str>) -> Author {
    Author {
        id: UserId(user.id.get()),
        display_name: display_name(nick, user.global_name.as_deref(), &user.name),
        bot: user.bot,
    }
}

pub fn chat_message(message: &Message) -> ChatMessage {
    let nick = message.member.as_ref().and_then(|m| m.nick.as_deref());

    ChatMessage {
        id: MessageId(message.id.get()),
        channel_id: ChannelId(message.channel_id.get()),
        author: author(&message.author, nick),
        content: message.content.clone(),
        reference: message
            .message_reference
            .as_ref()
            .and_then(|r| r.message_id)
            .map(|id| MessageId(id.get())),
        mentions: message
            .mentions
            .iter()
            .map(|user| author(user, None))
            .collect(),
        attachments: message
            .attachments
            .iter()
            .map(|a| Attachment {
                url: a.url.clone(),
                filename: a.filename.clone(),
                content_type: a.content_type.clone(),
            })
            .collect(),
    }
}

pub fn sent_message(message: &Message) -> SentMessage {
    SentMessage {
        channel_id: ChannelId(message.channel_id.get()),
        id: MessageId(message.id.get()),
    }
}

/// Unicode emoji as-is, custom emoji by name
pub fn emoji_name(emoji: &ReactionType) -> String {
    match emoji {
        ReactionType::Unicode(emoji) => emoji.clone(),
        ReactionType::Custom { name, .. } => name.clone().unwrap_or_default(),
        _ => String::new(),
    }
}

pub fn reaction_event(reaction: &Reaction) -> ReactionEvent {
    ReactionEvent {
        channel_id: ChannelId(reaction.channel_id.get()),
        message_id: MessageId(reaction.message_id.get()),
        user_id: reaction.user_id.map(|id| UserId(id.get())),
        emoji: emoji_name(&reaction.emoji),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serenity::model::id::EmojiId;

    #[test]
    fn test_display_name_preference() {
        assert_eq!(display_name(Some("Gus"), Some("Gustave"), "gustave_1"), "Gus");
        assert_eq!(display_name(None, Some("Gustave"), "gustave_1"), "Gustave");
        assert_eq!(display_name(None, None, "gustave_1"), "gustave_1");
        assert_eq!(display_name(Some("  "), None, "gustave_1"), "gustave_1");
    }

    #[test]
    fn test_emoji_names() {
        assert_eq!(emoji_name(&ReactionType::Unicode("🗑️".to_string())), "🗑️");
        assert_eq!(
            emoji_name(&ReactionType::Custom {
                animated: false,
                id: EmojiId::new(42),
                name: Some("trash".to_string()),
            }),
            "trash"
        );
    }
}
