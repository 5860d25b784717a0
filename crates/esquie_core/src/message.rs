//! Platform-neutral message model
//!
//! The serenity adapter converts gateway and HTTP payloads into these types so
//! the conversation logic never touches platform structs directly.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

snowflake!(
    /// Discord user reference
    UserId
);
snowflake!(
    /// Discord channel reference
    ChannelId
);
snowflake!(
    /// Discord message reference
    MessageId
);

impl UserId {
    /// The mention token Discord renders for this user.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

/// Who said a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One prior turn of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    /// Server nickname, global display name or username, in that order of preference
    pub display_name: String,
    pub bot: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub url: String,
    pub filename: String,
    pub content_type: Option<String>,
}

impl Attachment {
    const IMAGE_EXTENSIONS: [&'static str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

    /// True when either the content type or the file extension says image.
    pub fn is_image(&self) -> bool {
        let typed_image = self
            .content_type
            .as_deref()
            .is_some_and(|content_type| content_type.starts_with("image/"));

        typed_image || self.has_image_extension()
    }

    fn has_image_extension(&self) -> bool {
        self.filename
            .rsplit_once('.')
            .is_some_and(|(_, ext)| {
                Self::IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
    }
}

/// Snapshot of a message as seen by the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author: Author,
    pub content: String,
    /// The message this one replies to, if any
    pub reference: Option<MessageId>,
    pub mentions: Vec<Author>,
    pub attachments: Vec<Attachment>,
}

impl ChatMessage {
    pub fn mentions_user(&self, user: UserId) -> bool {
        self.mentions.iter().any(|m| m.id == user)
    }

    pub fn images(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.iter().filter(|a| a.is_image())
    }

    /// Display name to user id for everyone mentioned except `exclude`.
    pub fn mention_map(&self, exclude: UserId) -> MentionMap {
        MentionMap(
            self.mentions
                .iter()
                .filter(|m| m.id != exclude)
                .map(|m| (m.display_name.clone(), m.id))
                .collect(),
        )
    }
}

/// Display names of mentioned users, used only to enrich a single prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentionMap(pub BTreeMap<String, UserId>);

impl MentionMap {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn name_for(&self, id: UserId) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, user)| **user == id)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &UserId)> {
        self.0.iter()
    }
}

/// A message the bot posted, addressable for later edits or deletes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: ChannelId,
    pub id: MessageId,
}

/// The bot's own identity, injected into every handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: UserId,
    pub name: String,
}

impl BotIdentity {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn is_me(&self, author: &Author) -> bool {
        author.id == self.id
    }
}
