//! Message types observed in a channel.

use chrono::{DateTime, Utc};
use huddle_core::{ChannelId, GuildId, MessageId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lightweight, immutable record of one observed message.
///
/// This is what a conversation keeps as context for prompt building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Author display name.
    pub author: String,
    /// Author identifier.
    pub author_id: UserId,
    /// Text content.
    pub content: String,
    /// When the message was created on the platform.
    pub timestamp: DateTime<Utc>,
    /// Whether the author is an automated account.
    pub is_bot: bool,
}

impl MessageRecord {
    /// Creates a record for a human-authored message.
    #[must_use]
    pub fn new(
        author: impl Into<String>,
        author_id: UserId,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            author: author.into(),
            author_id,
            content: content.into(),
            timestamp,
            is_bot: false,
        }
    }

    /// Marks the record as authored by an automated account.
    #[must_use]
    pub fn from_bot(mut self) -> Self {
        self.is_bot = true;
        self
    }
}

/// Reference from a reply to the message it answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyReference {
    /// The message being replied to.
    pub message_id: MessageId,
    /// Author of the referenced message, when the platform could resolve it.
    pub author_id: Option<UserId>,
}

/// A message event delivered by the message source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Platform message identifier.
    pub id: MessageId,
    /// Channel the message was posted in.
    pub channel_id: ChannelId,
    /// Channel display name.
    pub channel_name: String,
    /// Guild the channel belongs to, if any.
    pub guild_id: Option<GuildId>,
    /// Guild display name, if any.
    pub guild_name: Option<String>,
    /// Author display name.
    pub author: String,
    /// Author identifier.
    pub author_id: UserId,
    /// Text content.
    pub content: String,
    /// When the message was created on the platform.
    pub timestamp: DateTime<Utc>,
    /// Whether the author is an automated account.
    pub is_bot: bool,
    /// Users explicitly addressed by the message.
    pub mentions: HashSet<UserId>,
    /// Message this one replies to, if any.
    pub reply_to: Option<ReplyReference>,
}

impl InboundMessage {
    /// Creates a plain message with no mentions and no reply reference.
    #[must_use]
    pub fn new(
        id: MessageId,
        channel_id: ChannelId,
        author: impl Into<String>,
        author_id: UserId,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            channel_id,
            channel_name: String::new(),
            guild_id: None,
            guild_name: None,
            author: author.into(),
            author_id,
            content: content.into(),
            timestamp: Utc::now(),
            is_bot: false,
            mentions: HashSet::new(),
            reply_to: None,
        }
    }

    /// Sets the channel display name.
    #[must_use]
    pub fn in_channel(mut self, name: impl Into<String>) -> Self {
        self.channel_name = name.into();
        self
    }

    /// Sets the guild the channel belongs to.
    #[must_use]
    pub fn in_guild(mut self, id: GuildId, name: impl Into<String>) -> Self {
        self.guild_id = Some(id);
        self.guild_name = Some(name.into());
        self
    }

    /// Sets the creation timestamp.
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Adds a mentioned user.
    #[must_use]
    pub fn mentioning(mut self, user_id: UserId) -> Self {
        self.mentions.insert(user_id);
        self
    }

    /// Marks this message as a reply.
    #[must_use]
    pub fn replying_to(mut self, reference: ReplyReference) -> Self {
        self.reply_to = Some(reference);
        self
    }

    /// Marks the author as an automated account.
    #[must_use]
    pub fn from_bot(mut self) -> Self {
        self.is_bot = true;
        self
    }

    /// Returns true if `user_id` is among the explicitly addressed users.
    #[must_use]
    pub fn mentions_user(&self, user_id: UserId) -> bool {
        self.mentions.contains(&user_id)
    }

    /// Returns true if this message replies to a message authored by `user_id`.
    #[must_use]
    pub fn replies_to_user(&self, user_id: UserId) -> bool {
        self.reply_to
            .and_then(|reference| reference.author_id)
            .is_some_and(|author| author == user_id)
    }

    /// Converts the event into the record a conversation keeps.
    #[must_use]
    pub fn to_record(&self) -> MessageRecord {
        MessageRecord {
            author: self.author.clone(),
            author_id: self.author_id,
            content: self.content.clone(),
            timestamp: self.timestamp,
            is_bot: self.is_bot,
        }
    }
}
