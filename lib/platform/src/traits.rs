//! Interfaces to the chat platform.
//!
//! The conversation engine never talks to the platform itself. The
//! message-handling layer reaches it through these traits, so transports
//! can be swapped (or faked in tests) without touching the engine.

use crate::error::PlatformError;
use crate::history::HistoryQuery;
use async_trait::async_trait;
use futures::Stream;
use huddle_conversation::{InboundMessage, MessageRecord};
use huddle_core::{ChannelId, Result};
use std::pin::Pin;

/// An event delivered by the message source.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// A message was posted.
    Message(InboundMessage),
    /// Someone asked to close the channel's conversation.
    EndConversation(ChannelId),
}

impl InboundEvent {
    /// The channel the event belongs to.
    #[must_use]
    pub fn channel_id(&self) -> ChannelId {
        match self {
            Self::Message(message) => message.channel_id,
            Self::EndConversation(channel_id) => *channel_id,
        }
    }
}

/// Stream of inbound events.
pub type InboundStream = Pin<Box<dyn Stream<Item = InboundEvent> + Send>>;

/// Source of recent channel history, used to seed new conversations.
#[async_trait]
pub trait HistoryBackfill: Send + Sync {
    /// Returns the most recent messages in the channel that fall inside the
    /// query's window, newest first and at most `query.limit()` of them.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform cannot provide the history.
    async fn recent_messages(
        &self,
        channel_id: ChannelId,
        query: &HistoryQuery,
    ) -> Result<Vec<MessageRecord>, PlatformError>;
}

/// Destination for the assistant's replies.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Sends each chunk as its own message, in order.
    ///
    /// # Errors
    ///
    /// Returns an error on the first chunk that cannot be delivered.
    async fn send(&self, channel_id: ChannelId, chunks: &[String]) -> Result<(), PlatformError>;

    /// Posts internal error detail to the channel named `debug_channel`.
    ///
    /// Transports without such a channel keep the default, which drops it.
    ///
    /// # Errors
    ///
    /// Returns an error if the detail cannot be delivered.
    async fn report_error(
        &self,
        debug_channel: &str,
        origin: ChannelId,
        detail: &str,
    ) -> Result<(), PlatformError> {
        let _ = (debug_channel, origin, detail);
        Ok(())
    }
}
