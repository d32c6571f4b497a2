//! Per-channel conversation state.
//!
//! A channel has at most one live conversation. Conversations expire after
//! a period of inactivity; expiry is lazy, checked whenever the channel's
//! entry is touched, so no background sweep is needed.

use crate::history::PriorTurns;
use crate::message::MessageRecord;
use chrono::{DateTime, Utc};
use huddle_core::{ChannelId, ConversationId, UserId};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::debug;

/// State for an active conversation in a channel.
#[derive(Debug, Clone)]
pub struct ChannelConversation {
    id: ConversationId,
    channel_id: ChannelId,
    started_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    messages: Vec<MessageRecord>,
    prior_turns: PriorTurns,
    participants: HashSet<UserId>,
    last_bot_response: Option<DateTime<Utc>>,
}

impl ChannelConversation {
    fn new(channel_id: ChannelId, initial_messages: &[MessageRecord], now: DateTime<Utc>) -> Self {
        Self {
            id: ConversationId::new(),
            channel_id,
            started_at: now,
            last_activity: now,
            messages: initial_messages.to_vec(),
            prior_turns: PriorTurns::default(),
            participants: initial_messages.iter().map(|m| m.author_id).collect(),
            last_bot_response: None,
        }
    }

    /// Identifier minted when the conversation started.
    #[must_use]
    pub fn id(&self) -> ConversationId {
        self.id
    }

    /// The channel this conversation lives in.
    #[must_use]
    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// When the conversation started.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When a message was last recorded.
    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Every message seen during the conversation, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[MessageRecord] {
        &self.messages
    }

    /// The last `limit` messages, oldest first.
    #[must_use]
    pub fn recent_messages(&self, limit: usize) -> &[MessageRecord] {
        let start = self.messages.len().saturating_sub(limit);
        &self.messages[start..]
    }

    /// Continuation state from the last generated reply.
    #[must_use]
    pub fn prior_turns(&self) -> &PriorTurns {
        &self.prior_turns
    }

    /// Users who have posted in the conversation.
    #[must_use]
    pub fn participants(&self) -> &HashSet<UserId> {
        &self.participants
    }

    /// When the assistant last replied, if it has.
    #[must_use]
    pub fn last_bot_response(&self) -> Option<DateTime<Utc>> {
        self.last_bot_response
    }

    fn record(&mut self, message: MessageRecord, now: DateTime<Utc>) {
        self.last_activity = self.last_activity.max(now);
        self.participants.insert(message.author_id);
        self.messages.push(message);
    }
}

/// Owns the live conversation of every channel.
///
/// The store is plain data with `&mut self` mutation; callers that share it
/// across tasks wrap it in a lock and serialize work per channel.
#[derive(Debug)]
pub struct ConversationStore {
    timeout: Duration,
    conversations: HashMap<ChannelId, ChannelConversation>,
}

impl ConversationStore {
    /// Creates an empty store whose conversations expire after `timeout`
    /// without activity.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            conversations: HashMap::new(),
        }
    }

    /// The inactivity timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of stored entries, including ones that have expired but have
    /// not been touched since.
    #[must_use]
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Returns the live conversation for `channel_id`, if any.
    pub fn get(&mut self, channel_id: ChannelId) -> Option<&ChannelConversation> {
        self.get_at(channel_id, Utc::now())
    }

    /// Like [`get`](Self::get), evaluating expiry at `now`.
    ///
    /// An expired entry is removed and `None` is returned.
    pub fn get_at(
        &mut self,
        channel_id: ChannelId,
        now: DateTime<Utc>,
    ) -> Option<&ChannelConversation> {
        self.live_entry(channel_id, now).map(|conv| &*conv)
    }

    /// Starts a new conversation seeded with `initial_messages`.
    ///
    /// Replaces any existing entry for the channel; callers check
    /// liveness with [`get`](Self::get) first.
    pub fn start(
        &mut self,
        channel_id: ChannelId,
        initial_messages: &[MessageRecord],
    ) -> &ChannelConversation {
        self.start_at(channel_id, initial_messages, Utc::now())
    }

    /// Like [`start`](Self::start), stamping the conversation with `now`.
    pub fn start_at(
        &mut self,
        channel_id: ChannelId,
        initial_messages: &[MessageRecord],
        now: DateTime<Utc>,
    ) -> &ChannelConversation {
        let conv = ChannelConversation::new(channel_id, initial_messages, now);
        debug!(
            %channel_id,
            conversation_id = %conv.id,
            seeded = conv.messages.len(),
            "conversation started"
        );

        self.conversations.insert(channel_id, conv);
        &self.conversations[&channel_id]
    }

    /// Records a message and bumps the conversation's activity.
    ///
    /// Does nothing if the channel has no live conversation.
    pub fn record_message(&mut self, channel_id: ChannelId, message: MessageRecord) {
        self.record_message_at(channel_id, message, Utc::now());
    }

    /// Like [`record_message`](Self::record_message), at `now`.
    pub fn record_message_at(
        &mut self,
        channel_id: ChannelId,
        message: MessageRecord,
        now: DateTime<Utc>,
    ) {
        if let Some(conv) = self.live_entry(channel_id, now) {
            conv.record(message, now);
        }
    }

    /// Stores the continuation state of the assistant's latest reply.
    ///
    /// Does nothing if the channel has no live conversation.
    pub fn record_bot_response(&mut self, channel_id: ChannelId, prior_turns: PriorTurns) {
        self.record_bot_response_at(channel_id, prior_turns, Utc::now());
    }

    /// Like [`record_bot_response`](Self::record_bot_response), at `now`.
    pub fn record_bot_response_at(
        &mut self,
        channel_id: ChannelId,
        prior_turns: PriorTurns,
        now: DateTime<Utc>,
    ) {
        if let Some(conv) = self.live_entry(channel_id, now) {
            conv.prior_turns = prior_turns;
            conv.last_bot_response = Some(now);
        }
    }

    /// Ends the channel's conversation. Returns true if one was stored.
    pub fn end(&mut self, channel_id: ChannelId) -> bool {
        match self.conversations.remove(&channel_id) {
            Some(conv) => {
                debug!(%channel_id, conversation_id = %conv.id, "conversation ended");
                true
            }
            None => false,
        }
    }

    fn is_expired(&self, conv: &ChannelConversation, now: DateTime<Utc>) -> bool {
        // A clock that moved backwards never expires anything.
        (now - conv.last_activity)
            .to_std()
            .is_ok_and(|elapsed| elapsed > self.timeout)
    }

    fn live_entry(
        &mut self,
        channel_id: ChannelId,
        now: DateTime<Utc>,
    ) -> Option<&mut ChannelConversation> {
        let expired = self
            .conversations
            .get(&channel_id)
            .map(|conv| self.is_expired(conv, now))?;

        if expired {
            if let Some(conv) = self.conversations.remove(&channel_id) {
                debug!(%channel_id, conversation_id = %conv.id, "conversation expired");
            }
            return None;
        }

        self.conversations.get_mut(&channel_id)
    }
}
