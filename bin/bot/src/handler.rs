//! Inbound message handling.
//!
//! For each message the handler decides, per channel and one turn at a
//! time, whether the assistant should speak:
//!
//! 1. With a live conversation, the message is recorded and the decider
//!    judges whether it warrants a reply.
//! 2. Without one, only an explicit trigger starts a conversation, seeded
//!    with recent channel history.
//!
//! Replies are split to the platform's length limit and delivered in order.
//! Generation failures become a short apology in the channel and, when a
//! debug channel is configured, a detailed report there.

use crate::locks::ChannelLocks;
use huddle_ai::{
    GenerationContext, GenerationError, GenerationRequest, INFERRED_QUESTION, ResponseGenerator,
};
use huddle_conversation::{
    ChannelConversation, ConversationStore, InboundMessage, MessageRecord, RespondReason,
    ResponseDecider,
};
use huddle_core::{ChannelId, UserId};
use huddle_platform::{DeliverySink, HistoryBackfill, HistoryQuery, chunk};
use rootcause::Report;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

/// Tunables for message handling.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    /// How many hours of channel history may seed a new conversation.
    pub backfill_hours: u32,
    /// How many past messages seed a new conversation.
    pub backfill_limit: usize,
    /// How many of the conversation's latest messages go into each prompt.
    pub context_message_limit: usize,
    /// Maximum characters per delivered message.
    pub max_response_length: usize,
    /// Channel that receives internal error detail, if any.
    pub debug_channel_name: Option<String>,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            backfill_hours: 1,
            backfill_limit: 20,
            context_message_limit: 50,
            max_response_length: 2000,
            debug_channel_name: None,
        }
    }
}

/// The platform and backend the handler talks to.
#[derive(Clone)]
pub struct Collaborators {
    /// Source of recent channel history.
    pub backfill: Arc<dyn HistoryBackfill>,
    /// Reply generator.
    pub generator: Arc<dyn ResponseGenerator>,
    /// Destination for replies.
    pub sink: Arc<dyn DeliverySink>,
}

/// What happened to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Not addressed to the assistant, or written by it.
    Ignored,
    /// Recorded in the live conversation without a reply.
    Observed { reason: RespondReason },
    /// Answered, delivered as `chunks` messages.
    Replied { reason: &'static str, chunks: usize },
    /// A reply was warranted but could not be produced or delivered.
    Failed,
}

/// Routes inbound messages through the conversation engine.
pub struct MessageHandler {
    bot_id: UserId,
    store: Mutex<ConversationStore>,
    decider: ResponseDecider,
    locks: ChannelLocks,
    collaborators: Collaborators,
    settings: HandlerSettings,
}

impl MessageHandler {
    /// Creates a handler around an empty or pre-filled store.
    #[must_use]
    pub fn new(
        bot_id: UserId,
        store: ConversationStore,
        decider: ResponseDecider,
        collaborators: Collaborators,
        settings: HandlerSettings,
    ) -> Self {
        Self {
            bot_id,
            store: Mutex::new(store),
            decider,
            locks: ChannelLocks::new(),
            collaborators,
            settings,
        }
    }

    /// A snapshot of the channel's live conversation, if any.
    pub async fn conversation(&self, channel_id: ChannelId) -> Option<ChannelConversation> {
        self.store.lock().await.get(channel_id).cloned()
    }

    /// Ends the channel's conversation after any turn in progress.
    ///
    /// Returns whether a conversation was live.
    pub async fn end_conversation(&self, channel_id: ChannelId) -> bool {
        let _turn = self.locks.acquire(channel_id).await;
        let ended = self.store.lock().await.end(channel_id);
        if ended {
            info!(%channel_id, "conversation ended on request");
        }
        ended
    }

    /// Handles one inbound message.
    #[instrument(skip_all, fields(channel_id = %message.channel_id, message_id = %message.id))]
    pub async fn handle(&self, message: InboundMessage) -> HandleOutcome {
        if message.author_id == self.bot_id {
            return HandleOutcome::Ignored;
        }

        let channel_id = message.channel_id;
        let _turn = self.locks.acquire(channel_id).await;

        let active = {
            let mut store = self.store.lock().await;
            if store.get(channel_id).is_some() {
                store.record_message(channel_id, message.to_record());
                store.get(channel_id).cloned()
            } else {
                None
            }
        };

        match active {
            Some(conversation) => {
                let (respond, reason) =
                    self.decider
                        .should_respond(&message, &conversation, self.bot_id);
                debug!(
                    respond,
                    %reason,
                    conversation_id = %conversation.id(),
                    "evaluated message in live conversation"
                );
                if !respond {
                    return HandleOutcome::Observed { reason };
                }
                self.reply(&message, &conversation, reason.as_str()).await
            }
            None => {
                let (start, reason) = self
                    .decider
                    .should_start_conversation(&message, self.bot_id);
                debug!(start, %reason, "evaluated message without a conversation");
                if !start {
                    return HandleOutcome::Ignored;
                }

                let seed = self.seed_messages(&message).await;
                let conversation = self.store.lock().await.start(channel_id, &seed).clone();
                info!(
                    conversation_id = %conversation.id(),
                    %reason,
                    seeded = seed.len(),
                    "conversation started"
                );
                self.reply(&message, &conversation, reason.as_str()).await
            }
        }
    }

    /// Recent history oldest first, ending with the triggering message.
    async fn seed_messages(&self, message: &InboundMessage) -> Vec<MessageRecord> {
        let trigger = message.to_record();
        let query =
            HistoryQuery::hours_back(self.settings.backfill_hours, self.settings.backfill_limit);
        let recent = match query {
            Ok(query) => {
                self.collaborators
                    .backfill
                    .recent_messages(message.channel_id, &query)
                    .await
            }
            Err(e) => Err(e.into()),
        };
        let mut seed = match recent {
            Ok(recent) => recent,
            Err(report) => {
                warn!(error = %report, "history backfill failed, starting without context");
                Vec::new()
            }
        };

        seed.reverse();
        // Some platforms already include the triggering message.
        seed.retain(|record| record != &trigger);
        seed.push(trigger);
        seed
    }

    async fn reply(
        &self,
        message: &InboundMessage,
        conversation: &ChannelConversation,
        reason: &'static str,
    ) -> HandleOutcome {
        let question = extract_question(message);
        let request = GenerationRequest {
            question: question.clone(),
            context: GenerationContext {
                channel_id: message.channel_id,
                channel_name: message.channel_name.clone(),
                guild_id: message.guild_id,
                guild_name: message.guild_name.clone(),
                user_name: message.author.clone(),
                recent_messages: conversation
                    .recent_messages(self.settings.context_message_limit)
                    .to_vec(),
                prior_turns: conversation.prior_turns().clone(),
            },
        };

        let reply = match self.collaborators.generator.generate(&request).await {
            Ok(reply) => reply,
            Err(report) => {
                self.report_failure(message, &question, &report).await;
                return HandleOutcome::Failed;
            }
        };

        if reply.text.trim().is_empty() {
            let report: Report<GenerationError> = GenerationError::ResponseParseFailed {
                reason: "the generator returned an empty reply".to_string(),
            }
            .into();
            self.report_failure(message, &question, &report).await;
            return HandleOutcome::Failed;
        }

        let chunks = chunk(&reply.text, self.settings.max_response_length);
        if let Err(report) = self
            .collaborators
            .sink
            .send(message.channel_id, &chunks)
            .await
        {
            error!(error = %report, "failed to deliver reply");
            return HandleOutcome::Failed;
        }

        self.store
            .lock()
            .await
            .record_bot_response(message.channel_id, reply.prior_turns);
        info!(reason, chunks = chunks.len(), "replied");

        HandleOutcome::Replied {
            reason,
            chunks: chunks.len(),
        }
    }

    async fn report_failure(
        &self,
        message: &InboundMessage,
        question: &str,
        report: &Report<GenerationError>,
    ) {
        let failure = report.current_context();
        error!(error = %report, kind = failure.kind(), "reply generation failed");

        let apology = vec![format!("Sorry, {}", failure.user_message())];
        if let Err(e) = self
            .collaborators
            .sink
            .send(message.channel_id, &apology)
            .await
        {
            warn!(error = %e, "failed to deliver apology");
        }

        if let Some(debug_channel) = &self.settings.debug_channel_name {
            let detail = format!(
                "{}: {failure}\nQuestion: {question}\nUser: {}",
                failure.kind(),
                message.author
            );
            if let Err(e) = self
                .collaborators
                .sink
                .report_error(debug_channel, message.channel_id, &detail)
                .await
            {
                warn!(error = %e, %debug_channel, "failed to deliver error report");
            }
        }
    }
}

/// The question the message asks, with mention markup removed.
///
/// A message that only mentions users asks nothing; the generator is then
/// told to infer the question from context.
#[must_use]
pub fn extract_question(message: &InboundMessage) -> String {
    let mut question = message.content.clone();
    for user_id in &message.mentions {
        question = question
            .replace(&format!("<@{user_id}>"), "")
            .replace(&format!("<@!{user_id}>"), "");
    }

    let question = question.trim();
    if question.is_empty() {
        INFERRED_QUESTION.to_string()
    } else {
        question.to_string()
    }
}
