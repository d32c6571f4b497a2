//! Generation backend abstraction.
//!
//! The conversation engine treats reply generation as a black box: given a
//! question and the channel's context it returns text plus updated
//! continuation state. Implementations own the shape of that state.

use crate::error::GenerationError;
use async_trait::async_trait;
use huddle_conversation::{MessageRecord, PriorTurns};
use huddle_core::{ChannelId, GuildId, Result};

/// Everything the backend knows about where the question was asked.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    /// Channel the question was asked in.
    pub channel_id: ChannelId,
    /// Channel display name.
    pub channel_name: String,
    /// Guild the channel belongs to, if any.
    pub guild_id: Option<GuildId>,
    /// Guild display name, if any.
    pub guild_name: Option<String>,
    /// Display name of the user asking.
    pub user_name: String,
    /// Recent messages of the conversation, oldest first.
    pub recent_messages: Vec<MessageRecord>,
    /// Continuation state returned by the previous reply.
    pub prior_turns: PriorTurns,
}

/// A request for a generated reply.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The question to answer, with mentions stripped.
    pub question: String,
    /// Where and by whom it was asked.
    pub context: GenerationContext,
}

/// A generated reply.
#[derive(Debug, Clone)]
pub struct GenerationReply {
    /// Reply text, not yet split for delivery.
    pub text: String,
    /// Continuation state to hand back on the next request.
    pub prior_turns: PriorTurns,
}

/// Trait for generation backends.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Generates a reply for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails. Callers do not retry.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationReply, GenerationError>;
}
