//! Conversation lifecycle engine for huddle.
//!
//! This crate provides:
//!
//! - **Conversation Store**: per-channel conversation state with lazy expiry
//! - **Response Decider**: when to start a conversation and when to reply
//! - **Message types**: what the engine observes and remembers
//!
//! Nothing here performs I/O. Fetching history, generating replies and
//! delivering them belong to the caller.

pub mod decider;
pub mod history;
pub mod message;
pub mod store;

pub use decider::{DEFAULT_FOLLOWUP_WINDOW, RespondReason, ResponseDecider, StartReason};
pub use history::PriorTurns;
pub use message::{InboundMessage, MessageRecord, ReplyReference};
pub use store::{ChannelConversation, ConversationStore};
