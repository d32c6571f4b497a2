//! Core domain types and utilities for huddle.
//!
//! This crate provides the identifier types and the error-handling
//! foundation shared by every other huddle crate.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ChannelId, ConversationId, GuildId, MessageId, ParseIdError, UserId};
