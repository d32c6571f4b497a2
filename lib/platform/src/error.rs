//! Error types for the platform crate.
//!
//! Collaborator operations return these wrapped in a rootcause `Report`,
//! so the message-handling layer can log the full chain while deciding on
//! its own what, if anything, the user sees.

use huddle_core::ChannelId;
use std::fmt;

/// Errors from chat-platform collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Channel history could not be fetched.
    HistoryUnavailable { channel: ChannelId, reason: String },
    /// A message could not be delivered.
    DeliveryFailed { channel: ChannelId, reason: String },
    /// Reading inbound messages failed.
    InputFailed { reason: String },
    /// A history query was out of range.
    InvalidQuery { reason: String },
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HistoryUnavailable { channel, reason } => {
                write!(f, "history of channel {channel} unavailable: {reason}")
            }
            Self::DeliveryFailed { channel, reason } => {
                write!(f, "delivery to channel {channel} failed: {reason}")
            }
            Self::InputFailed { reason } => write!(f, "reading inbound messages failed: {reason}"),
            Self::InvalidQuery { reason } => write!(f, "invalid history query: {reason}"),
        }
    }
}

impl std::error::Error for PlatformError {}
