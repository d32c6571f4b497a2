//! Error types for the AI crate.
//!
//! Generation failures are returned wrapped in a rootcause `Report`. The
//! caller decides what the user sees via [`GenerationError::user_message`]
//! and sends the full report somewhere only operators read.

use std::fmt;

/// Generic apology shown for failures the user cannot fix.
const GENERIC_FAILURE: &str = "I encountered an error processing your question.";

/// Errors from the generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The request cannot be answered as asked; the reason is user-facing.
    InvalidRequest { reason: String },
    /// The backend could not be reached.
    BackendUnavailable { reason: String },
    /// The backend rejected or failed the request.
    RequestFailed { reason: String },
    /// The backend's answer could not be understood.
    ResponseParseFailed { reason: String },
}

impl GenerationError {
    /// Short variant name for operator-facing reports.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "InvalidRequest",
            Self::BackendUnavailable { .. } => "BackendUnavailable",
            Self::RequestFailed { .. } => "RequestFailed",
            Self::ResponseParseFailed { .. } => "ResponseParseFailed",
        }
    }

    /// Text that is safe to show in the channel.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidRequest { reason } => reason.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest { reason } => write!(f, "invalid generation request: {reason}"),
            Self::BackendUnavailable { reason } => {
                write!(f, "generation backend unavailable: {reason}")
            }
            Self::RequestFailed { reason } => write!(f, "generation request failed: {reason}"),
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse generation response: {reason}")
            }
        }
    }
}

impl std::error::Error for GenerationError {}
