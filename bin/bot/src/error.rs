//! Errors that stop the bot before it starts reading messages.

use std::fmt;

/// Startup failures.
#[derive(Debug)]
pub enum StartupError {
    /// Configuration could not be loaded.
    Config { reason: String },
    /// The generation backend could not be set up.
    Generator { reason: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "failed to load configuration: {reason}"),
            Self::Generator { reason } => {
                write!(f, "failed to set up generation backend: {reason}")
            }
        }
    }
}

impl std::error::Error for StartupError {}
