//! Chat-platform boundary for huddle.
//!
//! This crate provides:
//!
//! - **Collaborator traits**: history backfill, reply delivery, inbound events
//! - **History queries**: time window and cap for backfill lookups
//! - **Chunker**: splitting replies to fit platform message limits
//! - **Console transport**: a terminal stand-in for a chat platform

pub mod chunk;
pub mod console;
pub mod error;
pub mod history;
pub mod traits;

pub use chunk::chunk;
pub use console::{CONSOLE_CHANNEL, CONSOLE_USER, ConsoleConfig, ConsoleTransport};
pub use error::PlatformError;
pub use history::{HistoryQuery, MAX_HOURS_BACK, MAX_LIMIT};
pub use traits::{DeliverySink, HistoryBackfill, InboundEvent, InboundStream};
