//! huddle chat assistant.
//!
//! Glue between a chat transport, the conversation engine and a generation
//! backend: inbound events are queued per channel by [`dispatch::Dispatcher`]
//! and handled in arrival order by [`handler::MessageHandler`],
//! which decides whether to reply and delivers the reply in chunks.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod locks;
