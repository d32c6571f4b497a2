//! Reply generation for huddle.
//!
//! This crate provides:
//!
//! - **Generation backend trait**: the black box that turns a question and
//!   channel context into reply text
//! - **Prompt rendering**: system prompt and transcript formatting
//! - **Ollama backend**: an implementation over an Ollama-compatible chat API

pub mod backend;
pub mod error;
pub mod ollama;
pub mod prompt;

pub use backend::{GenerationContext, GenerationReply, GenerationRequest, ResponseGenerator};
pub use error::GenerationError;
pub use ollama::{OllamaConfig, OllamaGenerator};
pub use prompt::{INFERRED_QUESTION, SYSTEM_PROMPT};
