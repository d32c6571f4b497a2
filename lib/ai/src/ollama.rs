//! Generation backend for an Ollama-compatible chat API.
//!
//! Prior turns are kept as a JSON array of `{role, content}` objects holding
//! each question and the reply to it. The channel context is sent fresh with
//! every request and never stored in the history.

use crate::backend::{GenerationReply, GenerationRequest, ResponseGenerator};
use crate::error::GenerationError;
use crate::prompt::{SYSTEM_PROMPT, render_user_message};
use async_trait::async_trait;
use huddle_conversation::PriorTurns;
use huddle_core::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// The role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instructions.
    System,
    /// User/human message.
    User,
    /// Assistant/AI message.
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Who is speaking.
    pub role: ChatRole,
    /// What they said.
    pub content: String,
}

impl ChatTurn {
    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatTurn>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatTurn,
}

/// Connection settings for the Ollama backend.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL of the API, e.g. `http://localhost:11434`.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Upper bound on a single request.
    pub request_timeout: Duration,
}

/// Generates replies through `POST {base_url}/api/chat`.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaGenerator {
    /// Creates a generator with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: OllamaConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GenerationError::BackendUnavailable {
                reason: e.to_string(),
            })?;

        Ok(Self { client, config })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.base_url.trim_end_matches('/'))
    }

    fn chat_request<'a>(&'a self, request: &GenerationRequest) -> ChatRequest<'a> {
        let mut messages = vec![ChatTurn::new(ChatRole::System, SYSTEM_PROMPT)];
        messages.extend(history_from(&request.context.prior_turns));
        messages.push(ChatTurn::new(ChatRole::User, render_user_message(request)));

        ChatRequest {
            model: &self.config.model,
            messages,
            stream: false,
        }
    }
}

/// Reads stored turns back. Anything that is not a list of turns is
/// treated as no history.
fn history_from(prior_turns: &PriorTurns) -> Vec<ChatTurn> {
    serde_json::from_value(prior_turns.as_value().clone()).unwrap_or_default()
}

/// Appends a question and its reply to the stored turns.
fn fold_reply(
    prior_turns: &PriorTurns,
    question: &str,
    reply: &str,
) -> std::result::Result<PriorTurns, GenerationError> {
    let mut history = history_from(prior_turns);
    history.push(ChatTurn::new(ChatRole::User, question));
    history.push(ChatTurn::new(ChatRole::Assistant, reply));

    serde_json::to_value(history)
        .map(PriorTurns::new)
        .map_err(|e| GenerationError::ResponseParseFailed {
            reason: e.to_string(),
        })
}

#[async_trait]
impl ResponseGenerator for OllamaGenerator {
    #[instrument(skip_all, fields(model = %self.config.model, channel_id = %request.context.channel_id))]
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationReply, GenerationError> {
        if request.question.trim().is_empty() {
            return Err(GenerationError::InvalidRequest {
                reason: "there is no question to answer".to_string(),
            }
            .into());
        }

        let response = self
            .client
            .post(self.chat_url())
            .json(&self.chat_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    GenerationError::BackendUnavailable {
                        reason: e.to_string(),
                    }
                } else {
                    GenerationError::RequestFailed {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::RequestFailed {
                reason: format!("status {status}: {body}"),
            }
            .into());
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| GenerationError::ResponseParseFailed {
                    reason: e.to_string(),
                })?;

        let text = parsed.message.content;
        if text.trim().is_empty() {
            return Err(GenerationError::ResponseParseFailed {
                reason: "the model returned an empty reply".to_string(),
            }
            .into());
        }

        let prior_turns = fold_reply(&request.context.prior_turns, &request.question, &text)?;
        debug!(reply_chars = text.chars().count(), "generated reply");

        Ok(GenerationReply { text, prior_turns })
    }
}
