//! Centralized bot configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables prefixed with `HUDDLE_`, nested with `__`, e.g.
//! `HUDDLE_CONVERSATION__TIMEOUT_SECONDS=300`. Every setting has a default.

use huddle_ai::OllamaConfig;
use huddle_core::UserId;
use huddle_platform::{HistoryQuery, PlatformError};
use serde::Deserialize;
use std::time::Duration;

/// Bot configuration composed from per-concern sections.
#[derive(Debug, Default, Deserialize)]
pub struct BotConfig {
    /// Who the assistant is.
    #[serde(default)]
    pub bot: BotIdentity,

    /// Conversation lifecycle settings.
    #[serde(default)]
    pub conversation: ConversationSettings,

    /// Reply delivery settings.
    #[serde(default)]
    pub delivery: DeliverySettings,

    /// Generation backend settings.
    #[serde(default)]
    pub generation: GenerationSettings,
}

/// The assistant's identity on the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct BotIdentity {
    /// The assistant's user id.
    #[serde(default = "default_bot_user_id")]
    pub user_id: u64,

    /// The assistant's display name.
    #[serde(default = "default_bot_name")]
    pub name: String,
}

/// Conversation lifecycle settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationSettings {
    /// Seconds of inactivity after which a conversation ends.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Seconds after a reply during which followup-shaped messages are answered.
    #[serde(default = "default_followup_window_seconds")]
    pub followup_window_seconds: u64,

    /// How many hours of channel history may seed a new conversation.
    #[serde(default = "default_backfill_hours")]
    pub backfill_hours: u32,

    /// How many past messages seed a new conversation.
    #[serde(default = "default_backfill_limit")]
    pub backfill_limit: usize,

    /// How many of the conversation's latest messages go into each prompt.
    #[serde(default = "default_context_message_limit")]
    pub context_message_limit: usize,
}

/// Reply delivery settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliverySettings {
    /// Maximum characters per delivered message.
    #[serde(default = "default_max_response_length")]
    pub max_response_length: usize,

    /// Channel that receives internal error detail, if any.
    #[serde(default)]
    pub debug_channel_name: Option<String>,
}

/// Generation backend settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationSettings {
    /// Base URL of the Ollama-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Upper bound on a single generation request, in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_bot_user_id() -> u64 {
    3
}

fn default_bot_name() -> String {
    "huddle".to_string()
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_followup_window_seconds() -> u64 {
    60
}

fn default_backfill_hours() -> u32 {
    1
}

fn default_backfill_limit() -> usize {
    20
}

fn default_context_message_limit() -> usize {
    50
}

fn default_max_response_length() -> usize {
    2000
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    60
}

impl Default for BotIdentity {
    fn default() -> Self {
        Self {
            user_id: default_bot_user_id(),
            name: default_bot_name(),
        }
    }
}

impl BotIdentity {
    /// The assistant's user id.
    #[must_use]
    pub fn id(&self) -> UserId {
        UserId::new(self.user_id)
    }
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            followup_window_seconds: default_followup_window_seconds(),
            backfill_hours: default_backfill_hours(),
            backfill_limit: default_backfill_limit(),
            context_message_limit: default_context_message_limit(),
        }
    }
}

impl ConversationSettings {
    /// Inactivity timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Followup window.
    #[must_use]
    pub fn followup_window(&self) -> Duration {
        Duration::from_secs(self.followup_window_seconds)
    }

    /// The history window used to seed new conversations.
    ///
    /// # Errors
    ///
    /// Returns an error if `backfill_hours` or `backfill_limit` is out of
    /// range for a history query.
    pub fn backfill_query(&self) -> Result<HistoryQuery, PlatformError> {
        HistoryQuery::hours_back(self.backfill_hours, self.backfill_limit)
    }
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            max_response_length: default_max_response_length(),
            debug_channel_name: None,
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

impl GenerationSettings {
    /// Connection settings for the Ollama backend.
    #[must_use]
    pub fn ollama(&self) -> OllamaConfig {
        OllamaConfig {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
        }
    }
}

impl BotConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value of the wrong type.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_builder(config::Config::builder().add_source(
            config::Environment::with_prefix("HUDDLE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        ))
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = BotConfig::default();
        assert_eq!(config.conversation.timeout_seconds, 120);
        assert_eq!(config.conversation.followup_window_seconds, 60);
        assert_eq!(config.conversation.backfill_hours, 1);
        assert_eq!(config.conversation.backfill_limit, 20);
        assert_eq!(config.delivery.max_response_length, 2000);
        assert!(config.delivery.debug_channel_name.is_none());
        assert_eq!(config.bot.id(), UserId::new(3));
    }

    #[test]
    fn empty_source_yields_defaults() {
        let config = BotConfig::from_builder(config::Config::builder()).expect("load");
        assert_eq!(config.conversation.timeout(), Duration::from_secs(120));
        assert_eq!(config.generation.model, "llama3.1");
    }

    #[test]
    fn overrides_replace_single_fields() {
        let builder = config::Config::builder()
            .set_override("conversation.timeout_seconds", 300)
            .expect("override")
            .set_override("delivery.debug_channel_name", "bot-debug")
            .expect("override");

        let config = BotConfig::from_builder(builder).expect("load");

        assert_eq!(config.conversation.timeout_seconds, 300);
        assert_eq!(config.conversation.followup_window_seconds, 60);
        assert_eq!(
            config.delivery.debug_channel_name.as_deref(),
            Some("bot-debug")
        );
    }

    #[test]
    fn backfill_settings_are_validated() {
        let mut settings = ConversationSettings::default();
        assert!(settings.backfill_query().is_ok());

        settings.backfill_hours = 169;
        assert!(settings.backfill_query().is_err());

        settings.backfill_hours = 24;
        settings.backfill_limit = 0;
        assert!(settings.backfill_query().is_err());
    }

    #[test]
    fn generation_settings_become_ollama_config() {
        let ollama = GenerationSettings::default().ollama();
        assert_eq!(ollama.base_url, "http://localhost:11434");
        assert_eq!(ollama.request_timeout, Duration::from_secs(60));
    }
}
