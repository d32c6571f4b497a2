//! Prompt text for reply generation.

use crate::backend::{GenerationContext, GenerationRequest};
use huddle_conversation::MessageRecord;

/// System prompt for the chat assistant.
pub const SYSTEM_PROMPT: &str = "You are a helpful productivity assistant taking part in a \
group chat channel.

You are given the channel's recent messages as context. Use them to answer the user's \
question, and say so plainly if they do not contain the answer.

Guidelines:
- Be helpful and conversational
- Cite specific messages when relevant (e.g., \"User X mentioned...\")
- Keep responses focused and relevant to the question";

/// Question used when a message addresses the assistant without asking
/// anything.
pub const INFERRED_QUESTION: &str = "What is the user asking about based on the recent \
messages in this channel? Please infer the question from the conversation context.";

/// Renders one message as a transcript line.
#[must_use]
pub fn format_record(record: &MessageRecord) -> String {
    format!(
        "[{}] {}: {}",
        record.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        record.author,
        record.content
    )
}

/// Renders where the question was asked and the recent transcript.
#[must_use]
pub fn render_context(context: &GenerationContext) -> String {
    let mut lines = vec![format!(
        "Channel: #{} (id {})",
        context.channel_name, context.channel_id
    )];

    if let Some(guild_name) = &context.guild_name {
        match context.guild_id {
            Some(guild_id) => lines.push(format!("Server: {guild_name} (id {guild_id})")),
            None => lines.push(format!("Server: {guild_name}")),
        }
    }
    lines.push(format!("User: {}", context.user_name));

    if !context.recent_messages.is_empty() {
        lines.push(String::new());
        lines.push("Recent messages in this channel:".to_string());
        lines.extend(context.recent_messages.iter().map(format_record));
    }

    lines.join("\n")
}

/// Renders the user turn sent to the model: context followed by the question.
#[must_use]
pub fn render_user_message(request: &GenerationRequest) -> String {
    format!(
        "{}\n\nQuestion: {}",
        render_context(&request.context),
        request.question
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use huddle_conversation::PriorTurns;
    use huddle_core::{ChannelId, GuildId, UserId};

    fn context(recent_messages: Vec<MessageRecord>) -> GenerationContext {
        GenerationContext {
            channel_id: ChannelId::new(10),
            channel_name: "general".to_string(),
            guild_id: Some(GuildId::new(20)),
            guild_name: Some("Makers".to_string()),
            user_name: "alice".to_string(),
            recent_messages,
            prior_turns: PriorTurns::default(),
        }
    }

    #[test]
    fn record_line_format() {
        let at = Utc
            .with_ymd_and_hms(2024, 3, 9, 14, 5, 7)
            .single()
            .expect("valid timestamp");
        let record = MessageRecord::new("bob", UserId::new(1), "ship it", at);

        assert_eq!(format_record(&record), "[2024-03-09 14:05:07 UTC] bob: ship it");
    }

    #[test]
    fn context_lists_channel_server_user_and_transcript() {
        let record = MessageRecord::new("bob", UserId::new(1), "ship it", Utc::now());
        let rendered = render_context(&context(vec![record]));

        assert!(rendered.starts_with("Channel: #general (id 10)"));
        assert!(rendered.contains("Server: Makers (id 20)"));
        assert!(rendered.contains("User: alice"));
        assert!(rendered.contains("bob: ship it"));
    }

    #[test]
    fn context_without_messages_has_no_transcript_header() {
        let rendered = render_context(&context(Vec::new()));
        assert!(!rendered.contains("Recent messages"));
    }

    #[test]
    fn user_message_ends_with_question() {
        let request = GenerationRequest {
            question: "what shipped?".to_string(),
            context: context(Vec::new()),
        };

        assert!(render_user_message(&request).ends_with("Question: what shipped?"));
    }
}
