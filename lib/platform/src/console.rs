//! Local console transport.
//!
//! Stands in for a chat platform when running huddle from a terminal. The
//! console is a single channel shared by one human and the assistant:
//!
//! - `@<assistant name>` anywhere in a line mentions the assistant
//! - a line starting with `>` replies to the assistant's latest message
//! - `/end` closes the current conversation
//!
//! Everything typed or sent is kept in a bounded in-memory log that backs
//! [`HistoryBackfill`].

use crate::error::PlatformError;
use crate::history::HistoryQuery;
use crate::traits::{DeliverySink, HistoryBackfill, InboundEvent, InboundStream};
use async_trait::async_trait;
use chrono::Utc;
use huddle_conversation::{InboundMessage, MessageRecord, ReplyReference};
use huddle_core::{ChannelId, MessageId, Result, UserId};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::warn;

/// The console's only channel.
pub const CONSOLE_CHANNEL: ChannelId = ChannelId::new(1);

/// The human typing at the console.
pub const CONSOLE_USER: UserId = UserId::new(2);

const HISTORY_CAPACITY: usize = 200;

/// Names and ids used by the console.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Display name of the console channel.
    pub channel_name: String,
    /// Display name of the human user.
    pub user_name: String,
    /// The assistant's user id.
    pub bot_id: UserId,
    /// The assistant's display name, also its mention handle.
    pub bot_name: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            channel_name: "console".to_string(),
            user_name: "you".to_string(),
            bot_id: UserId::new(3),
            bot_name: "huddle".to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct ConsoleLog {
    records: VecDeque<MessageRecord>,
    last_bot_message: Option<MessageId>,
}

impl ConsoleLog {
    fn push(&mut self, record: MessageRecord) {
        if self.records.len() == HISTORY_CAPACITY {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }
}

/// Terminal-backed message source, history and delivery sink.
#[derive(Debug)]
pub struct ConsoleTransport {
    config: ConsoleConfig,
    log: Mutex<ConsoleLog>,
    next_id: AtomicU64,
}

impl ConsoleTransport {
    /// Creates a console transport with an empty history.
    #[must_use]
    pub fn new(config: ConsoleConfig) -> Self {
        Self {
            config,
            log: Mutex::new(ConsoleLog::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// The console's configuration.
    #[must_use]
    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Turns lines read from `reader` into inbound events.
    ///
    /// The stream ends at end of input or on the first read error.
    pub fn events<R>(self: Arc<Self>, reader: R) -> InboundStream
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let stream = futures::stream::unfold(
            (reader.lines(), self),
            |(mut lines, transport)| async move {
                loop {
                    match lines.next_line().await {
                        Ok(Some(line)) => {
                            if let Some(event) = transport.parse_line(&line).await {
                                return Some((event, (lines, transport)));
                            }
                        }
                        Ok(None) => return None,
                        Err(e) => {
                            let err = PlatformError::InputFailed {
                                reason: e.to_string(),
                            };
                            warn!(error = %err, "console input closed");
                            return None;
                        }
                    }
                }
            },
        );

        Box::pin(stream)
    }

    /// Interprets one line of console input.
    ///
    /// Blank lines produce nothing. Messages are added to the history log.
    pub async fn parse_line(&self, line: &str) -> Option<InboundEvent> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if line.eq_ignore_ascii_case("/end") {
            return Some(InboundEvent::EndConversation(CONSOLE_CHANNEL));
        }

        let mut log = self.log.lock().await;

        let (content, reply_to) = match line.strip_prefix('>') {
            Some(rest) => {
                let reference = log.last_bot_message.map(|message_id| ReplyReference {
                    message_id,
                    author_id: Some(self.config.bot_id),
                });
                (rest.trim(), reference)
            }
            None => (line, None),
        };

        let handle = format!("@{}", self.config.bot_name);
        let mentioned = content.contains(&handle);
        // Rewrite the handle into the platform's mention markup.
        let content = content.replace(&handle, &format!("<@{}>", self.config.bot_id));

        let mut message = InboundMessage::new(
            self.next_message_id(),
            CONSOLE_CHANNEL,
            &self.config.user_name,
            CONSOLE_USER,
            content,
        )
        .in_channel(&self.config.channel_name);

        if mentioned {
            message = message.mentioning(self.config.bot_id);
        }
        if let Some(reference) = reply_to {
            message = message.replying_to(reference);
        }

        log.push(message.to_record());
        Some(InboundEvent::Message(message))
    }

    fn next_message_id(&self) -> MessageId {
        MessageId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn check_channel(&self, channel_id: ChannelId) -> std::result::Result<(), PlatformError> {
        if channel_id == CONSOLE_CHANNEL {
            Ok(())
        } else {
            Err(PlatformError::DeliveryFailed {
                channel: channel_id,
                reason: "the console only has one channel".to_string(),
            })
        }
    }
}

#[async_trait]
impl HistoryBackfill for ConsoleTransport {
    async fn recent_messages(
        &self,
        channel_id: ChannelId,
        query: &HistoryQuery,
    ) -> Result<Vec<MessageRecord>, PlatformError> {
        if channel_id != CONSOLE_CHANNEL {
            return Err(PlatformError::HistoryUnavailable {
                channel: channel_id,
                reason: "the console only has one channel".to_string(),
            }
            .into());
        }

        let log = self.log.lock().await;
        Ok(log
            .records
            .iter()
            .rev()
            .filter(|record| query.admits(record))
            .take(query.limit())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DeliverySink for ConsoleTransport {
    async fn send(&self, channel_id: ChannelId, chunks: &[String]) -> Result<(), PlatformError> {
        self.check_channel(channel_id)?;

        let delivery_failed = |e: std::io::Error| PlatformError::DeliveryFailed {
            channel: channel_id,
            reason: e.to_string(),
        };

        let mut stdout = tokio::io::stdout();
        for chunk in chunks {
            let line = format!("{}: {chunk}\n", self.config.bot_name);
            stdout
                .write_all(line.as_bytes())
                .await
                .map_err(delivery_failed)?;

            let id = self.next_message_id();
            let mut log = self.log.lock().await;
            log.push(
                MessageRecord::new(&self.config.bot_name, self.config.bot_id, chunk, Utc::now())
                    .from_bot(),
            );
            log.last_bot_message = Some(id);
        }
        stdout.flush().await.map_err(delivery_failed)?;

        Ok(())
    }

    async fn report_error(
        &self,
        debug_channel: &str,
        origin: ChannelId,
        detail: &str,
    ) -> Result<(), PlatformError> {
        let text = format!("[#{debug_channel}] error in channel {origin}:\n{detail}\n");

        let mut stderr = tokio::io::stderr();
        stderr
            .write_all(text.as_bytes())
            .await
            .map_err(|e| PlatformError::DeliveryFailed {
                channel: origin,
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MAX_LIMIT;
    use chrono::TimeDelta;
    use futures::StreamExt;

    fn transport() -> ConsoleTransport {
        ConsoleTransport::new(ConsoleConfig::default())
    }

    fn query(limit: usize) -> HistoryQuery {
        HistoryQuery::hours_back(1, limit).expect("valid query")
    }

    fn expect_message(event: Option<InboundEvent>) -> InboundMessage {
        match event {
            Some(InboundEvent::Message(message)) => message,
            other => panic!("expected a message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn plain_line_is_a_message() {
        let console = transport();

        let message = expect_message(console.parse_line("hello there").await);

        assert_eq!(message.channel_id, CONSOLE_CHANNEL);
        assert_eq!(message.author_id, CONSOLE_USER);
        assert_eq!(message.content, "hello there");
        assert!(message.mentions.is_empty());
        assert!(message.reply_to.is_none());
    }

    #[tokio::test]
    async fn handle_becomes_mention() {
        let console = transport();

        let message = expect_message(console.parse_line("@huddle what's new?").await);

        assert!(message.mentions_user(UserId::new(3)));
        assert_eq!(message.content, "<@3> what's new?");
    }

    #[tokio::test]
    async fn blank_lines_are_skipped() {
        let console = transport();
        assert!(console.parse_line("   ").await.is_none());
    }

    #[tokio::test]
    async fn end_command() {
        let console = transport();

        let event = console.parse_line("/end").await;

        assert!(matches!(
            event,
            Some(InboundEvent::EndConversation(channel)) if channel == CONSOLE_CHANNEL
        ));
        assert_eq!(event.map(|e| e.channel_id()), Some(CONSOLE_CHANNEL));
    }

    #[tokio::test]
    async fn reply_before_assistant_spoke_has_no_reference() {
        let console = transport();

        let message = expect_message(console.parse_line("> anyone?").await);

        assert_eq!(message.content, "anyone?");
        assert!(message.reply_to.is_none());
    }

    #[tokio::test]
    async fn reply_targets_latest_assistant_message() {
        let console = transport();
        console
            .send(CONSOLE_CHANNEL, &["first".to_string(), "second".to_string()])
            .await
            .expect("send");

        let message = expect_message(console.parse_line("> why?").await);

        assert!(message.replies_to_user(UserId::new(3)));
    }

    #[tokio::test]
    async fn backfill_is_newest_first_and_limited() {
        let console = transport();
        for line in ["one", "two", "three"] {
            console.parse_line(line).await;
        }

        let history = console
            .recent_messages(CONSOLE_CHANNEL, &query(2))
            .await
            .expect("history");

        let contents: Vec<_> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["three", "two"]);
    }

    #[tokio::test]
    async fn backfill_includes_assistant_messages() {
        let console = transport();
        console.parse_line("@huddle hi").await;
        console
            .send(CONSOLE_CHANNEL, &["hello!".to_string()])
            .await
            .expect("send");

        let history = console
            .recent_messages(CONSOLE_CHANNEL, &query(10))
            .await
            .expect("history");

        assert_eq!(history.len(), 2);
        assert!(history[0].is_bot);
        assert_eq!(history[0].content, "hello!");
    }

    #[tokio::test]
    async fn backfill_skips_messages_older_than_window() {
        let console = transport();
        console.log.lock().await.push(MessageRecord::new(
            "you",
            CONSOLE_USER,
            "from yesterday",
            Utc::now() - TimeDelta::hours(25),
        ));
        console.parse_line("fresh").await;

        let history = console
            .recent_messages(CONSOLE_CHANNEL, &query(10))
            .await
            .expect("history");

        let contents: Vec<_> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["fresh"]);
    }

    #[tokio::test]
    async fn history_is_bounded() {
        let console = transport();
        for i in 0..(HISTORY_CAPACITY + 5) {
            console.parse_line(&format!("line {i}")).await;
        }

        let history = console
            .recent_messages(CONSOLE_CHANNEL, &query(MAX_LIMIT))
            .await
            .expect("history");

        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history[0].content, format!("line {}", HISTORY_CAPACITY + 4));
    }

    #[tokio::test]
    async fn unknown_channel_is_rejected() {
        let console = transport();

        assert!(console
                .recent_messages(ChannelId::new(9), &query(5))
                .await
                .is_err());
        assert!(console.send(ChannelId::new(9), &[]).await.is_err());
    }

    #[tokio::test]
    async fn events_stream_reads_until_eof() {
        let console = Arc::new(transport());
        let input = tokio::io::BufReader::new(&b"hello\n\n@huddle hi\n/end\n"[..]);

        let events: Vec<_> = console.events(input).collect().await;

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], InboundEvent::Message(_)));
        assert!(matches!(events[2], InboundEvent::EndConversation(_)));
    }
}
