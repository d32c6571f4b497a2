//! Decides when to start a conversation and when to reply within one.
//!
//! The rules are plain heuristics tuned by hand. They make no attempt at
//! understanding the text; [`ResponseDecider::looks_like_followup`] in
//! particular is simple pattern matching kept in one place so it can be
//! swapped for something smarter without touching the rest.

use crate::message::InboundMessage;
use crate::store::ChannelConversation;
use chrono::{DateTime, Utc};
use huddle_core::UserId;
use std::fmt;
use std::time::Duration;

/// Default window after a reply during which followups are answered.
pub const DEFAULT_FOLLOWUP_WINDOW: Duration = Duration::from_secs(60);

/// Openers that mark a message as continuing the previous exchange.
const CONTINUATION_PREFIXES: [&str; 6] = [
    "and ",
    "also ",
    "what about ",
    "how about ",
    "why ",
    "but ",
];

/// Short questions count as followups below this many words.
const SHORT_QUESTION_WORDS: usize = 10;

/// Why a conversation was (or was not) started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartReason {
    /// The assistant was mentioned.
    ExplicitMention,
    /// The message replies to one of the assistant's messages.
    ReplyToBot,
    /// Nothing addressed the assistant.
    NoTrigger,
}

impl StartReason {
    /// Stable name for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExplicitMention => "explicit_mention",
            Self::ReplyToBot => "reply_to_bot",
            Self::NoTrigger => "no_trigger",
        }
    }
}

impl fmt::Display for StartReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a message in a live conversation did (or did not) get a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespondReason {
    /// The assistant was mentioned or replied to.
    ExplicitTrigger,
    /// A followup-shaped message arrived shortly after the assistant spoke.
    RecentFollowup,
    /// Neither rule matched.
    NoTrigger,
}

impl RespondReason {
    /// Stable name for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExplicitTrigger => "explicit_trigger",
            Self::RecentFollowup => "recent_followup",
            Self::NoTrigger => "no_trigger",
        }
    }
}

impl fmt::Display for RespondReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stateless response policy.
#[derive(Debug, Clone, Copy)]
pub struct ResponseDecider {
    followup_window: Duration,
}

impl Default for ResponseDecider {
    fn default() -> Self {
        Self::new(DEFAULT_FOLLOWUP_WINDOW)
    }
}

impl ResponseDecider {
    /// Creates a decider answering followups for `followup_window` after
    /// the assistant last spoke.
    #[must_use]
    pub fn new(followup_window: Duration) -> Self {
        Self { followup_window }
    }

    /// The configured followup window.
    #[must_use]
    pub fn followup_window(&self) -> Duration {
        self.followup_window
    }

    /// True if the message mentions the assistant or replies to it.
    ///
    /// Only explicit triggers may start a conversation.
    #[must_use]
    pub fn is_explicit_trigger(&self, message: &InboundMessage, bot_id: UserId) -> bool {
        message.mentions_user(bot_id) || message.replies_to_user(bot_id)
    }

    /// Should this message start a new conversation?
    ///
    /// A mention wins over a reply when both are present.
    #[must_use]
    pub fn should_start_conversation(
        &self,
        message: &InboundMessage,
        bot_id: UserId,
    ) -> (bool, StartReason) {
        if message.mentions_user(bot_id) {
            return (true, StartReason::ExplicitMention);
        }

        if message.replies_to_user(bot_id) {
            return (true, StartReason::ReplyToBot);
        }

        (false, StartReason::NoTrigger)
    }

    /// Seconds elapsed since the assistant last replied, if it has.
    #[must_use]
    pub fn seconds_since_bot_spoke(&self, conversation: &ChannelConversation) -> Option<f64> {
        self.seconds_since_bot_spoke_at(conversation, Utc::now())
    }

    /// Like [`seconds_since_bot_spoke`](Self::seconds_since_bot_spoke), measured at `now`.
    #[must_use]
    pub fn seconds_since_bot_spoke_at(
        &self,
        conversation: &ChannelConversation,
        now: DateTime<Utc>,
    ) -> Option<f64> {
        conversation
            .last_bot_response()
            .map(|spoke| (now - spoke).num_milliseconds() as f64 / 1000.0)
    }

    /// Crude check for messages that continue the previous exchange.
    ///
    /// True for short questions, or for messages opening with a
    /// continuation word such as "and" or "why".
    #[must_use]
    pub fn looks_like_followup(&self, message: &InboundMessage) -> bool {
        let content = message.content.to_lowercase();

        let short_question =
            content.split_whitespace().count() < SHORT_QUESTION_WORDS && content.contains('?');

        short_question
            || CONTINUATION_PREFIXES
                .iter()
                .any(|prefix| content.starts_with(prefix))
    }

    /// Should the assistant reply to a message in a live conversation?
    #[must_use]
    pub fn should_respond(
        &self,
        message: &InboundMessage,
        conversation: &ChannelConversation,
        bot_id: UserId,
    ) -> (bool, RespondReason) {
        self.should_respond_at(message, conversation, bot_id, Utc::now())
    }

    /// Like [`should_respond`](Self::should_respond), evaluating the
    /// followup window at `now`.
    #[must_use]
    pub fn should_respond_at(
        &self,
        message: &InboundMessage,
        conversation: &ChannelConversation,
        bot_id: UserId,
        now: DateTime<Utc>,
    ) -> (bool, RespondReason) {
        if self.is_explicit_trigger(message, bot_id) {
            return (true, RespondReason::ExplicitTrigger);
        }

        let recently_spoke = self
            .seconds_since_bot_spoke_at(conversation, now)
            .is_some_and(|elapsed| elapsed <= self.followup_window.as_secs_f64());

        if recently_spoke && self.looks_like_followup(message) {
            return (true, RespondReason::RecentFollowup);
        }

        (false, RespondReason::NoTrigger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::PriorTurns;
    use crate::message::ReplyReference;
    use crate::store::ConversationStore;
    use chrono::TimeDelta;
    use huddle_core::{ChannelId, MessageId};

    const BOT: UserId = UserId::new(999);
    const HUMAN: UserId = UserId::new(456);
    const CHANNEL: ChannelId = ChannelId::new(123);

    fn message(content: &str) -> InboundMessage {
        InboundMessage::new(MessageId::new(1), CHANNEL, "TestUser", HUMAN, content)
    }

    fn reply_to(author: UserId) -> ReplyReference {
        ReplyReference {
            message_id: MessageId::new(7),
            author_id: Some(author),
        }
    }

    /// A conversation whose assistant replied `ago` before the returned instant.
    fn conversation_with_bot_reply(ago: Option<TimeDelta>) -> (ChannelConversation, DateTime<Utc>) {
        let mut store = ConversationStore::new(Duration::from_secs(600));
        let t0 = Utc::now();
        store.start_at(CHANNEL, &[], t0);
        let now = match ago {
            Some(ago) => {
                store.record_bot_response_at(CHANNEL, PriorTurns::default(), t0);
                t0 + ago
            }
            None => t0,
        };
        let conv = store.get_at(CHANNEL, t0).expect("live").clone();
        (conv, now)
    }

    #[test]
    fn start_on_explicit_mention() {
        let decider = ResponseDecider::default();
        let msg = message("<@999> hello").mentioning(BOT);

        assert_eq!(
            decider.should_start_conversation(&msg, BOT),
            (true, StartReason::ExplicitMention)
        );
    }

    #[test]
    fn start_on_reply_to_bot() {
        let decider = ResponseDecider::default();
        let msg = message("thanks").replying_to(reply_to(BOT));

        assert_eq!(
            decider.should_start_conversation(&msg, BOT),
            (true, StartReason::ReplyToBot)
        );
    }

    #[test]
    fn mention_takes_precedence_over_reply() {
        let decider = ResponseDecider::default();
        let msg = message("<@999> again")
            .mentioning(BOT)
            .replying_to(reply_to(BOT));

        let (start, reason) = decider.should_start_conversation(&msg, BOT);
        assert!(start);
        assert_eq!(reason.as_str(), "explicit_mention");
    }

    #[test]
    fn no_start_without_trigger() {
        let decider = ResponseDecider::default();

        assert_eq!(
            decider.should_start_conversation(&message("hello everyone"), BOT),
            (false, StartReason::NoTrigger)
        );
    }

    #[test]
    fn no_start_on_reply_to_other_user() {
        let decider = ResponseDecider::default();
        let msg = message("agreed").replying_to(reply_to(UserId::new(789)));

        assert_eq!(
            decider.should_start_conversation(&msg, BOT),
            (false, StartReason::NoTrigger)
        );
    }

    #[test]
    fn mention_of_someone_else_is_not_a_trigger() {
        let decider = ResponseDecider::default();
        let msg = message("<@789> hi").mentioning(UserId::new(789));

        assert!(!decider.is_explicit_trigger(&msg, BOT));
    }

    #[test]
    fn respond_to_explicit_mention() {
        let decider = ResponseDecider::default();
        let (conv, now) = conversation_with_bot_reply(None);
        let msg = message("<@999> what's up").mentioning(BOT);

        assert_eq!(
            decider.should_respond_at(&msg, &conv, BOT, now),
            (true, RespondReason::ExplicitTrigger)
        );
    }

    #[test]
    fn respond_to_reply() {
        let decider = ResponseDecider::default();
        let (conv, now) = conversation_with_bot_reply(None);
        let msg = message("what do you mean").replying_to(reply_to(BOT));

        assert_eq!(
            decider.should_respond_at(&msg, &conv, BOT, now),
            (true, RespondReason::ExplicitTrigger)
        );
    }

    #[test]
    fn respond_to_recent_followup() {
        let decider = ResponseDecider::new(Duration::from_secs(60));
        let (conv, now) = conversation_with_bot_reply(Some(TimeDelta::seconds(30)));

        assert_eq!(
            decider.should_respond_at(&message("Why?"), &conv, BOT, now),
            (true, RespondReason::RecentFollowup)
        );
    }

    #[test]
    fn followup_at_window_edge_is_answered() {
        let decider = ResponseDecider::new(Duration::from_secs(60));
        let (conv, now) = conversation_with_bot_reply(Some(TimeDelta::seconds(60)));

        assert_eq!(
            decider.should_respond_at(&message("and then?"), &conv, BOT, now),
            (true, RespondReason::RecentFollowup)
        );
    }

    #[test]
    fn no_response_when_bot_spoke_too_long_ago() {
        let decider = ResponseDecider::new(Duration::from_secs(60));
        let (conv, now) = conversation_with_bot_reply(Some(TimeDelta::seconds(90)));

        let (respond, reason) = decider.should_respond_at(&message("Why?"), &conv, BOT, now);
        assert!(!respond);
        assert_eq!(reason.as_str(), "no_trigger");
    }

    #[test]
    fn no_response_when_not_followup() {
        let decider = ResponseDecider::new(Duration::from_secs(60));
        let (conv, now) = conversation_with_bot_reply(Some(TimeDelta::seconds(10)));
        let msg = message("This is a long message that doesn't look like a followup question at all");

        assert_eq!(
            decider.should_respond_at(&msg, &conv, BOT, now),
            (false, RespondReason::NoTrigger)
        );
    }

    #[test]
    fn no_response_when_bot_never_spoke() {
        let decider = ResponseDecider::new(Duration::from_secs(60));
        let (conv, now) = conversation_with_bot_reply(None);

        assert_eq!(
            decider.should_respond_at(&message("Why?"), &conv, BOT, now),
            (false, RespondReason::NoTrigger)
        );
    }

    #[test]
    fn followup_short_question() {
        let decider = ResponseDecider::default();
        assert!(decider.looks_like_followup(&message("Why?")));
    }

    #[test]
    fn followup_continuation_words() {
        let decider = ResponseDecider::default();

        for content in [
            "and what about that?",
            "Also how does it work",
            "what about the other one",
            "How about this",
            "why is that",
            "but what if",
        ] {
            assert!(
                decider.looks_like_followup(&message(content)),
                "failed for: {content}"
            );
        }
    }

    #[test]
    fn not_followup() {
        let decider = ResponseDecider::default();

        for content in [
            "This is a long message that doesn't look like a followup",
            "Just a regular statement",
            "No question mark here",
            "Could you please explain to me in a lot of detail how this works?",
        ] {
            assert!(
                !decider.looks_like_followup(&message(content)),
                "failed for: {content}"
            );
        }
    }

    #[test]
    fn seconds_since_bot_spoke() {
        let decider = ResponseDecider::default();
        let (conv, now) = conversation_with_bot_reply(Some(TimeDelta::seconds(45)));

        let elapsed = decider
            .seconds_since_bot_spoke_at(&conv, now)
            .expect("bot has spoken");
        assert!((elapsed - 45.0).abs() < 0.001);
    }

    #[test]
    fn seconds_since_bot_spoke_none() {
        let decider = ResponseDecider::default();
        let (conv, now) = conversation_with_bot_reply(None);

        assert!(decider.seconds_since_bot_spoke_at(&conv, now).is_none());
    }
}
