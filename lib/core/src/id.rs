//! Strongly-typed ID types for domain entities.
//!
//! Platform entities (channels, users, messages, guilds) are identified by
//! 64-bit snowflakes handed to us by the chat platform. Conversations are
//! ours, and use ULIDs so they sort by start time in logs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to generate a strongly-typed wrapper around a platform snowflake.
macro_rules! define_snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw snowflake value.
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the raw snowflake value.
            #[must_use]
            pub const fn get(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        reason: e.to_string(),
                    })
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_snowflake!(
    /// Identifier of a text channel on the chat platform.
    ChannelId
);

define_snowflake!(
    /// Identifier of a user (human or bot) on the chat platform.
    UserId
);

define_snowflake!(
    /// Identifier of a single message on the chat platform.
    MessageId
);

define_snowflake!(
    /// Identifier of a guild (server) on the chat platform.
    GuildId
);

/// Unique identifier for one conversation in a channel.
///
/// A channel can host many conversations over its lifetime; each start
/// mints a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(Ulid);

impl ConversationId {
    /// Creates a new ID with a randomly generated ULID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Returns the underlying ULID.
    #[must_use]
    pub const fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conv_{}", self.0)
    }
}

impl FromStr for ConversationId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid_str = s.strip_prefix("conv_").unwrap_or(s);

        Ulid::from_str(ulid_str)
            .map(Self)
            .map_err(|e| ParseIdError {
                id_type: "ConversationId",
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflake_display_is_bare_number() {
        let id = ChannelId::new(1_234_567_890);
        assert_eq!(id.to_string(), "1234567890");
    }

    #[test]
    fn snowflake_parse() {
        let id: UserId = " 42 ".parse().expect("should parse");
        assert_eq!(id.get(), 42);
    }

    #[test]
    fn snowflake_parse_invalid() {
        let result: Result<UserId, _> = "not_a_number".parse();
        let err = result.unwrap_err();
        assert_eq!(err.id_type, "UserId");
    }

    #[test]
    fn conversation_id_display_format() {
        let id = ConversationId::new();
        assert!(id.to_string().starts_with("conv_"));
    }

    #[test]
    fn conversation_id_parse_with_and_without_prefix() {
        let id = ConversationId::new();
        let parsed: ConversationId = id.to_string().parse().expect("should parse");
        assert_eq!(id, parsed);

        let raw: ConversationId = id.as_ulid().to_string().parse().expect("should parse");
        assert_eq!(id, raw);
    }

    #[test]
    fn conversation_ids_are_unique() {
        use std::collections::HashSet;

        let ids: HashSet<_> = (0..16).map(|_| ConversationId::new()).collect();
        assert_eq!(ids.len(), 16);
    }

    #[test]
    fn id_serde_is_transparent() {
        let id = MessageId::new(99);
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "99");
        let parsed: MessageId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, parsed);
    }
}
