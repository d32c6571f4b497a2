//! Bounds for channel history lookups.

use crate::error::PlatformError;
use chrono::{DateTime, TimeDelta, Utc};
use huddle_conversation::MessageRecord;

/// Longest window a history query may cover, in hours (one week).
pub const MAX_HOURS_BACK: u32 = 168;

/// Most messages a history query may return.
pub const MAX_LIMIT: usize = 500;

/// A time window and message cap for fetching channel history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    since: DateTime<Utc>,
    limit: usize,
}

impl HistoryQuery {
    /// Messages from the last `hours` hours, at most `limit` of them.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::InvalidQuery`] unless `hours` is within
    /// `1..=MAX_HOURS_BACK` and `limit` within `1..=MAX_LIMIT`.
    pub fn hours_back(hours: u32, limit: usize) -> Result<Self, PlatformError> {
        Self::hours_back_at(hours, limit, Utc::now())
    }

    /// Like [`hours_back`](Self::hours_back), measured back from `now`.
    ///
    /// # Errors
    ///
    /// Same as [`hours_back`](Self::hours_back).
    pub fn hours_back_at(
        hours: u32,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Self, PlatformError> {
        if !(1..=MAX_HOURS_BACK).contains(&hours) {
            return Err(PlatformError::InvalidQuery {
                reason: format!("hours back must be between 1 and {MAX_HOURS_BACK}, got {hours}"),
            });
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(PlatformError::InvalidQuery {
                reason: format!("limit must be between 1 and {MAX_LIMIT}, got {limit}"),
            });
        }

        Ok(Self {
            since: now - TimeDelta::hours(i64::from(hours)),
            limit,
        })
    }

    /// Oldest timestamp the query admits.
    #[must_use]
    pub fn since(&self) -> DateTime<Utc> {
        self.since
    }

    /// Maximum number of messages to return.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns true if the record falls inside the window.
    #[must_use]
    pub fn admits(&self, record: &MessageRecord) -> bool {
        record.timestamp >= self.since
    }
}
