//! Per-channel turn serialization.

use huddle_core::ChannelId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async lock per channel.
///
/// Holding a channel's guard gives exclusive use of that channel's
/// conversation for a whole turn, including the generation call. Different
/// channels never wait on each other.
#[derive(Debug, Default)]
pub struct ChannelLocks {
    locks: Mutex<HashMap<ChannelId, Arc<Mutex<()>>>>,
}

impl ChannelLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for the channel's turn.
    pub async fn acquire(&self, channel_id: ChannelId) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(self.locks.lock().await.entry(channel_id).or_default());
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_channel_waits_for_release() {
        let locks = ChannelLocks::new();
        let guard = locks.acquire(ChannelId::new(1)).await;

        let blocked =
            tokio::time::timeout(Duration::from_millis(50), locks.acquire(ChannelId::new(1))).await;
        assert!(blocked.is_err());

        drop(guard);
        let acquired =
            tokio::time::timeout(Duration::from_millis(50), locks.acquire(ChannelId::new(1))).await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn other_channels_are_independent() {
        let locks = ChannelLocks::new();
        let _guard = locks.acquire(ChannelId::new(1)).await;

        let other =
            tokio::time::timeout(Duration::from_millis(50), locks.acquire(ChannelId::new(2))).await;
        assert!(other.is_ok());
    }
}
