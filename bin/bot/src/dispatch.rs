//! Per-channel dispatch of inbound events.
//!
//! Each channel gets one worker task fed by an unbounded queue. Events for
//! a channel are handled strictly in arrival order while channels proceed
//! independently of each other.

use crate::handler::MessageHandler;
use huddle_core::ChannelId;
use huddle_platform::InboundEvent;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Routes events to their channel's worker.
pub struct Dispatcher {
    handler: Arc<MessageHandler>,
    queues: HashMap<ChannelId, mpsc::UnboundedSender<InboundEvent>>,
    workers: JoinSet<()>,
}

impl Dispatcher {
    /// Creates a dispatcher with no workers yet.
    #[must_use]
    pub fn new(handler: Arc<MessageHandler>) -> Self {
        Self {
            handler,
            queues: HashMap::new(),
            workers: JoinSet::new(),
        }
    }

    /// Queues an event behind everything already queued for its channel.
    pub fn dispatch(&mut self, event: InboundEvent) {
        let channel_id = event.channel_id();

        let event = match self.queues.get(&channel_id) {
            Some(queue) => match queue.send(event) {
                Ok(()) => return,
                Err(mpsc::error::SendError(event)) => {
                    warn!(%channel_id, "channel worker stopped, starting a new one");
                    event
                }
            },
            None => event,
        };

        let (queue, events) = mpsc::unbounded_channel();
        self.workers
            .spawn(run_channel(Arc::clone(&self.handler), channel_id, events));
        if queue.send(event).is_err() {
            error!(%channel_id, "new channel worker exited before its first event");
        }
        self.queues.insert(channel_id, queue);
    }

    /// Closes every queue and waits for the workers to drain them.
    pub async fn shutdown(&mut self) {
        self.queues.clear();
        while let Some(finished) = self.workers.join_next().await {
            if let Err(e) = finished {
                error!(error = %e, "channel worker failed");
            }
        }
    }

    /// Stops every worker without draining its queue.
    pub async fn abort(&mut self) {
        self.queues.clear();
        self.workers.shutdown().await;
    }
}

async fn run_channel(
    handler: Arc<MessageHandler>,
    channel_id: ChannelId,
    mut events: mpsc::UnboundedReceiver<InboundEvent>,
) {
    debug!(%channel_id, "channel worker started");
    while let Some(event) = events.recv().await {
        match event {
            InboundEvent::Message(message) => {
                handler.handle(message).await;
            }
            InboundEvent::EndConversation(_) => {
                handler.end_conversation(channel_id).await;
            }
        }
    }
    debug!(%channel_id, "channel worker stopped");
}
