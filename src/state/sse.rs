use tokio::sync::broadcast;
use tracing::trace;

use crate::dto::sse::ServerEvent;

/// Fan-out point for server-sent events. Slow subscribers lose the oldest events.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            sender: broadcast::channel(capacity).0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Publish to whoever is listening. Returns how many subscribers got the event.
    pub fn broadcast(&self, event: ServerEvent) -> usize {
        let kind = event.event.clone();
        let delivered = self.sender.send(event).unwrap_or(0);
        trace!(event = ?kind, delivered, "sse event published");
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
