//! Fan-out of generation notifications.

use studio_types::GenerationCreated;
use tokio::sync::broadcast;
use tracing::trace;

const EVENT_CAPACITY: usize = 64;

/// Broadcast sink for [`GenerationCreated`] events.
///
/// Subscribing registers an observer; dropping the receiver unregisters it.
/// Publishing never fails because of an individual subscriber.
#[derive(Clone)]
pub struct GenerationEvents {
    tx: broadcast::Sender<GenerationCreated>,
}

impl Default for GenerationEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    /// Register a new observer.
    pub fn subscribe(&self) -> broadcast::Receiver<GenerationCreated> {
        self.tx.subscribe()
    }

    /// Publish to every current observer.
    pub fn publish(&self, event: GenerationCreated) {
        // Err only means nobody is listening.
        let delivered = self.tx.send(event).unwrap_or(0);
        trace!(target: "studio::generation", "Generation event delivered to {} subscribers", delivered);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
