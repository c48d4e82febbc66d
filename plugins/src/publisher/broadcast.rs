use agentflow_core::api::{PublishError, StatusEvent, StatusPublisher};
use tokio::sync::broadcast;

/// Fans status events out to any number of in-process subscribers.
///
/// Having no subscriber is not an error; slow subscribers lag and lose the
/// oldest events.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    tx: broadcast::Sender<StatusEvent>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl StatusPublisher for BroadcastPublisher {
    fn name(&self) -> &str {
        "broadcast"
    }

    fn publish(&self, event: &StatusEvent) -> Result<(), PublishError> {
        // send only fails when nobody is listening
        let _ = self.tx.send(event.clone());
        Ok(())
    }
}
