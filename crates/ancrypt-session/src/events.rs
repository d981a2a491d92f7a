//! Broadcast channel carrying [`ControllerEvent`]s to the UI layer.

use tokio::sync::broadcast;

use crate::model::ControllerEvent;

/// Buffered events per subscriber before the oldest are dropped.
pub const EVENT_CAPACITY: usize = 64;

/// Cloneable sender side of the controller event stream.
#[derive(Debug, Clone)]
pub struct EventHub {
    tx: broadcast::Sender<ControllerEvent>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    /// Create a hub with [`EVENT_CAPACITY`] slots.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    /// Subscribe to events emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event. Having no subscriber is not an error.
    pub fn emit(&self, event: ControllerEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("controller event dropped: no subscribers");
        }
    }
}
