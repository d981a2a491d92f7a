//! Clipboard exposure manager (controller side).
//!
//! The backend owns the auto-clear timer; this side only issues the
//! commands, turns copy failures into events, and tracks the exposure
//! window of the most recent copy.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::events::EventHub;
use crate::gateway::SharedGateway;
use crate::lock_unpoisoned;
use crate::model::ControllerEvent;

/// Default window after which the backend clears the clipboard.
pub const DEFAULT_EXPOSURE_WINDOW: Duration = Duration::from_secs(30);

/// Issues copy/clear commands and tracks the exposure window.
#[derive(Clone)]
pub struct ClipboardExposure {
    gateway: SharedGateway,
    events: EventHub,
    window: Duration,
    last_copy: Arc<Mutex<Option<Instant>>>,
}

impl ClipboardExposure {
    /// `window` should match the backend's auto-clear timeout.
    #[must_use]
    pub fn new(gateway: SharedGateway, events: EventHub, window: Duration) -> Self {
        Self {
            gateway,
            events,
            window,
            last_copy: Arc::new(Mutex::new(None)),
        }
    }

    /// Ask the backend to copy the secret stored under `name`.
    ///
    /// Fire-and-forget: a failure is logged and emitted as
    /// [`ControllerEvent::ClipboardCopyFailed`]. Returns whether the copy
    /// succeeded.
    pub async fn copy(&self, name: &str) -> bool {
        match self.gateway.copy_to_clipboard(name).await {
            Ok(()) => {
                *lock_unpoisoned(&self.last_copy) = Some(Instant::now());
                tracing::debug!(name, "secret copied to clipboard");
                true
            }
            Err(e) => {
                tracing::warn!(name, "copy to clipboard failed: {e}");
                self.events.emit(ControllerEvent::ClipboardCopyFailed {
                    name: name.to_string(),
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    /// Clear the clipboard now. Idempotent; a backend failure is logged.
    pub async fn clear(&self) {
        if let Err(e) = self.gateway.clear_clipboard().await {
            tracing::warn!("clipboard clear failed: {e}");
        }
        self.forget();
    }

    /// Time left before the backend clears the clipboard, if a copy is
    /// still exposed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        let copied_at = (*lock_unpoisoned(&self.last_copy))?;
        let left = self.window.saturating_sub(copied_at.elapsed());
        (!left.is_zero()).then_some(left)
    }

    /// Drop the exposure record (the backend cleared the clipboard).
    pub fn forget(&self) {
        *lock_unpoisoned(&self.last_copy) = None;
    }
}

impl std::fmt::Debug for ClipboardExposure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipboardExposure")
            .field("window", &self.window)
            .field("remaining", &self.remaining())
            .finish_non_exhaustive()
    }
}
