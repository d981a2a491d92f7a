//! Clipboard sinks and the auto-clear guard used by the local backend.
//!
//! The auto-clear timer is a tokio task. Arming a new timer aborts the
//! previous one, so only the most recent copy decides when the clipboard
//! is wiped.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use zeroize::Zeroize;

use crate::lock_unpoisoned;

/// Clipboard access failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    /// The clipboard could not be opened.
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    /// Writing or clearing failed.
    #[error("Clipboard write failed: {0}")]
    Write(String),
}

/// Somewhere secret text can be placed and wiped.
pub trait ClipboardSink: Send + Sync {
    /// Replace the clipboard contents with `text`.
    ///
    /// # Errors
    ///
    /// Returns [`ClipboardError`] if the clipboard cannot be written.
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;

    /// Empty the clipboard.
    ///
    /// # Errors
    ///
    /// Returns [`ClipboardError`] if the clipboard cannot be cleared.
    fn clear(&self) -> Result<(), ClipboardError>;
}

// ── System clipboard ─────────────────────────────────────────────────

/// The OS clipboard via `arboard`. A handle is opened per operation.
#[cfg(feature = "system-clipboard")]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

#[cfg(feature = "system-clipboard")]
impl ClipboardSink for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        clipboard
            .set_text(text.to_owned())
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }

    fn clear(&self) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        // Some platforms reject clear() on an already empty clipboard.
        clipboard
            .clear()
            .or_else(|_| clipboard.set_text(String::new()))
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

// ── In-memory clipboard ──────────────────────────────────────────────

/// Process-local clipboard for headless use and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<Option<String>>>,
}

impl MemoryClipboard {
    /// Empty clipboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        lock_unpoisoned(&self.contents).clone()
    }
}

impl ClipboardSink for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut contents = lock_unpoisoned(&self.contents);
        if let Some(old) = contents.as_mut() {
            old.zeroize();
        }
        *contents = Some(text.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClipboardError> {
        let mut contents = lock_unpoisoned(&self.contents);
        if let Some(old) = contents.as_mut() {
            old.zeroize();
        }
        *contents = None;
        Ok(())
    }
}

// ── Auto-clear guard ─────────────────────────────────────────────────

/// Handle to the pending auto-clear task.
type ClearTimer = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Writes secrets to a [`ClipboardSink`] and wipes them after a timeout.
#[derive(Clone)]
pub struct ClipboardGuard {
    sink: Arc<dyn ClipboardSink>,
    timeout: Duration,
    timer: ClearTimer,
}

impl ClipboardGuard {
    /// Guard `sink`, clearing `timeout` after each write.
    #[must_use]
    pub fn new(sink: Arc<dyn ClipboardSink>, timeout: Duration) -> Self {
        Self {
            sink,
            timeout,
            timer: Arc::new(Mutex::new(None)),
        }
    }

    /// Configured auto-clear delay.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether an auto-clear is pending.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        lock_unpoisoned(&self.timer)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Write `text` and (re)arm the auto-clear timer.
    ///
    /// Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ClipboardError`] if the write fails; no timer is armed.
    pub fn write_secret(&self, text: &str) -> Result<(), ClipboardError> {
        self.sink.write_text(text)?;
        self.schedule_clear();
        Ok(())
    }

    /// Cancel the pending timer and clear the clipboard now.
    ///
    /// # Errors
    ///
    /// Returns [`ClipboardError`] if the clear fails.
    pub fn clear_now(&self) -> Result<(), ClipboardError> {
        self.cancel_clear();
        self.sink.clear()
    }

    fn schedule_clear(&self) {
        self.cancel_clear();

        let sink = Arc::clone(&self.sink);
        let timeout = self.timeout;
        let handle = tokio::spawn(async move {
            if !timeout.is_zero() {
                tokio::time::sleep(timeout).await;
            }
            match sink.clear() {
                Ok(()) => tracing::debug!("clipboard auto-cleared"),
                Err(e) => tracing::warn!("clipboard auto-clear failed: {e}"),
            }
        });

        *lock_unpoisoned(&self.timer) = Some(handle);
    }

    fn cancel_clear(&self) {
        if let Some(handle) = lock_unpoisoned(&self.timer).take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for ClipboardGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipboardGuard")
            .field("timeout", &self.timeout)
            .field("armed", &self.is_armed())
            .finish_non_exhaustive()
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(timeout: Duration) -> (ClipboardGuard, MemoryClipboard) {
        let memory = MemoryClipboard::new();
        let guard = ClipboardGuard::new(Arc::new(memory.clone()), timeout);
        (guard, memory)
    }

    #[test]
    fn memory_clipboard_write_and_clear() {
        let clipboard = MemoryClipboard::new();
        clipboard.write_text("s3cret").unwrap();
        assert_eq!(clipboard.contents().as_deref(), Some("s3cret"));
        clipboard.clear().unwrap();
        assert!(clipboard.contents().is_none());
    }

    #[test]
    fn clear_now_without_timer_does_not_panic() {
        let (guard, memory) = guard(Duration::from_secs(30));
        guard.clear_now().unwrap();
        assert!(memory.contents().is_none());
        assert!(!guard.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_clears_after_timeout() {
        let (guard, memory) = guard(Duration::from_secs(30));
        guard.write_secret("s3cret").unwrap();
        assert!(guard.is_armed());

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(memory.contents().as_deref(), Some("s3cret"));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(memory.contents().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn rewrite_rearms_timer() {
        let (guard, memory) = guard(Duration::from_secs(30));
        guard.write_secret("first").unwrap();
        tokio::time::sleep(Duration::from_secs(20)).await;
        guard.write_secret("second").unwrap();

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(memory.contents().as_deref(), Some("second"));

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(memory.contents().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_now_cancels_timer() {
        let (guard, memory) = guard(Duration::from_secs(30));
        guard.write_secret("s3cret").unwrap();
        guard.clear_now().unwrap();
        assert!(memory.contents().is_none());
        assert!(!guard.is_armed());

        memory.write_text("user copied this").unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(memory.contents().as_deref(), Some("user copied this"));
    }

    #[tokio::test]
    async fn zero_timeout_clears_immediately() {
        let (guard, memory) = guard(Duration::ZERO);
        guard.write_secret("s3cret").unwrap();
        tokio::task::yield_now().await;
        for _ in 0..10 {
            if memory.contents().is_none() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(memory.contents().is_none());
    }
}
