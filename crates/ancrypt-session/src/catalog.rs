//! Vault catalog poller.
//!
//! While no vault is unlocked the catalog is re-fetched on a fixed
//! interval. A subscription owns the polling task; tearing it down stops
//! the timer and invalidates any fetch still in flight instead of
//! aborting it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::SessionError;
use crate::events::EventHub;
use crate::gateway::SharedGateway;
use crate::lock_unpoisoned;
use crate::model::{ControllerEvent, VaultId, VaultSummary};

/// Default catalog poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Shortest accepted poll interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Read-only view of the cached catalog.
pub type CatalogSnapshot = Arc<Vec<VaultSummary>>;

#[derive(Debug, Default)]
struct CatalogState {
    vaults: CatalogSnapshot,
    epoch: u64,
}

/// Cached vault catalog plus the catalog-screen commands.
#[derive(Clone)]
pub struct CatalogPoller {
    gateway: SharedGateway,
    events: EventHub,
    state: Arc<Mutex<CatalogState>>,
}

impl CatalogPoller {
    /// Empty catalog; nothing is fetched until [`Self::start`] or
    /// [`Self::refresh_now`].
    #[must_use]
    pub fn new(gateway: SharedGateway, events: EventHub) -> Self {
        Self {
            gateway,
            events,
            state: Arc::new(Mutex::new(CatalogState::default())),
        }
    }

    /// Last successfully fetched catalog.
    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        Arc::clone(&lock_unpoisoned(&self.state).vaults)
    }

    /// Fetch once and replace the cache unless [`Self::refresh_now`] ran
    /// in the meantime.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Backend`] if the backend call fails; the
    /// cache is left unchanged.
    pub async fn fetch(&self) -> Result<CatalogSnapshot, SessionError> {
        let epoch = lock_unpoisoned(&self.state).epoch;
        let vaults = self.gateway.request_vaults().await?;
        Ok(self.apply(epoch, vaults))
    }

    /// Invalidate in-flight fetches and fetch now. A failure is logged and
    /// the cached catalog returned.
    pub async fn refresh_now(&self) -> CatalogSnapshot {
        {
            let mut state = lock_unpoisoned(&self.state);
            state.epoch = state.epoch.saturating_add(1);
        }
        match self.fetch().await {
            Ok(vaults) => vaults,
            Err(e) => {
                tracing::debug!("catalog refresh failed: {e}");
                self.snapshot()
            }
        }
    }

    /// Create a vault and refresh the catalog. The new vault is not opened.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Backend`] with the backend message, which is
    /// also emitted as an alert.
    pub async fn create_vault(
        &self,
        name: &str,
        password: &SecretString,
    ) -> Result<CatalogSnapshot, SessionError> {
        let outcome = self.gateway.create_vault(name, password).await;
        if !outcome.success {
            let message = outcome
                .message
                .unwrap_or_else(|| "Something went wrong".to_string());
            self.events.emit(ControllerEvent::Alert(message.clone()));
            return Err(SessionError::Backend(message));
        }
        tracing::info!(vault = name, "vault created");
        Ok(self.refresh_now().await)
    }

    /// Delete a vault and refresh the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Backend`] with the backend message.
    pub async fn delete_vault(&self, id: VaultId) -> Result<CatalogSnapshot, SessionError> {
        self.gateway.delete_vault(id).await?;
        tracing::info!(vault = %id, "vault deleted");
        Ok(self.refresh_now().await)
    }

    /// Fetch immediately, then every `interval`, until the returned
    /// subscription is torn down or dropped.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn start(&self, interval: Duration) -> CatalogSubscription {
        let interval = interval.max(MIN_POLL_INTERVAL);
        let cancelled = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(Notify::new());

        let poller = self.clone();
        let task_cancelled = Arc::clone(&cancelled);
        let task_shutdown = Arc::clone(&shutdown);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = task_shutdown.notified() => break,
                    _ = ticker.tick() => {}
                }
                if task_cancelled.load(Ordering::Acquire) {
                    break;
                }
                poller.poll_once(&task_cancelled).await;
            }
            tracing::debug!("catalog poller stopped");
        });

        tracing::debug!(interval_ms = interval.as_millis(), "catalog poller started");
        CatalogSubscription {
            cancelled,
            shutdown,
            handle: Some(handle),
        }
    }

    async fn poll_once(&self, cancelled: &AtomicBool) {
        let epoch = lock_unpoisoned(&self.state).epoch;
        let result = self.gateway.request_vaults().await;
        if cancelled.load(Ordering::Acquire) {
            tracing::debug!("discarding catalog fetch after teardown");
            return;
        }
        match result {
            Ok(vaults) => {
                self.apply(epoch, vaults);
            }
            Err(e) => tracing::debug!("catalog poll failed: {e}"),
        }
    }

    fn apply(&self, epoch: u64, vaults: Vec<VaultSummary>) -> CatalogSnapshot {
        let mut state = lock_unpoisoned(&self.state);
        if state.epoch != epoch {
            tracing::debug!("discarding stale catalog");
            return Arc::clone(&state.vaults);
        }
        if *state.vaults == vaults {
            return Arc::clone(&state.vaults);
        }
        state.vaults = Arc::new(vaults);
        let snapshot = Arc::clone(&state.vaults);
        drop(state);

        self.events
            .emit(ControllerEvent::CatalogUpdated(snapshot.as_ref().clone()));
        snapshot
    }
}

impl std::fmt::Debug for CatalogPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock_unpoisoned(&self.state);
        f.debug_struct("CatalogPoller")
            .field("vaults", &state.vaults.len())
            .field("epoch", &state.epoch)
            .finish_non_exhaustive()
    }
}

/// Owner of a running catalog poll task. Dropping it tears it down.
#[derive(Debug)]
pub struct CatalogSubscription {
    cancelled: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl CatalogSubscription {
    /// Stop polling. A fetch in flight completes but its result is
    /// discarded.
    pub fn teardown(&mut self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shutdown.notify_one();
        // Detach: the task exits on its own once the in-flight call returns.
        drop(self.handle.take());
    }

    /// Whether the subscription is still live.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.cancelled.load(Ordering::Acquire)
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CatalogSubscription {
    fn drop(&mut self) {
        self.teardown();
    }
}
