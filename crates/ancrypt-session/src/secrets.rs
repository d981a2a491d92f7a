//! Secret list refresher.
//!
//! Holds the name list of the unlocked vault and re-fetches it after every
//! successful mutation. Each fetch is tagged with the session generation
//! and the refresh epoch it was issued for; a response is dropped when the
//! epoch has moved past its tag or the generation changed (the vault was
//! locked in between). Among responses for the same epoch the last one to
//! resolve wins.

use std::sync::{Arc, Mutex};

use secrecy::SecretString;

use crate::error::SessionError;
use crate::events::EventHub;
use crate::gateway::SharedGateway;
use crate::lock_unpoisoned;
use crate::model::{ControllerEvent, RefreshEpoch, SecretEntry};

/// Read-only view of the cached list.
pub type SecretSnapshot = Arc<Vec<SecretEntry>>;

#[derive(Debug, Default)]
struct ListState {
    entries: SecretSnapshot,
    epoch: RefreshEpoch,
    generation: u64,
}

/// Tag carried by an in-flight fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FetchTag {
    generation: u64,
    epoch: RefreshEpoch,
}

/// Cached secret names of the unlocked vault.
#[derive(Clone)]
pub struct SecretList {
    gateway: SharedGateway,
    events: EventHub,
    state: Arc<Mutex<ListState>>,
}

impl SecretList {
    /// Create an empty list.
    #[must_use]
    pub fn new(gateway: SharedGateway, events: EventHub) -> Self {
        Self {
            gateway,
            events,
            state: Arc::new(Mutex::new(ListState::default())),
        }
    }

    /// Current list. Never a partially applied update.
    #[must_use]
    pub fn snapshot(&self) -> SecretSnapshot {
        Arc::clone(&lock_unpoisoned(&self.state).entries)
    }

    /// Current refresh epoch.
    #[must_use]
    pub fn epoch(&self) -> RefreshEpoch {
        lock_unpoisoned(&self.state).epoch
    }

    /// Session generation the list currently belongs to.
    pub(crate) fn generation(&self) -> u64 {
        lock_unpoisoned(&self.state).generation
    }

    /// Drop the cached list and adopt a new session generation. Fetches
    /// issued under the old generation are discarded when they resolve.
    pub fn reset(&self, generation: u64) {
        let mut state = lock_unpoisoned(&self.state);
        state.entries = Arc::default();
        state.generation = generation;
    }

    /// Fetch the full list and replace the cache unless the response is
    /// stale.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Backend`] if the backend call fails; the
    /// cache is left unchanged.
    pub async fn refresh(&self) -> Result<SecretSnapshot, SessionError> {
        let tag = self.current_tag();
        let names = self.gateway.retrieve_password_list().await?;
        Ok(self.apply(tag, names))
    }

    /// Advance the epoch after a successful mutation and refresh.
    ///
    /// A failed refresh is logged and the cached list returned.
    pub async fn after_mutation(&self) -> SecretSnapshot {
        {
            let mut state = lock_unpoisoned(&self.state);
            state.epoch = state.epoch.next();
        }
        match self.refresh().await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("secret list refresh after mutation failed: {e}");
                self.snapshot()
            }
        }
    }

    /// Store a manually entered secret, then refresh.
    ///
    /// # Errors
    ///
    /// Returns the backend message verbatim; the epoch is not advanced.
    pub async fn add(
        &self,
        name: &str,
        value: &SecretString,
    ) -> Result<SecretSnapshot, SessionError> {
        self.gateway.add_password(name, value).await?;
        tracing::debug!(name, "secret added");
        Ok(self.after_mutation().await)
    }

    fn current_tag(&self) -> FetchTag {
        let state = lock_unpoisoned(&self.state);
        FetchTag {
            generation: state.generation,
            epoch: state.epoch,
        }
    }

    fn apply(&self, tag: FetchTag, names: Vec<String>) -> SecretSnapshot {
        let mut state = lock_unpoisoned(&self.state);
        if tag.generation != state.generation || state.epoch > tag.epoch {
            tracing::debug!(
                requested = tag.epoch.0,
                current = state.epoch.0,
                "discarding stale secret list"
            );
            return Arc::clone(&state.entries);
        }

        let entries: Vec<SecretEntry> = names.into_iter().map(SecretEntry::new).collect();
        state.entries = Arc::new(entries);
        let snapshot = Arc::clone(&state.entries);
        drop(state);

        self.events
            .emit(ControllerEvent::SecretsUpdated(snapshot.as_ref().clone()));
        snapshot
    }
}

impl std::fmt::Debug for SecretList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock_unpoisoned(&self.state);
        f.debug_struct("SecretList")
            .field("entries", &state.entries.len())
            .field("epoch", &state.epoch)
            .field("generation", &state.generation)
            .finish_non_exhaustive()
    }
}
