//! Vault session controller: the single global session slot.
//!
//! ```text
//! Locked --unlock--> Unlocking --ok--> Unlocked(id) --lock--> LockingOut --> Locked
//!                        \--fail--> Locked
//! ```
//!
//! Every entry into `Unlocked` and every lock bumps the session
//! generation, which the secret list uses to drop responses that belong
//! to an earlier session.

use std::sync::{Arc, Mutex};

use secrecy::SecretString;

use crate::error::SessionError;
use crate::events::EventHub;
use crate::gateway::SharedGateway;
use crate::lock_unpoisoned;
use crate::model::{ControllerEvent, Screen, SessionState, VaultId};

/// Alert shown when the backend gives no reason for a failed unlock.
pub const DEFAULT_UNLOCK_FAILURE: &str = "Something went wrong";

#[derive(Debug, Default)]
struct Slot {
    state: SessionState,
    generation: u64,
}

/// Owner of the session state machine.
#[derive(Clone)]
pub struct SessionController {
    gateway: SharedGateway,
    events: EventHub,
    slot: Arc<Mutex<Slot>>,
}

impl SessionController {
    /// Start in [`SessionState::Locked`].
    #[must_use]
    pub fn new(gateway: SharedGateway, events: EventHub) -> Self {
        Self {
            gateway,
            events,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        lock_unpoisoned(&self.slot).state
    }

    /// Current session generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        lock_unpoisoned(&self.slot).generation
    }

    /// Fail unless a vault is unlocked; returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotUnlocked`] in any other state.
    pub fn require_unlocked(&self) -> Result<VaultId, SessionError> {
        self.state()
            .unlocked_vault()
            .ok_or(SessionError::NotUnlocked)
    }

    /// Attempt to unlock vault `id`.
    ///
    /// On success the state becomes `Unlocked(id)`, one
    /// `Navigate(Workspace)` is emitted and the new generation returned.
    /// On failure the state returns to `Locked` and an alert is emitted.
    ///
    /// # Errors
    ///
    /// - [`SessionError::UnlockInProgress`] / [`SessionError::AlreadyUnlocked`]
    ///   / [`SessionError::LockInProgress`] if not `Locked`
    /// - [`SessionError::Backend`] with the backend message on failure
    pub async fn unlock(&self, id: VaultId, password: &SecretString) -> Result<u64, SessionError> {
        {
            let mut slot = lock_unpoisoned(&self.slot);
            match slot.state {
                SessionState::Locked => slot.state = SessionState::Unlocking(id),
                SessionState::Unlocking(_) => return Err(SessionError::UnlockInProgress),
                SessionState::Unlocked(_) => return Err(SessionError::AlreadyUnlocked),
                SessionState::LockingOut => return Err(SessionError::LockInProgress),
            }
        }
        tracing::debug!(vault = %id, "unlocking vault");

        let outcome = self.gateway.open_vault(id, password).await;

        if outcome.success {
            let generation = {
                let mut slot = lock_unpoisoned(&self.slot);
                slot.generation = slot.generation.saturating_add(1);
                slot.state = SessionState::Unlocked(id);
                slot.generation
            };
            tracing::info!(vault = %id, "vault unlocked");
            self.events.emit(ControllerEvent::Navigate(Screen::Workspace));
            Ok(generation)
        } else {
            lock_unpoisoned(&self.slot).state = SessionState::Locked;
            let message = outcome
                .message
                .unwrap_or_else(|| DEFAULT_UNLOCK_FAILURE.to_string());
            tracing::info!(vault = %id, "unlock rejected");
            self.events.emit(ControllerEvent::Alert(message.clone()));
            Err(SessionError::Backend(message))
        }
    }

    /// Move `Unlocked` to `LockingOut` and bump the generation.
    ///
    /// Returns the new generation, or `None` (no-op) if no vault is
    /// unlocked.
    #[must_use]
    pub fn begin_lock(&self) -> Option<u64> {
        let mut slot = lock_unpoisoned(&self.slot);
        if !matches!(slot.state, SessionState::Unlocked(_)) {
            return None;
        }
        slot.state = SessionState::LockingOut;
        slot.generation = slot.generation.saturating_add(1);
        Some(slot.generation)
    }

    /// Tell the backend to lock, then settle in `Locked` and emit
    /// `Navigate(Catalog)`. A backend failure is logged; the local state
    /// is cleared regardless.
    pub async fn finish_lock(&self) {
        if let Err(e) = self.gateway.lock_vault().await {
            tracing::warn!("backend lock_vault failed: {e}");
        }
        lock_unpoisoned(&self.slot).state = SessionState::Locked;
        tracing::info!("vault locked");
        self.events.emit(ControllerEvent::Navigate(Screen::Catalog));
    }

    /// [`Self::begin_lock`] followed by [`Self::finish_lock`]. Returns
    /// whether a lock happened.
    pub async fn lock(&self) -> bool {
        if self.begin_lock().is_none() {
            return false;
        }
        self.finish_lock().await;
        true
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = lock_unpoisoned(&self.slot);
        f.debug_struct("SessionController")
            .field("state", &slot.state)
            .field("generation", &slot.generation)
            .finish_non_exhaustive()
    }
}
