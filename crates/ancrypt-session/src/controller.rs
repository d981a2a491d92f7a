//! `VaultController`: one handle over the catalog, session, secret list,
//! delete challenge, clipboard exposure and form state.
//!
//! The controller is cheap to clone. Screen transitions are reported on
//! the event stream; the UI layer renders whatever the last
//! [`ControllerEvent::Navigate`] names.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ancrypt_vault::Preferences;
use secrecy::SecretString;
use tokio::sync::broadcast;

use crate::catalog::{CatalogPoller, CatalogSnapshot, CatalogSubscription, DEFAULT_POLL_INTERVAL};
use crate::challenge::{DeleteChallenge, DeleteConfirmation};
use crate::error::SessionError;
use crate::events::EventHub;
use crate::exposure::{ClipboardExposure, DEFAULT_EXPOSURE_WINDOW};
use crate::forms::{validate_new_secret, Forms};
use crate::gateway::SharedGateway;
use crate::generator::SecretGenerator;
use crate::lock_unpoisoned;
use crate::model::{ControllerEvent, RefreshEpoch, SessionState, VaultId};
use crate::secrets::{SecretList, SecretSnapshot};
use crate::session::SessionController;

/// Controller tunables, usually taken from [`Preferences`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Catalog refresh interval while locked.
    pub catalog_poll_interval: Duration,
    /// Expected clipboard auto-clear window.
    pub clipboard_window: Duration,
    /// Whether a failed unlock empties the password field.
    pub clear_password_on_failed_unlock: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            catalog_poll_interval: DEFAULT_POLL_INTERVAL,
            clipboard_window: DEFAULT_EXPOSURE_WINDOW,
            clear_password_on_failed_unlock: false,
        }
    }
}

impl From<&Preferences> for ControllerSettings {
    fn from(prefs: &Preferences) -> Self {
        Self {
            catalog_poll_interval: Duration::from_millis(u64::from(prefs.catalog_poll_interval_ms)),
            clipboard_window: prefs.clipboard_auto_clear(),
            clear_password_on_failed_unlock: prefs.clear_password_on_failed_unlock,
        }
    }
}

struct Inner {
    events: EventHub,
    settings: ControllerSettings,
    catalog: CatalogPoller,
    session: SessionController,
    secrets: SecretList,
    challenge: DeleteConfirmation,
    exposure: ClipboardExposure,
    generator: SecretGenerator,
    forms: Mutex<Forms>,
    poller: Mutex<Option<CatalogSubscription>>,
}

/// The vault session and secret exposure controller.
#[derive(Clone)]
pub struct VaultController {
    inner: Arc<Inner>,
}

impl VaultController {
    /// Build a controller over `gateway`. Starts `Locked`; call
    /// [`Self::show_catalog`] to begin polling.
    #[must_use]
    pub fn new(gateway: SharedGateway, settings: ControllerSettings) -> Self {
        let events = EventHub::new();
        let secrets = SecretList::new(Arc::clone(&gateway), events.clone());
        let inner = Inner {
            catalog: CatalogPoller::new(Arc::clone(&gateway), events.clone()),
            session: SessionController::new(Arc::clone(&gateway), events.clone()),
            challenge: DeleteConfirmation::new(Arc::clone(&gateway), secrets.clone()),
            exposure: ClipboardExposure::new(
                Arc::clone(&gateway),
                events.clone(),
                settings.clipboard_window,
            ),
            generator: SecretGenerator::new(gateway, secrets.clone()),
            secrets,
            events,
            settings,
            forms: Mutex::new(Forms::default()),
            poller: Mutex::new(None),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Subscribe to controller events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.inner.events.subscribe()
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.session.state()
    }

    /// Settings in effect.
    #[must_use]
    pub fn settings(&self) -> &ControllerSettings {
        &self.inner.settings
    }

    // ── Catalog screen ───────────────────────────────────────────────

    /// Cached vault catalog.
    #[must_use]
    pub fn catalog(&self) -> CatalogSnapshot {
        self.inner.catalog.snapshot()
    }

    /// Whether the catalog poller is running.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        lock_unpoisoned(&self.inner.poller)
            .as_ref()
            .is_some_and(CatalogSubscription::is_active)
    }

    /// Start catalog polling if no vault is unlocked. Idempotent.
    ///
    /// Must be called within a tokio runtime.
    pub fn show_catalog(&self) {
        if self.state() != SessionState::Locked {
            return;
        }
        let mut poller = lock_unpoisoned(&self.inner.poller);
        if poller.as_ref().is_some_and(CatalogSubscription::is_active) {
            return;
        }
        *poller = Some(
            self.inner
                .catalog
                .start(self.inner.settings.catalog_poll_interval),
        );
    }

    /// Refresh the catalog now.
    pub async fn refresh_catalog(&self) -> CatalogSnapshot {
        self.inner.catalog.refresh_now().await
    }

    /// Create a vault from the catalog screen.
    ///
    /// # Errors
    ///
    /// See [`CatalogPoller::create_vault`].
    pub async fn create_vault(
        &self,
        name: &str,
        password: &SecretString,
    ) -> Result<CatalogSnapshot, SessionError> {
        self.inner.catalog.create_vault(name, password).await
    }

    /// Delete a vault from the catalog screen.
    ///
    /// # Errors
    ///
    /// See [`CatalogPoller::delete_vault`].
    pub async fn delete_vault(&self, id: VaultId) -> Result<CatalogSnapshot, SessionError> {
        self.inner.catalog.delete_vault(id).await
    }

    /// Update the unlock password field.
    pub fn set_unlock_password(&self, input: &str) {
        lock_unpoisoned(&self.inner.forms).unlock_password.set(input);
    }

    /// Whether the unlock password field is empty.
    #[must_use]
    pub fn unlock_password_is_empty(&self) -> bool {
        lock_unpoisoned(&self.inner.forms).unlock_password.is_empty()
    }

    /// Unlock vault `id` with the password field contents.
    ///
    /// # Errors
    ///
    /// See [`SessionController::unlock`].
    pub async fn unlock(&self, id: VaultId) -> Result<SecretSnapshot, SessionError> {
        let password = lock_unpoisoned(&self.inner.forms).unlock_password.snapshot();
        self.unlock_with_password(id, &password).await
    }

    /// Unlock vault `id` with `password`.
    ///
    /// On success polling stops, the password field is cleared and the
    /// initial secret list is fetched. A failed initial fetch is logged
    /// and an empty list returned.
    ///
    /// # Errors
    ///
    /// See [`SessionController::unlock`].
    pub async fn unlock_with_password(
        &self,
        id: VaultId,
        password: &SecretString,
    ) -> Result<SecretSnapshot, SessionError> {
        match self.inner.session.unlock(id, password).await {
            Ok(generation) => {
                self.stop_polling();
                lock_unpoisoned(&self.inner.forms).unlock_password.clear();
                self.inner.secrets.reset(generation);
                match self.inner.secrets.refresh().await {
                    Ok(list) => Ok(list),
                    Err(e) => {
                        tracing::warn!("initial secret list fetch failed: {e}");
                        Ok(self.inner.secrets.snapshot())
                    }
                }
            }
            Err(e) => {
                if matches!(e, SessionError::Backend(_))
                    && self.inner.settings.clear_password_on_failed_unlock
                {
                    lock_unpoisoned(&self.inner.forms).unlock_password.clear();
                }
                Err(e)
            }
        }
    }

    // ── Workspace ────────────────────────────────────────────────────

    /// Lock the open vault and return to the catalog. No-op when nothing
    /// is unlocked; returns whether a lock happened.
    ///
    /// Must be called within a tokio runtime.
    pub async fn lock(&self) -> bool {
        let Some(generation) = self.inner.session.begin_lock() else {
            return false;
        };
        self.inner.secrets.reset(generation);
        lock_unpoisoned(&self.inner.forms).clear_workspace();
        self.inner.challenge.cancel();
        self.inner.exposure.forget();
        self.inner.session.finish_lock().await;
        self.show_catalog();
        true
    }

    /// Cached secret list.
    #[must_use]
    pub fn secrets(&self) -> SecretSnapshot {
        self.inner.secrets.snapshot()
    }

    /// Current refresh epoch.
    #[must_use]
    pub fn epoch(&self) -> RefreshEpoch {
        self.inner.secrets.epoch()
    }

    /// Re-fetch the secret list.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotUnlocked`] or the backend failure.
    pub async fn refresh_secrets(&self) -> Result<SecretSnapshot, SessionError> {
        self.inner.session.require_unlocked()?;
        self.inner.secrets.refresh().await
    }

    /// Update the manual-add name field. Input over 40 characters is
    /// ignored; returns whether it was accepted.
    pub fn set_new_secret_name(&self, input: &str) -> bool {
        lock_unpoisoned(&self.inner.forms).new_secret_name.set(input)
    }

    /// Update the manual-add value field.
    pub fn set_new_secret_value(&self, input: &str) {
        lock_unpoisoned(&self.inner.forms).new_secret_value.set(input);
    }

    /// Update the generator name field. Input over 40 characters is
    /// ignored; returns whether it was accepted.
    pub fn set_generator_name(&self, input: &str) -> bool {
        lock_unpoisoned(&self.inner.forms).generator_name.set(input)
    }

    /// Current manual-add name field.
    #[must_use]
    pub fn new_secret_name(&self) -> String {
        lock_unpoisoned(&self.inner.forms)
            .new_secret_name
            .value()
            .to_string()
    }

    /// Whether the manual-add value field is empty.
    #[must_use]
    pub fn new_secret_value_is_empty(&self) -> bool {
        lock_unpoisoned(&self.inner.forms).new_secret_value.is_empty()
    }

    /// Current generator name field.
    #[must_use]
    pub fn generator_name(&self) -> String {
        lock_unpoisoned(&self.inner.forms)
            .generator_name
            .value()
            .to_string()
    }

    /// Store the manual-add fields as a new secret. Both fields are
    /// cleared on success and kept on failure.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotUnlocked`], a validation error, or the backend
    /// message.
    pub async fn add_secret(&self) -> Result<SecretSnapshot, SessionError> {
        self.inner.session.require_unlocked()?;
        let (name, value) = {
            let forms = lock_unpoisoned(&self.inner.forms);
            (
                forms.new_secret_name.value().to_string(),
                forms.new_secret_value.snapshot(),
            )
        };
        validate_new_secret(&name, &value)?;

        let list = self.inner.secrets.add(&name, &value).await?;
        let mut forms = lock_unpoisoned(&self.inner.forms);
        forms.new_secret_name.clear();
        forms.new_secret_value.clear();
        Ok(list)
    }

    /// Generate a secret under the generator name field. The field is
    /// cleared on success and kept on failure.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotUnlocked`], a validation error, or the backend
    /// message.
    pub async fn generate_secret(&self) -> Result<SecretSnapshot, SessionError> {
        self.inner.session.require_unlocked()?;
        let name = self.generator_name();
        let list = self.inner.generator.generate(&name).await?;
        lock_unpoisoned(&self.inner.forms).generator_name.clear();
        Ok(list)
    }

    // ── Delete confirmation ──────────────────────────────────────────

    /// The open delete challenge, if any.
    #[must_use]
    pub fn challenge(&self) -> Option<DeleteChallenge> {
        self.inner.challenge.current()
    }

    /// Open a delete challenge for `target`.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotUnlocked`] or the backend failure.
    pub async fn open_delete(&self, target: &str) -> Result<DeleteChallenge, SessionError> {
        self.inner.session.require_unlocked()?;
        self.inner.challenge.open(target).await
    }

    /// Record typed confirmation code input on the open challenge; returns
    /// the parsed value.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoChallenge`] if none is open.
    pub fn enter_delete_code(&self, input: &str) -> Result<u32, SessionError> {
        self.inner.challenge.enter(input)
    }

    /// Confirm the open delete challenge.
    ///
    /// # Errors
    ///
    /// See [`DeleteConfirmation::confirm`].
    pub async fn confirm_delete(&self) -> Result<SecretSnapshot, SessionError> {
        self.inner.session.require_unlocked()?;
        self.inner.challenge.confirm().await
    }

    /// Close the delete challenge without deleting.
    pub fn cancel_delete(&self) {
        self.inner.challenge.cancel();
    }

    // ── Clipboard ────────────────────────────────────────────────────

    /// Copy the secret stored under `name`. Failures are reported as
    /// [`ControllerEvent::ClipboardCopyFailed`]; returns whether it worked.
    pub async fn copy_secret(&self, name: &str) -> bool {
        if self.inner.session.require_unlocked().is_err() {
            tracing::debug!(name, "copy ignored: no vault unlocked");
            return false;
        }
        self.inner.exposure.copy(name).await
    }

    /// Clear the clipboard now.
    pub async fn clear_clipboard(&self) {
        self.inner.exposure.clear().await;
    }

    /// Time left before the clipboard is cleared.
    #[must_use]
    pub fn exposure_remaining(&self) -> Option<Duration> {
        self.inner.exposure.remaining()
    }

    fn stop_polling(&self) {
        if let Some(mut poller) = lock_unpoisoned(&self.inner.poller).take() {
            poller.teardown();
        }
    }
}

impl std::fmt::Debug for VaultController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultController")
            .field("state", &self.state())
            .field("secrets", &self.inner.secrets.snapshot().len())
            .field("polling", &self.is_polling())
            .finish_non_exhaustive()
    }
}

