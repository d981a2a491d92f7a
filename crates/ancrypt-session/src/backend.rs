//! Local vault backend: [`CommandGateway`] over `ancrypt-vault` files and a
//! clipboard sink.
//!
//! Vault ids are positions in the most recent catalog listing. Key
//! derivation runs on the blocking pool; the backend state lock is never
//! held across it.

use std::path::Path;
use std::sync::Arc;

use ancrypt_crypto::{
    generate_alphanumeric, generate_confirmation_code, Argon2idParams, GENERATED_SECRET_LENGTH,
};
use ancrypt_vault::{Preferences, UnlockedVault, VaultError, VaultStore};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Mutex, MutexGuard};
use zeroize::Zeroizing;

use crate::clipboard::{ClipboardGuard, ClipboardSink};
use crate::error::{GatewayError, ValidationError};
use crate::forms::validate_new_secret;
use crate::gateway::CommandGateway;
use crate::model::{CommandOutcome, VaultId, VaultSummary};

/// Vault creation with an empty or unusable name or password.
pub const INVALID_VAULT_INPUT: &str = "Invalid vault name and/or password. Try again!";
/// Vault creation under a name that is taken.
pub const VAULT_EXISTS: &str = "A vault with that name already exists";
/// Catch-all failure.
pub const GENERIC_FAILURE: &str = "Something went wrong";
/// Wrong master password.
pub const INCORRECT_PASSWORD: &str = "Incorrect Password";
/// Adding a secret failed in storage.
pub const INSERT_FAILURE: &str = "Something went wrong inserting your password";
/// No secret under the requested name.
pub const UNKNOWN_SECRET: &str = "That's not an existing password";
/// A secret command arrived with no vault open.
pub const NO_VAULT_OPEN: &str = "No vault is open";

#[derive(Debug, Default)]
struct BackendState {
    catalog: Vec<VaultSummary>,
    open: Option<UnlockedVault>,
}

impl BackendState {
    fn name_of(&self, id: VaultId) -> Option<String> {
        self.catalog
            .iter()
            .find(|v| v.id == id)
            .map(|v| v.name.clone())
    }

    fn vault_mut(&mut self) -> Result<&mut UnlockedVault, GatewayError> {
        self.open
            .as_mut()
            .ok_or_else(|| GatewayError::Rejected(NO_VAULT_OPEN.to_string()))
    }
}

/// Reference backend over a data directory.
pub struct LocalBackend {
    store: VaultStore,
    kdf: Argon2idParams,
    clipboard: ClipboardGuard,
    state: Mutex<BackendState>,
}

impl LocalBackend {
    /// Backend over `{data_dir}/Vaults`, configured from `prefs`.
    #[must_use]
    pub fn new(data_dir: &Path, prefs: &Preferences, sink: Arc<dyn ClipboardSink>) -> Self {
        Self {
            store: VaultStore::new(data_dir),
            kdf: prefs.kdf_preset.params(),
            clipboard: ClipboardGuard::new(sink, prefs.clipboard_auto_clear()),
            state: Mutex::new(BackendState::default()),
        }
    }

    /// Backend over the default data directory and the OS clipboard, with
    /// preferences loaded from disk.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NoDataDir`] if no data directory can be
    /// determined or [`VaultError::Io`] if the layout cannot be created.
    #[cfg(feature = "system-clipboard")]
    pub fn open_default() -> Result<(Self, Preferences), VaultError> {
        let data_dir = ancrypt_vault::default_data_dir()?;
        let prefs = Preferences::load(&data_dir);
        let backend = Self::new(
            &data_dir,
            &prefs,
            Arc::new(crate::clipboard::SystemClipboard),
        );
        backend.store.ensure_layout()?;
        Ok((backend, prefs))
    }

    /// Override the KDF cost for vaults created from now on.
    #[must_use]
    pub fn with_kdf_params(mut self, params: Argon2idParams) -> Self {
        self.kdf = params;
        self
    }

    /// The vault folder.
    #[must_use]
    pub const fn store(&self) -> &VaultStore {
        &self.store
    }

    /// The clipboard guard.
    #[must_use]
    pub const fn clipboard(&self) -> &ClipboardGuard {
        &self.clipboard
    }

    async fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().await
    }

    fn clear_clipboard_logged(&self) {
        if let Err(e) = self.clipboard.clear_now() {
            tracing::warn!("clipboard clear failed: {e}");
        }
    }
}

impl std::fmt::Debug for LocalBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBackend")
            .field("vaults_dir", &self.store.vaults_dir())
            .field("clipboard", &self.clipboard)
            .finish_non_exhaustive()
    }
}

fn password_bytes(password: &SecretString) -> Zeroizing<Vec<u8>> {
    Zeroizing::new(password.expose_secret().as_bytes().to_vec())
}

fn rejected(message: &str) -> GatewayError {
    GatewayError::Rejected(message.to_string())
}

#[async_trait]
impl CommandGateway for LocalBackend {
    async fn request_vaults(&self) -> Result<Vec<VaultSummary>, GatewayError> {
        let names = self
            .store
            .list()
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
        let catalog: Vec<VaultSummary> = (0u32..)
            .zip(names)
            .map(|(id, name)| VaultSummary {
                name,
                id: VaultId(id),
            })
            .collect();

        self.state().await.catalog.clone_from(&catalog);
        Ok(catalog)
    }

    async fn create_vault(&self, name: &str, password: &SecretString) -> CommandOutcome {
        if name.trim().is_empty() || password.expose_secret().is_empty() {
            return CommandOutcome::failed(INVALID_VAULT_INPUT);
        }

        let store = self.store.clone();
        let params = self.kdf.clone();
        let name_owned = name.to_string();
        let password = password_bytes(password);
        let result = tokio::task::spawn_blocking(move || {
            store.create(&name_owned, &password, &params)
        })
        .await;

        match result {
            Ok(Ok(_)) => {
                tracing::info!(vault = name, "vault file created");
                CommandOutcome::ok()
            }
            Ok(Err(VaultError::VaultAlreadyExists(_))) => CommandOutcome::failed(VAULT_EXISTS),
            Ok(Err(VaultError::InvalidName(_))) => CommandOutcome::failed(INVALID_VAULT_INPUT),
            Ok(Err(e)) => {
                tracing::warn!(vault = name, "vault creation failed: {e}");
                CommandOutcome::failed(GENERIC_FAILURE)
            }
            Err(e) => {
                tracing::warn!("vault creation task failed: {e}");
                CommandOutcome::failed(GENERIC_FAILURE)
            }
        }
    }

    async fn open_vault(&self, id: VaultId, password: &SecretString) -> CommandOutcome {
        let Some(name) = self.state().await.name_of(id) else {
            tracing::debug!(vault = %id, "open requested for unknown vault id");
            return CommandOutcome::failed(GENERIC_FAILURE);
        };

        let store = self.store.clone();
        let password = password_bytes(password);
        let name_owned = name.clone();
        let result = tokio::task::spawn_blocking(move || store.open(&name_owned, &password)).await;

        match result {
            Ok(Ok(vault)) => {
                self.state().await.open = Some(vault);
                tracing::info!(vault = %name, "vault opened");
                CommandOutcome::ok()
            }
            Ok(Err(VaultError::InvalidPassword)) => CommandOutcome::failed(INCORRECT_PASSWORD),
            Ok(Err(e)) => {
                tracing::warn!(vault = %name, "vault open failed: {e}");
                CommandOutcome::failed(GENERIC_FAILURE)
            }
            Err(e) => {
                tracing::warn!("vault open task failed: {e}");
                CommandOutcome::failed(GENERIC_FAILURE)
            }
        }
    }

    async fn lock_vault(&self) -> Result<(), GatewayError> {
        self.clear_clipboard_logged();
        if self.state().await.open.take().is_some() {
            tracing::info!("vault closed");
        }
        Ok(())
    }

    async fn retrieve_password_list(&self) -> Result<Vec<String>, GatewayError> {
        let mut state = self.state().await;
        Ok(state.vault_mut()?.names())
    }

    async fn add_password(&self, name: &str, password: &SecretString) -> Result<(), GatewayError> {
        validate_new_secret(name, password).map_err(|e| GatewayError::Rejected(e.to_string()))?;

        let mut state = self.state().await;
        let vault = state.vault_mut()?;
        let value = SecretString::from(password.expose_secret().to_owned());
        vault.insert(name.to_string(), value).map_err(|e| {
            tracing::warn!("secret insert failed: {e}");
            rejected(INSERT_FAILURE)
        })
    }

    async fn delete_password(&self, name: &str) -> Result<(), GatewayError> {
        let mut state = self.state().await;
        match state.vault_mut()?.remove(name) {
            Ok(()) => Ok(()),
            Err(VaultError::EntryNotFound(_)) => Err(rejected(UNKNOWN_SECRET)),
            Err(e) => {
                tracing::warn!("secret delete failed: {e}");
                Err(rejected(GENERIC_FAILURE))
            }
        }
    }

    async fn delete_vault(&self, id: VaultId) -> Result<(), GatewayError> {
        let mut state = self.state().await;
        let name = state.name_of(id).ok_or_else(|| rejected(GENERIC_FAILURE))?;

        if state.open.as_ref().is_some_and(|v| v.name() == name) {
            state.open = None;
            self.clear_clipboard_logged();
        }
        self.store.delete(&name).map_err(|e| {
            tracing::warn!(vault = %name, "vault delete failed: {e}");
            rejected(GENERIC_FAILURE)
        })?;
        state.catalog.retain(|v| v.id != id);
        tracing::info!(vault = %name, "vault file deleted");
        Ok(())
    }

    async fn five_number_rng(&self) -> Result<u32, GatewayError> {
        Ok(generate_confirmation_code())
    }

    async fn generate_password(&self, name: &str) -> Result<(), GatewayError> {
        if name.is_empty() {
            return Err(GatewayError::Rejected(ValidationError::EmptyName.to_string()));
        }

        let mut state = self.state().await;
        let vault = state.vault_mut()?;
        if vault.contains(name) {
            return Err(GatewayError::Rejected(VaultError::NameInUse.to_string()));
        }
        let generated = generate_alphanumeric(GENERATED_SECRET_LENGTH)
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
        match vault.insert(name.to_string(), SecretString::from(generated)) {
            Ok(()) => Ok(()),
            Err(e @ VaultError::NameInUse) => Err(GatewayError::Rejected(e.to_string())),
            Err(e) => {
                tracing::warn!("generated secret insert failed: {e}");
                Err(rejected(GENERIC_FAILURE))
            }
        }
    }

    async fn copy_to_clipboard(&self, name: &str) -> Result<(), GatewayError> {
        let mut state = self.state().await;
        let secret = state
            .vault_mut()?
            .reveal(name)
            .map_err(|_| rejected(UNKNOWN_SECRET))?;
        self.clipboard
            .write_secret(secret.expose_secret())
            .map_err(|e| GatewayError::Unavailable(e.to_string()))
    }

    async fn clear_clipboard(&self) -> Result<(), GatewayError> {
        self.clipboard
            .clear_now()
            .map_err(|e| GatewayError::Unavailable(e.to_string()))
    }
}
