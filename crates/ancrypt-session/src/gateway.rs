//! The command surface between the controller and a vault backend.
//!
//! Every call may be slow and may fail. The controller never sees a secret
//! value: copies name the secret and the backend resolves and writes it.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::GatewayError;
use crate::model::{CommandOutcome, VaultId, VaultSummary};

/// Shared handle to a gateway implementation.
pub type SharedGateway = Arc<dyn CommandGateway>;

/// Backend command gateway.
#[async_trait]
pub trait CommandGateway: Send + Sync {
    /// List the vault catalog. Ids are valid until the next listing.
    async fn request_vaults(&self) -> Result<Vec<VaultSummary>, GatewayError>;

    /// Create a new, empty vault.
    async fn create_vault(&self, name: &str, password: &SecretString) -> CommandOutcome;

    /// Open (unlock) a vault from the last catalog listing.
    async fn open_vault(&self, id: VaultId, password: &SecretString) -> CommandOutcome;

    /// Close the open vault, destroy decrypted material and clear the
    /// clipboard.
    async fn lock_vault(&self) -> Result<(), GatewayError>;

    /// Secret names of the open vault.
    async fn retrieve_password_list(&self) -> Result<Vec<String>, GatewayError>;

    /// Store a new secret under `name`.
    async fn add_password(&self, name: &str, password: &SecretString)
        -> Result<(), GatewayError>;

    /// Delete the secret stored under `name`.
    async fn delete_password(&self, name: &str) -> Result<(), GatewayError>;

    /// Delete a vault from the last catalog listing.
    async fn delete_vault(&self, id: VaultId) -> Result<(), GatewayError>;

    /// Random delete confirmation code in `0..=99_999`.
    async fn five_number_rng(&self) -> Result<u32, GatewayError>;

    /// Generate and store a random secret under `name`.
    async fn generate_password(&self, name: &str) -> Result<(), GatewayError>;

    /// Put the secret stored under `name` on the clipboard and arm the
    /// auto-clear timer.
    async fn copy_to_clipboard(&self, name: &str) -> Result<(), GatewayError>;

    /// Clear the clipboard now and cancel the auto-clear timer.
    async fn clear_clipboard(&self) -> Result<(), GatewayError>;
}
