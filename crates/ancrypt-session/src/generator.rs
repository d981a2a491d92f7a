//! Random secret generation under a user-chosen name.

use crate::error::SessionError;
use crate::forms::validate_secret_name;
use crate::gateway::SharedGateway;
use crate::secrets::{SecretList, SecretSnapshot};

/// Asks the backend to generate and store a secret, then refreshes.
#[derive(Clone)]
pub struct SecretGenerator {
    gateway: SharedGateway,
    secrets: SecretList,
}

impl SecretGenerator {
    #[must_use]
    pub fn new(gateway: SharedGateway, secrets: SecretList) -> Self {
        Self { gateway, secrets }
    }

    /// Generate a secret stored under `name`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Validation`] for an empty or overlong name
    /// - [`SessionError::Backend`] with the backend message (e.g. a
    ///   duplicate name); the epoch is not advanced
    pub async fn generate(&self, name: &str) -> Result<SecretSnapshot, SessionError> {
        let name = validate_secret_name(name)?;
        self.gateway.generate_password(name).await?;
        tracing::debug!(name, "secret generated");
        Ok(self.secrets.after_mutation().await)
    }
}

impl std::fmt::Debug for SecretGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretGenerator").finish_non_exhaustive()
    }
}
