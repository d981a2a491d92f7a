//! Error types for the session controller and its backend gateway.
//!
//! All errors serialize as their display string so they can cross an IPC
//! boundary unchanged.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Input rejected locally before any backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Both the name and the secret value are empty.
    #[error("You need a password and a password name")]
    EmptyNameAndSecret,

    /// The secret name is empty.
    #[error("You need a password name")]
    EmptyName,

    /// The secret value is empty.
    #[error("You need a password")]
    EmptySecret,

    /// The secret name exceeds [`crate::forms::MAX_NAME_LEN`] characters.
    #[error("Password names are limited to 40 characters")]
    NameTooLong,
}

/// Failure reported by a [`crate::gateway::CommandGateway`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The backend refused the command; the message is shown verbatim.
    #[error("{0}")]
    Rejected(String),

    /// The backend could not be reached or failed internally.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by controller operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Local input validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backend rejected the command; message verbatim.
    #[error("{0}")]
    Backend(String),

    /// The entered delete confirmation code does not match.
    #[error("The code you entered was incorrect, try again!")]
    ChallengeMismatch,

    /// An unlock attempt is already awaiting the backend.
    #[error("an unlock is already in progress")]
    UnlockInProgress,

    /// The vault is being locked; retry once the catalog is shown.
    #[error("the vault is locking")]
    LockInProgress,

    /// A vault is already unlocked.
    #[error("a vault is already unlocked")]
    AlreadyUnlocked,

    /// The operation needs an unlocked vault.
    #[error("no vault is unlocked")]
    NotUnlocked,

    /// No delete confirmation is open.
    #[error("no delete confirmation is open")]
    NoChallenge,
}

impl From<GatewayError> for SessionError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Rejected(message) => Self::Backend(message),
            other @ GatewayError::Unavailable(_) => Self::Backend(other.to_string()),
        }
    }
}

impl Serialize for SessionError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl Serialize for GatewayError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
