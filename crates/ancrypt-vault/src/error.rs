//! Vault error types for `ancrypt-vault`.

use ancrypt_crypto::CryptoError;
use thiserror::Error;

/// Errors produced by vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Cryptographic operation failed (delegated from `ancrypt-crypto`).
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Incorrect master password: the payload did not authenticate.
    #[error("invalid password")]
    InvalidPassword,

    /// Vault file not found.
    #[error("vault not found: {0}")]
    NotFound(String),

    /// A vault with this name already exists.
    #[error("vault already exists: {0}")]
    VaultAlreadyExists(String),

    /// Vault name is empty or cannot be used as a file name.
    #[error("invalid vault name: {0}")]
    InvalidName(String),

    /// An entry with this name already exists in the vault.
    #[error("Name already in use")]
    NameInUse,

    /// Entry not found by name.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// The vault file is malformed or from an unsupported format version.
    #[error("vault format error: {0}")]
    Format(String),

    /// Neither `APPDATA` nor `HOME` is set.
    #[error("no data directory: set APPDATA or HOME")]
    NoDataDir,

    /// I/O error from the filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        Self::Format(err.to_string())
    }
}
