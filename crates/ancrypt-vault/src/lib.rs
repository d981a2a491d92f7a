//! `ancrypt-vault`: vault storage for Ancrypt.
//!
//! One encrypted file per vault under `<data_dir>/Vaults`, the catalog of
//! those files, the in-memory unlocked vault, and plain-JSON preferences.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod format;
pub mod preferences;
pub mod store;
pub mod vault;

pub use error::VaultError;
pub use preferences::Preferences;
pub use store::{default_data_dir, validate_vault_name, VaultStore};
pub use vault::UnlockedVault;
