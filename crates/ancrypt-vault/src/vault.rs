//! The unlocked vault: decrypted entries plus the key needed to re-seal them.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use ancrypt_crypto::{Argon2idParams, SecretBytes};
use secrecy::SecretString;

use crate::error::VaultError;
use crate::format::{self, SALT_LEN};
use crate::store::write_atomic;

/// An open vault held in memory for the length of a session.
///
/// Every mutation is written back to disk before it returns. Dropping the
/// value zeroizes the key and every secret; `Debug` is masked.
pub struct UnlockedVault {
    name: String,
    path: PathBuf,
    key: SecretBytes<32>,
    salt: [u8; SALT_LEN],
    kdf: Argon2idParams,
    entries: BTreeMap<String, SecretString>,
}

impl UnlockedVault {
    pub(crate) fn new(
        name: String,
        path: PathBuf,
        key: SecretBytes<32>,
        salt: [u8; SALT_LEN],
        kdf: Argon2idParams,
        entries: BTreeMap<String, SecretString>,
    ) -> Self {
        Self {
            name,
            path,
            key,
            salt,
            kdf,
            entries,
        }
    }

    /// Vault name (the file stem).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the backing vault file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entry names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the vault holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if an entry with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Borrow the secret stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::EntryNotFound`] if there is no such entry.
    pub fn reveal(&self, name: &str) -> Result<&SecretString, VaultError> {
        self.entries
            .get(name)
            .ok_or_else(|| VaultError::EntryNotFound(name.to_string()))
    }

    /// Add a new entry and persist the vault.
    ///
    /// The in-memory map is rolled back if the write fails.
    ///
    /// # Errors
    ///
    /// - [`VaultError::NameInUse`] if an entry with this name exists
    /// - [`VaultError::Io`] / [`VaultError::Crypto`] if saving fails
    pub fn insert(&mut self, name: String, value: SecretString) -> Result<(), VaultError> {
        if self.entries.contains_key(&name) {
            return Err(VaultError::NameInUse);
        }
        self.entries.insert(name.clone(), value);
        if let Err(e) = self.save() {
            self.entries.remove(&name);
            return Err(e);
        }
        Ok(())
    }

    /// Remove an entry and persist the vault.
    ///
    /// # Errors
    ///
    /// - [`VaultError::EntryNotFound`] if there is no such entry
    /// - [`VaultError::Io`] / [`VaultError::Crypto`] if saving fails
    pub fn remove(&mut self, name: &str) -> Result<(), VaultError> {
        let Some(value) = self.entries.remove(name) else {
            return Err(VaultError::EntryNotFound(name.to_string()));
        };
        if let Err(e) = self.save() {
            self.entries.insert(name.to_string(), value);
            return Err(e);
        }
        Ok(())
    }

    /// Re-seal all entries and write the vault file atomically.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Crypto`] if sealing fails or
    /// [`VaultError::Io`] if the write fails.
    pub fn save(&self) -> Result<(), VaultError> {
        let file = format::seal_entries(
            &self.name,
            self.key.expose(),
            &self.salt,
            &self.kdf,
            &self.entries,
        )?;
        write_atomic(&self.path, &file.to_bytes()?)?;
        Ok(())
    }
}

impl fmt::Debug for UnlockedVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnlockedVault")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}
