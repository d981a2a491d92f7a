//! Vault directory management: listing, creating, opening and deleting
//! vault files.
//!
//! Layout under the data directory:
//!
//! - `Vaults/<name>.ancrypt`: one file per vault
//! - `preferences.json`: see [`crate::preferences`]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ancrypt_crypto::kdf::{self, Argon2idParams};
use ancrypt_crypto::SecretBytes;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::VaultError;
use crate::format::{self, VaultFile, SALT_LEN, VAULT_EXTENSION};
use crate::vault::UnlockedVault;

/// Application folder name under `APPDATA` / `HOME`.
pub const APP_DIR: &str = "Ancrypt";

/// Vault folder name under the data directory.
pub const VAULTS_DIR: &str = "Vaults";

/// Longest accepted vault name, in characters.
pub const MAX_VAULT_NAME_LEN: usize = 64;

/// Resolve the data directory: `$APPDATA/Ancrypt`, else `$HOME/Ancrypt`.
///
/// # Errors
///
/// Returns [`VaultError::NoDataDir`] if neither variable is set.
pub fn default_data_dir() -> Result<PathBuf, VaultError> {
    std::env::var_os("APPDATA")
        .or_else(|| std::env::var_os("HOME"))
        .map(|base| PathBuf::from(base).join(APP_DIR))
        .ok_or(VaultError::NoDataDir)
}

/// Check that a vault name is usable as a file stem and return it trimmed.
///
/// # Errors
///
/// Returns [`VaultError::InvalidName`] for empty names, names longer than
/// [`MAX_VAULT_NAME_LEN`], names starting with `.`, or names containing path
/// separators or control characters.
pub fn validate_vault_name(name: &str) -> Result<&str, VaultError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(VaultError::InvalidName("name is empty".into()));
    }
    if trimmed.chars().count() > MAX_VAULT_NAME_LEN {
        return Err(VaultError::InvalidName(format!(
            "name is longer than {MAX_VAULT_NAME_LEN} characters"
        )));
    }
    if trimmed.starts_with('.')
        || trimmed
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(VaultError::InvalidName(format!("{trimmed:?}")));
    }
    Ok(trimmed)
}

/// Write `bytes` to `path` via a sibling `.tmp` file and rename.
///
/// The file is restricted to owner read/write on Unix.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"))?;
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    fs::write(&tmp, bytes)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
    }

    fs::rename(&tmp, path)
}

/// Handle on the vault folder of a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultStore {
    vaults_dir: PathBuf,
}

impl VaultStore {
    /// Store rooted at `{data_dir}/Vaults`.
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            vaults_dir: data_dir.join(VAULTS_DIR),
        }
    }

    /// The vault folder.
    #[must_use]
    pub fn vaults_dir(&self) -> &Path {
        &self.vaults_dir
    }

    /// Path of the file for vault `name`.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.vaults_dir.join(format!("{name}.{VAULT_EXTENSION}"))
    }

    /// Create the vault folder if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Io`] if the directory cannot be created.
    pub fn ensure_layout(&self) -> Result<(), VaultError> {
        fs::create_dir_all(&self.vaults_dir)?;
        Ok(())
    }

    /// Names of all vault files, sorted.
    ///
    /// The folder is created when missing, so a fresh install lists an
    /// empty catalog rather than failing.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Io`] if the folder cannot be created or read.
    pub fn list(&self) -> Result<Vec<String>, VaultError> {
        self.ensure_layout()?;

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.vaults_dir)?.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(VAULT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Returns `true` if a vault file for `name` exists.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Create an empty vault protected by `password`.
    ///
    /// Runs Argon2id with `params`; call from a blocking context.
    ///
    /// # Errors
    ///
    /// - [`VaultError::InvalidName`] if the name fails [`validate_vault_name`]
    /// - [`VaultError::VaultAlreadyExists`] if the file already exists
    /// - [`VaultError::Crypto`] if derivation or sealing fails
    /// - [`VaultError::Io`] if the file cannot be written
    pub fn create(
        &self,
        name: &str,
        password: &[u8],
        params: &Argon2idParams,
    ) -> Result<PathBuf, VaultError> {
        let name = validate_vault_name(name)?;
        let path = self.path_for(name);
        if path.exists() {
            return Err(VaultError::VaultAlreadyExists(name.to_string()));
        }
        self.ensure_layout()?;

        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let derived = kdf::derive(password, &salt, params)?;
        let key = SecretBytes::<32>::from_buffer(&derived)?;

        let file = format::seal_entries(name, key.expose(), &salt, params, &BTreeMap::new())?;
        write_atomic(&path, &file.to_bytes()?)?;
        Ok(path)
    }

    /// Open vault `name` with `password`.
    ///
    /// Runs Argon2id with the parameters stored in the file; call from a
    /// blocking context.
    ///
    /// # Errors
    ///
    /// - [`VaultError::NotFound`] if the file does not exist
    /// - [`VaultError::InvalidPassword`] if the password is wrong
    /// - [`VaultError::Format`] if the file is malformed
    pub fn open(&self, name: &str, password: &[u8]) -> Result<UnlockedVault, VaultError> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(VaultError::NotFound(name.to_string()));
        }

        let file = VaultFile::parse(&fs::read(&path)?)?;
        let salt = file.salt_bytes()?;

        let derived = kdf::derive(password, &salt, &file.kdf)?;
        let key = SecretBytes::<32>::from_buffer(&derived)?;
        let entries = format::open_entries(name, key.expose(), &file)?;

        Ok(UnlockedVault::new(
            name.to_string(),
            path,
            key,
            salt,
            file.kdf,
            entries,
        ))
    }

    /// Delete the file of vault `name`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotFound`] if it does not exist or
    /// [`VaultError::Io`] if removal fails.
    pub fn delete(&self, name: &str) -> Result<(), VaultError> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(VaultError::NotFound(name.to_string()));
        }
        fs::remove_file(path)?;
        Ok(())
    }
}
