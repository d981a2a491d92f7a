//! On-disk vault file format.
//!
//! A vault is one JSON document:
//!
//! ```json
//! { "version": 1, "kdf": { "m_cost": .., "t_cost": .., "p_cost": .. },
//!   "salt": "<base64>", "payload": "<base64 nonce || ciphertext || tag>" }
//! ```
//!
//! The payload is the AES-256-GCM sealed JSON map of entry name to secret,
//! with the format version and vault name bound as AAD.

use std::collections::BTreeMap;

use ancrypt_crypto::symmetric::{self, SealedData};
use ancrypt_crypto::{Argon2idParams, CryptoError, SecretBuffer};
use data_encoding::BASE64;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::VaultError;

/// Current vault file format version.
pub const FORMAT_VERSION: u8 = 1;

/// Salt length in bytes for Argon2id derivation.
pub const SALT_LEN: usize = 16;

/// File extension of vault files (without the dot).
pub const VAULT_EXTENSION: &str = "ancrypt";

/// Serialized vault file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultFile {
    /// Format version, must equal [`FORMAT_VERSION`].
    pub version: u8,
    /// KDF parameters the vault key was derived with.
    pub kdf: Argon2idParams,
    /// Base64 Argon2id salt.
    pub salt: String,
    /// Base64 sealed entry map.
    pub payload: String,
}

fn aad(vault_name: &str) -> Vec<u8> {
    format!("ancrypt-vault:v{FORMAT_VERSION}:{vault_name}").into_bytes()
}

impl VaultFile {
    /// Decode the salt, checking its length.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Format`] for bad base64 or a wrong-size salt.
    pub fn salt_bytes(&self) -> Result<[u8; SALT_LEN], VaultError> {
        let raw = BASE64
            .decode(self.salt.as_bytes())
            .map_err(|e| VaultError::Format(format!("salt: {e}")))?;
        raw.as_slice()
            .try_into()
            .map_err(|_| VaultError::Format(format!("salt is {} bytes", raw.len())))
    }

    /// Parse a vault file and check its version.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Format`] for malformed JSON or an unsupported
    /// version.
    pub fn parse(bytes: &[u8]) -> Result<Self, VaultError> {
        let file: Self = serde_json::from_slice(bytes)?;
        if file.version != FORMAT_VERSION {
            return Err(VaultError::Format(format!(
                "unsupported vault version {}",
                file.version
            )));
        }
        Ok(file)
    }

    /// Serialize to pretty JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Format`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, VaultError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

/// Encrypt the entry map into a [`VaultFile`].
///
/// # Errors
///
/// Returns [`VaultError::Crypto`] if sealing fails.
pub fn seal_entries(
    vault_name: &str,
    key: &[u8],
    salt: &[u8; SALT_LEN],
    kdf: &Argon2idParams,
    entries: &BTreeMap<String, SecretString>,
) -> Result<VaultFile, VaultError> {
    let exposed: BTreeMap<&str, &str> = entries
        .iter()
        .map(|(name, value)| (name.as_str(), value.expose_secret()))
        .collect();
    let mut plaintext = serde_json::to_vec(&exposed)?;
    drop(exposed);

    let sealed = symmetric::encrypt(&plaintext, key, &aad(vault_name));
    plaintext.zeroize();
    let sealed = sealed?;

    Ok(VaultFile {
        version: FORMAT_VERSION,
        kdf: kdf.clone(),
        salt: BASE64.encode(salt),
        payload: BASE64.encode(&sealed.to_bytes()),
    })
}

/// Decrypt the entry map of a [`VaultFile`].
///
/// # Errors
///
/// - [`VaultError::InvalidPassword`] if the payload does not authenticate
/// - [`VaultError::Format`] for malformed base64 or JSON
pub fn open_entries(
    vault_name: &str,
    key: &[u8],
    file: &VaultFile,
) -> Result<BTreeMap<String, SecretString>, VaultError> {
    let raw = BASE64
        .decode(file.payload.as_bytes())
        .map_err(|e| VaultError::Format(format!("payload: {e}")))?;
    let sealed = SealedData::from_bytes(&raw)?;

    let plaintext: SecretBuffer = match symmetric::decrypt(&sealed, key, &aad(vault_name)) {
        Ok(buf) => buf,
        Err(CryptoError::Decryption) => return Err(VaultError::InvalidPassword),
        Err(e) => return Err(e.into()),
    };

    let decoded: BTreeMap<String, String> = serde_json::from_slice(plaintext.expose())?;
    Ok(decoded
        .into_iter()
        .map(|(name, value)| (name, SecretString::from(value)))
        .collect())
}
