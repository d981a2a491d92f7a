//! Argon2id key derivation for vault master passwords.
//!
//! The parameter set is chosen at vault creation from a [`KdfPreset`] and
//! stored in the vault file so later unlocks re-derive with the same cost.

use crate::error::CryptoError;
use crate::memory::SecretBuffer;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Output length of the KDF in bytes (256 bits).
pub const OUTPUT_LEN: usize = 32;

/// Minimum salt length in bytes.
pub const MIN_SALT_LEN: usize = 16;

/// 64 MiB in KiB.
const MEMORY_64MB: u32 = 65_536;

/// 128 MiB in KiB.
const MEMORY_128MB: u32 = 131_072;

/// 256 MiB in KiB.
const MEMORY_256MB: u32 = 262_144;

/// Argon2id parameter set, persisted alongside each vault.
///
/// `m_cost` is in KiB, `t_cost` is the iteration count, `p_cost` the lane
/// count (the `argon2` crate conventions).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2idParams {
    /// Memory cost in kibibytes.
    pub m_cost: u32,
    /// Number of iterations.
    pub t_cost: u32,
    /// Degree of parallelism.
    pub p_cost: u32,
}

/// KDF cost selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KdfPreset {
    /// Modest hardware.
    Fast,
    /// Default for new vaults.
    #[default]
    Balanced,
    /// Highest cost.
    Maximum,
}

impl KdfPreset {
    /// Parameters used for vaults created with this preset.
    #[must_use]
    pub const fn params(self) -> Argon2idParams {
        match self {
            Self::Fast => Argon2idParams {
                m_cost: MEMORY_64MB,
                t_cost: 3,
                p_cost: 2,
            },
            Self::Balanced => Argon2idParams {
                m_cost: MEMORY_128MB,
                t_cost: 3,
                p_cost: 4,
            },
            Self::Maximum => Argon2idParams {
                m_cost: MEMORY_256MB,
                t_cost: 4,
                p_cost: 4,
            },
        }
    }
}

/// Derive a 256-bit key from a password and salt using Argon2id.
///
/// Password policy (non-empty, trimmed) is the caller's concern.
///
/// # Errors
///
/// Returns `CryptoError::KeyDerivation` if the salt is shorter than
/// [`MIN_SALT_LEN`], the parameters are rejected by `argon2`, or the
/// derivation itself fails.
pub fn derive(
    password: &[u8],
    salt: &[u8],
    params: &Argon2idParams,
) -> Result<SecretBuffer, CryptoError> {
    if salt.len() < MIN_SALT_LEN {
        return Err(CryptoError::KeyDerivation(format!(
            "salt too short: {} bytes (minimum {MIN_SALT_LEN})",
            salt.len()
        )));
    }

    let argon2_params = argon2::Params::new(
        params.m_cost,
        params.t_cost,
        params.p_cost,
        Some(OUTPUT_LEN),
    )
    .map_err(|e| CryptoError::KeyDerivation(format!("invalid argon2 params: {e}")))?;

    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2_params,
    );

    let mut output = [0u8; OUTPUT_LEN];
    argon2
        .hash_password_into(password, salt, &mut output)
        .map_err(|e| CryptoError::KeyDerivation(format!("argon2id derivation failed: {e}")))?;

    let result = SecretBuffer::new(&output);
    output.zeroize();
    Ok(result)
}
