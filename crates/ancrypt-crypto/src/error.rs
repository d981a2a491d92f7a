//! Cryptographic error types for `ancrypt-crypto`.

use thiserror::Error;

/// Errors produced by cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key derivation failed (Argon2id parameter validation, memory allocation).
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Symmetric encryption failure or malformed sealed payload.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Authentication tag verification failed: wrong key or tampered payload.
    #[error("decryption failed: authentication tag mismatch")]
    Decryption,

    /// CSPRNG failure.
    #[error("secure memory error: {0}")]
    SecureMemory(String),

    /// Secret generation failure (invalid parameters).
    #[error("password generation error: {0}")]
    PasswordGeneration(String),
}
