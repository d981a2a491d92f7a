//! `ancrypt-crypto`: cryptographic primitives for Ancrypt vault backends.
//!
//! Key derivation, authenticated encryption, secret memory wrappers and the
//! random generators used by the backend (generated secrets and delete
//! confirmation codes). No I/O, no async.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;

pub mod kdf;
pub mod symmetric;

pub mod password;

pub use error::CryptoError;
pub use kdf::{derive, Argon2idParams, KdfPreset};
pub use memory::{SecretBuffer, SecretBytes};
pub use password::{
    generate_alphanumeric, generate_confirmation_code, CONFIRMATION_CODE_MAX,
    GENERATED_SECRET_LENGTH,
};
pub use symmetric::{decrypt, encrypt, SealedData};
