//! Random secret and confirmation-code generation.
//!
//! - [`generate_alphanumeric`]: random secret drawn from `A-Z a-z 0-9`
//! - [`generate_confirmation_code`]: five-digit delete confirmation code
//!
//! All randomness comes from `OsRng`.

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::CryptoError;

/// Minimum allowed generated secret length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum allowed generated secret length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Length of secrets produced by the backend generator.
pub const GENERATED_SECRET_LENGTH: usize = 18;

/// Largest confirmation code (inclusive).
pub const CONFIRMATION_CODE_MAX: u32 = 99_999;

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";

fn pick(rng: &mut OsRng, set: &[u8]) -> u8 {
    set[rng.gen_range(0..set.len())]
}

/// Generate a random alphanumeric secret of `length` characters.
///
/// One uppercase letter, one lowercase letter and one digit are always
/// present; the rest is drawn from the combined pool and the result is
/// shuffled so the mandatory characters carry no positional bias.
///
/// # Errors
///
/// Returns [`CryptoError::PasswordGeneration`] if `length` is outside
/// [`MIN_PASSWORD_LENGTH`]..=[`MAX_PASSWORD_LENGTH`].
pub fn generate_alphanumeric(length: usize) -> Result<String, CryptoError> {
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        return Err(CryptoError::PasswordGeneration(format!(
            "length must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH}, got {length}"
        )));
    }

    let mut rng = OsRng;
    let pool: Vec<u8> = [UPPERCASE, LOWERCASE, DIGITS].concat();

    let mut chars = vec![
        pick(&mut rng, UPPERCASE),
        pick(&mut rng, LOWERCASE),
        pick(&mut rng, DIGITS),
    ];
    while chars.len() < length {
        chars.push(pick(&mut rng, &pool));
    }
    chars.shuffle(&mut rng);

    String::from_utf8(chars)
        .map_err(|e| CryptoError::PasswordGeneration(format!("non-ASCII output: {e}")))
}

/// Draw a delete confirmation code uniformly from `0..=99_999`.
#[must_use]
pub fn generate_confirmation_code() -> u32 {
    OsRng.gen_range(0..=CONFIRMATION_CODE_MAX)
}
