//! Input field state for the catalog and workspace screens.
//!
//! Fields hold exactly what the user typed, with the input rules applied:
//! names are capped at [`MAX_NAME_LEN`] characters (longer input is
//! ignored, not truncated) and the confirmation code keeps only digits.

use secrecy::{ExposeSecret, SecretString};

use crate::error::ValidationError;

/// Longest accepted secret name, in characters.
pub const MAX_NAME_LEN: usize = 40;

/// Digits kept from confirmation code input.
pub const MAX_CODE_DIGITS: usize = 6;

/// Parse confirmation code input: strip non-digits, keep the first
/// [`MAX_CODE_DIGITS`] digits. Empty input parses as `0`.
#[must_use]
pub fn parse_code_input(text: &str) -> u32 {
    text.chars()
        .filter(char::is_ascii_digit)
        .take(MAX_CODE_DIGITS)
        .filter_map(|c| c.to_digit(10))
        .fold(0u32, |acc, d| acc.saturating_mul(10).saturating_add(d))
}

/// Check a secret name for generate/add.
///
/// # Errors
///
/// [`ValidationError::EmptyName`] or [`ValidationError::NameTooLong`].
pub fn validate_secret_name(name: &str) -> Result<&str, ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong);
    }
    Ok(name)
}

/// Check a manually entered name/value pair.
///
/// # Errors
///
/// The matching [`ValidationError`] for whichever part is missing.
pub fn validate_new_secret(name: &str, value: &SecretString) -> Result<(), ValidationError> {
    match (name.is_empty(), value.expose_secret().is_empty()) {
        (true, true) => Err(ValidationError::EmptyNameAndSecret),
        (true, false) => Err(ValidationError::EmptyName),
        (false, true) => Err(ValidationError::EmptySecret),
        (false, false) => validate_secret_name(name).map(|_| ()),
    }
}

// ── Fields ─────────────────────────────────────────────────────────

/// A secret name input limited to [`MAX_NAME_LEN`] characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameField {
    value: String,
}

impl NameField {
    /// Replace the value. Input over the limit is ignored; returns whether
    /// the value was accepted.
    pub fn set(&mut self, input: &str) -> bool {
        if input.chars().count() > MAX_NAME_LEN {
            return false;
        }
        input.clone_into(&mut self.value);
        true
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Empty the field.
    pub fn clear(&mut self) {
        self.value.clear();
    }
}

/// A masked input (vault password, secret value). Zeroized on drop.
#[derive(Default)]
pub struct SecretField {
    value: Option<SecretString>,
}

impl SecretField {
    /// Replace the value.
    pub fn set(&mut self, input: &str) {
        self.value = Some(SecretString::from(input.to_owned()));
    }

    /// Copy the current value into a fresh secret.
    #[must_use]
    pub fn snapshot(&self) -> SecretString {
        SecretString::from(self.exposed().to_owned())
    }

    /// Returns `true` if nothing has been typed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exposed().is_empty()
    }

    /// Empty the field.
    pub fn clear(&mut self) {
        self.value = None;
    }

    fn exposed(&self) -> &str {
        self.value.as_ref().map_or("", |s| s.expose_secret())
    }
}

impl std::fmt::Debug for SecretField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretField(***)")
    }
}

/// Every input field the controller owns.
#[derive(Debug, Default)]
pub struct Forms {
    /// Catalog screen: password for the vault being unlocked.
    pub unlock_password: SecretField,
    /// Workspace: name of a manually added secret.
    pub new_secret_name: NameField,
    /// Workspace: value of a manually added secret.
    pub new_secret_value: SecretField,
    /// Workspace: name for a generated secret.
    pub generator_name: NameField,
}

impl Forms {
    /// Clear every workspace field (on lock).
    pub fn clear_workspace(&mut self) {
        self.new_secret_name.clear();
        self.new_secret_value.clear();
        self.generator_name.clear();
    }
}
