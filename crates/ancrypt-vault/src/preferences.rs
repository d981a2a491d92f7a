//! User preferences, stored as plain JSON next to the vault directory.
//!
//! Readable before any vault is unlocked so the catalog poll interval and
//! clipboard timeout apply from the first screen.

use std::fs;
use std::path::Path;
use std::time::Duration;

use ancrypt_crypto::KdfPreset;
use serde::{Deserialize, Serialize};

/// Application preferences.
///
/// Persisted to `{data_dir}/preferences.json`. Every field has a default so
/// partial or older files still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Milliseconds before the clipboard is cleared after a copy. Read it
    /// through [`Preferences::clipboard_auto_clear`], which caps it.
    #[serde(default = "default_clipboard_auto_clear")]
    pub clipboard_auto_clear_ms: u32,

    /// Milliseconds between vault catalog refreshes on the catalog screen.
    #[serde(default = "default_catalog_poll_interval")]
    pub catalog_poll_interval_ms: u32,

    /// Whether a failed unlock empties the password field.
    #[serde(default)]
    pub clear_password_on_failed_unlock: bool,

    /// KDF cost for newly created vaults.
    #[serde(default)]
    pub kdf_preset: KdfPreset,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            clipboard_auto_clear_ms: default_clipboard_auto_clear(),
            catalog_poll_interval_ms: default_catalog_poll_interval(),
            clear_password_on_failed_unlock: false,
            kdf_preset: KdfPreset::default(),
        }
    }
}

/// Longest clipboard exposure a preference file can ask for.
pub const MAX_CLIPBOARD_AUTO_CLEAR_MS: u32 = 30_000;

const fn default_clipboard_auto_clear() -> u32 {
    MAX_CLIPBOARD_AUTO_CLEAR_MS
}
const fn default_catalog_poll_interval() -> u32 {
    10_000
}

// ── File I/O ───────────────────────────────────────────────────────

const PREFERENCES_FILE: &str = "preferences.json";

impl Preferences {
    /// Clipboard auto-clear delay, capped at [`MAX_CLIPBOARD_AUTO_CLEAR_MS`].
    #[must_use]
    pub fn clipboard_auto_clear(&self) -> Duration {
        let ms = self.clipboard_auto_clear_ms.min(MAX_CLIPBOARD_AUTO_CLEAR_MS);
        Duration::from_millis(u64::from(ms))
    }

    /// Load preferences from `{data_dir}/preferences.json`.
    ///
    /// Returns [`Default::default()`] when the file is missing or holds
    /// invalid JSON.
    #[must_use]
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(PREFERENCES_FILE);
        fs::read_to_string(&path).map_or_else(
            |_| Self::default(),
            |contents| serde_json::from_str(&contents).unwrap_or_default(),
        )
    }

    /// Persist preferences to `{data_dir}/preferences.json` (tmp + rename).
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the directory does not exist or the
    /// file system rejects the write/rename.
    pub fn save(&self, data_dir: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        crate::store::write_atomic(&data_dir.join(PREFERENCES_FILE), json.as_bytes())
    }
}

// ── Tests ──────────────────────────────────────────────────────────
