//! Data types shared by the controller components and the gateway.
//!
//! All DTOs serialize camelCase.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Names shorter than this many characters get [`LabelSize::Short`].
pub const SHORT_LABEL_THRESHOLD: usize = 10;

/// Backend-assigned vault identifier, unique within one catalog listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VaultId(pub u32);

impl fmt::Display for VaultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the vault catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultSummary {
    /// Display name of the vault.
    pub name: String,
    /// Identifier to pass back to `open_vault` / `delete_vault`.
    pub id: VaultId,
}

/// The single global session slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "vaultId")]
pub enum SessionState {
    /// No vault is open; the catalog is shown.
    #[default]
    Locked,
    /// An unlock attempt for this vault is awaiting the backend.
    Unlocking(VaultId),
    /// This vault is open.
    Unlocked(VaultId),
    /// A lock is being carried out.
    LockingOut,
}

impl SessionState {
    /// The vault currently open, if any.
    #[must_use]
    pub const fn unlocked_vault(self) -> Option<VaultId> {
        match self {
            Self::Unlocked(id) => Some(id),
            _ => None,
        }
    }
}

/// Display sizing hint for a secret label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelSize {
    /// Name has fewer than [`SHORT_LABEL_THRESHOLD`] characters.
    Short,
    /// Everything else.
    Long,
}

/// A secret as the controller sees it: a name, never a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretEntry {
    /// Secret name, unique within the vault.
    pub name: String,
    /// Label sizing derived from the name length.
    pub size: LabelSize,
}

impl SecretEntry {
    /// Build an entry, deriving the label size from `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let size = if name.chars().count() < SHORT_LABEL_THRESHOLD {
            LabelSize::Short
        } else {
            LabelSize::Long
        };
        Self { name, size }
    }
}

/// Success/failure envelope returned by `create_vault` and `open_vault`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    /// Whether the command succeeded.
    pub success: bool,
    /// User-facing failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CommandOutcome {
    /// A successful outcome.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// A failed outcome with a user-facing message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Monotonic counter of successful secret-list mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct RefreshEpoch(pub u64);

impl RefreshEpoch {
    /// The following epoch.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Screens the controller can navigate between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    /// Vault catalog (unauthenticated).
    Catalog,
    /// Unlocked vault workspace.
    Workspace,
}

/// Notifications broadcast to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "payload")]
pub enum ControllerEvent {
    /// Switch to another screen.
    Navigate(Screen),
    /// Non-blocking user-facing message.
    Alert(String),
    /// The vault catalog changed.
    CatalogUpdated(Vec<VaultSummary>),
    /// The visible secret list changed.
    SecretsUpdated(Vec<SecretEntry>),
    /// A copy request failed; nothing was placed on the clipboard.
    ClipboardCopyFailed {
        /// Secret name that was requested.
        name: String,
        /// Backend failure message.
        reason: String,
    },
}
