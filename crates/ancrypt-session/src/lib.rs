//! `ancrypt-session`: vault session and secret exposure controller.
//!
//! Tracks which vault is open, keeps the visible secret list in sync with
//! the backend, gates deletes behind a confirmation code and routes
//! clipboard copies through a backend that wipes them after a timeout.
//!
//! The backend is reached only through [`CommandGateway`]; [`LocalBackend`]
//! implements it over `ancrypt-vault` files.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod backend;
pub mod catalog;
pub mod challenge;
pub mod clipboard;
pub mod controller;
pub mod error;
pub mod events;
pub mod exposure;
pub mod forms;
pub mod gateway;
pub mod generator;
pub mod model;
pub mod secrets;
pub mod session;
pub mod telemetry;

pub use backend::LocalBackend;
pub use catalog::{CatalogPoller, CatalogSubscription};
pub use challenge::{DeleteChallenge, DeleteConfirmation};
#[cfg(feature = "system-clipboard")]
pub use clipboard::SystemClipboard;
pub use clipboard::{ClipboardError, ClipboardGuard, ClipboardSink, MemoryClipboard};
pub use controller::{ControllerSettings, VaultController};
pub use error::{GatewayError, SessionError, ValidationError};
pub use events::EventHub;
pub use exposure::ClipboardExposure;
pub use gateway::{CommandGateway, SharedGateway};
pub use generator::SecretGenerator;
pub use model::{
    CommandOutcome, ControllerEvent, LabelSize, RefreshEpoch, Screen, SecretEntry, SessionState,
    VaultId, VaultSummary,
};
pub use secrets::{SecretList, SecretSnapshot};
pub use session::SessionController;

/// Lock a std mutex, recovering the data if a holder panicked.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
