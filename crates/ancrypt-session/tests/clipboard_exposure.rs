#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Clipboard exposure: copy through the controller, the backend auto-clear
//! window, and explicit clears.

mod support;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ancrypt_crypto::Argon2idParams;
use ancrypt_session::model::{ControllerEvent, VaultId};
use ancrypt_session::{
    ControllerSettings, LocalBackend, MemoryClipboard, SharedGateway, VaultController,
};
use ancrypt_vault::Preferences;
use secrecy::SecretString;
use support::{unlocked, FakeGateway};
use tempfile::TempDir;

const fn test_params() -> Argon2idParams {
    Argon2idParams {
        m_cost: 32,
        t_cost: 1,
        p_cost: 1,
    }
}

fn local_controller(dir: &Path) -> (VaultController, MemoryClipboard) {
    let clipboard = MemoryClipboard::new();
    let prefs = Preferences::default();
    let backend = LocalBackend::new(dir, &prefs, Arc::new(clipboard.clone()))
        .with_kdf_params(test_params());
    let gateway: SharedGateway = Arc::new(backend);
    let controller = VaultController::new(gateway, ControllerSettings::from(&prefs));
    (controller, clipboard)
}

async fn unlocked_local(dir: &Path, secrets: &[(&str, &str)]) -> (VaultController, MemoryClipboard) {
    let (controller, clipboard) = local_controller(dir);
    controller
        .create_vault("Personal", &SecretString::from("pw"))
        .await
        .unwrap();
    controller
        .unlock_with_password(VaultId(0), &SecretString::from("pw"))
        .await
        .unwrap();
    for (name, value) in secrets {
        controller.set_new_secret_name(name);
        controller.set_new_secret_value(value);
        controller.add_secret().await.unwrap();
    }
    (controller, clipboard)
}

// ---------------------------------------------------------------------------
// Auto-clear window
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn clipboard_is_cleared_thirty_seconds_after_copy() {
    let dir = TempDir::new().unwrap();
    let (controller, clipboard) = unlocked_local(dir.path(), &[("github", "gh-token")]).await;

    assert!(controller.copy_secret("github").await);
    assert_eq!(clipboard.contents().as_deref(), Some("gh-token"));
    assert_eq!(controller.exposure_remaining(), Some(Duration::from_secs(30)));

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert_eq!(clipboard.contents().as_deref(), Some("gh-token"));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(clipboard.contents().is_none());
    assert!(controller.exposure_remaining().is_none());
}

#[tokio::test(start_paused = true)]
async fn second_copy_restarts_the_window() {
    let dir = TempDir::new().unwrap();
    let (controller, clipboard) =
        unlocked_local(dir.path(), &[("github", "gh-token"), ("bank", "1234")]).await;

    controller.copy_secret("github").await;
    tokio::time::sleep(Duration::from_secs(20)).await;
    controller.copy_secret("bank").await;

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(clipboard.contents().as_deref(), Some("1234"));

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert!(clipboard.contents().is_none());
}

#[tokio::test(start_paused = true)]
async fn explicit_clear_is_immediate_and_idempotent() {
    let dir = TempDir::new().unwrap();
    let (controller, clipboard) = unlocked_local(dir.path(), &[("github", "gh-token")]).await;

    controller.copy_secret("github").await;
    controller.clear_clipboard().await;
    assert!(clipboard.contents().is_none());
    assert!(controller.exposure_remaining().is_none());

    controller.clear_clipboard().await;
    assert!(clipboard.contents().is_none());
}

#[tokio::test(start_paused = true)]
async fn lock_clears_the_clipboard() {
    let dir = TempDir::new().unwrap();
    let (controller, clipboard) = unlocked_local(dir.path(), &[("github", "gh-token")]).await;

    controller.copy_secret("github").await;
    controller.lock().await;
    assert!(clipboard.contents().is_none());
}

// ---------------------------------------------------------------------------
// Copy failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_secret_copy_emits_failure_event() {
    let dir = TempDir::new().unwrap();
    let (controller, clipboard) = unlocked_local(dir.path(), &[]).await;
    let mut rx = controller.subscribe();

    assert!(!controller.copy_secret("missing").await);
    assert!(clipboard.contents().is_none());
    assert_eq!(
        rx.try_recv().unwrap(),
        ControllerEvent::ClipboardCopyFailed {
            name: "missing".into(),
            reason: "That's not an existing password".into(),
        }
    );
}

#[tokio::test]
async fn unavailable_clipboard_is_reported_not_returned() {
    let gateway = FakeGateway::with_vault("Personal", "pw", &["github"]);
    let controller = unlocked(&gateway, "pw").await;
    let mut rx = controller.subscribe();
    gateway.fail_copy(true);

    assert!(!controller.copy_secret("github").await);
    assert!(controller.exposure_remaining().is_none());
    match rx.try_recv().unwrap() {
        ControllerEvent::ClipboardCopyFailed { name, reason } => {
            assert_eq!(name, "github");
            assert!(reason.contains("clipboard busy"));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn copy_sends_name_not_value() {
    let gateway = FakeGateway::with_vault("Personal", "pw", &["github"]);
    let controller = unlocked(&gateway, "pw").await;

    assert!(controller.copy_secret("github").await);
    assert!(gateway.calls().contains(&"copy_to_clipboard:github".to_string()));
    assert_eq!(gateway.clipboard().as_deref(), Some("buhtig"));
}
