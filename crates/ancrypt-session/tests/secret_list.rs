#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Secret list refresh: mutations, epochs, stale responses, and the
//! add/generate forms.

mod support;

use std::sync::Arc;
use std::time::Duration;

use ancrypt_session::model::{LabelSize, RefreshEpoch};
use ancrypt_session::{
    CommandGateway, EventHub, SecretList, SessionError, SharedGateway, ValidationError,
};
use proptest::prelude::*;
use secrecy::SecretString;
use support::{names, unlocked, FakeGateway};

// ---------------------------------------------------------------------------
// Add
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_refreshes_and_clears_fields() {
    let gateway = FakeGateway::with_vault("Personal", "pw", &["github"]);
    let controller = unlocked(&gateway, "pw").await;
    let epoch = controller.epoch();

    controller.set_new_secret_name("a-very-long-secret-name");
    controller.set_new_secret_value("hunter2");
    let list = controller.add_secret().await.unwrap();

    assert_eq!(names(&list), vec!["a-very-long-secret-name", "github"]);
    assert_eq!(list[0].size, LabelSize::Long);
    assert_eq!(list[1].size, LabelSize::Short);
    assert_eq!(controller.epoch(), epoch.next());
    assert!(controller.new_secret_name().is_empty());
    assert!(controller.new_secret_value_is_empty());
}

#[tokio::test]
async fn add_validation_happens_before_backend() {
    let gateway = FakeGateway::with_vault("Personal", "pw", &[]);
    let controller = unlocked(&gateway, "pw").await;

    assert_eq!(
        controller.add_secret().await.unwrap_err(),
        SessionError::Validation(ValidationError::EmptyNameAndSecret)
    );
    controller.set_new_secret_value("hunter2");
    assert_eq!(
        controller.add_secret().await.unwrap_err(),
        SessionError::Validation(ValidationError::EmptyName)
    );
    controller.set_new_secret_value("");
    controller.set_new_secret_name("github");
    assert_eq!(
        controller.add_secret().await.unwrap_err(),
        SessionError::Validation(ValidationError::EmptySecret)
    );
    assert_eq!(gateway.count("add_password"), 0);
    assert_eq!(controller.epoch(), RefreshEpoch(0));
}

#[tokio::test]
async fn rejected_add_keeps_fields_and_epoch() {
    let gateway = FakeGateway::with_vault("Personal", "pw", &["github"]);
    let controller = unlocked(&gateway, "pw").await;

    controller.set_new_secret_name("github");
    controller.set_new_secret_value("again");
    let err = controller.add_secret().await.unwrap_err();

    assert_eq!(
        err,
        SessionError::Backend("Something went wrong inserting your password".into())
    );
    assert_eq!(controller.new_secret_name(), "github");
    assert!(!controller.new_secret_value_is_empty());
    assert_eq!(controller.epoch(), RefreshEpoch(0));
}

#[tokio::test]
async fn overlong_names_are_ignored_by_the_field() {
    let gateway = FakeGateway::with_vault("Personal", "pw", &[]);
    let controller = unlocked(&gateway, "pw").await;

    assert!(controller.set_generator_name("email"));
    assert!(!controller.set_generator_name(&"x".repeat(41)));
    assert_eq!(controller.generator_name(), "email");
}

// ---------------------------------------------------------------------------
// Generate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_adds_name_and_clears_field() {
    let gateway = FakeGateway::with_vault("Personal", "pw", &["github"]);
    let controller = unlocked(&gateway, "pw").await;

    controller.set_generator_name("email");
    let list = controller.generate_secret().await.unwrap();

    assert_eq!(names(&list), vec!["email", "github"]);
    assert!(controller.generator_name().is_empty());
    assert_eq!(controller.epoch(), RefreshEpoch(1));
}

#[tokio::test]
async fn duplicate_generate_keeps_name_and_list() {
    let gateway = FakeGateway::with_vault("Personal", "pw", &["github"]);
    let controller = unlocked(&gateway, "pw").await;

    controller.set_generator_name("github");
    let err = controller.generate_secret().await.unwrap_err();

    assert_eq!(err, SessionError::Backend("Name already in use".into()));
    assert_eq!(controller.generator_name(), "github");
    assert_eq!(names(&controller.secrets()), vec!["github"]);
    assert_eq!(controller.epoch(), RefreshEpoch(0));
}

#[tokio::test]
async fn empty_generator_name_is_rejected_locally() {
    let gateway = FakeGateway::with_vault("Personal", "pw", &[]);
    let controller = unlocked(&gateway, "pw").await;

    assert_eq!(
        controller.generate_secret().await.unwrap_err(),
        SessionError::Validation(ValidationError::EmptyName)
    );
    assert_eq!(gateway.count("generate_password"), 0);
}

#[tokio::test]
async fn failed_refresh_after_mutation_returns_cached_list() {
    let gateway = FakeGateway::with_vault("Personal", "pw", &["github"]);
    let controller = unlocked(&gateway, "pw").await;

    gateway.fail_list(true);
    controller.set_generator_name("email");
    let list = controller.generate_secret().await.unwrap();

    assert_eq!(names(&list), vec!["github"]);
    assert_eq!(controller.epoch(), RefreshEpoch(1));

    gateway.fail_list(false);
    let list = controller.refresh_secrets().await.unwrap();
    assert_eq!(names(&list), vec!["email", "github"]);
}

// ---------------------------------------------------------------------------
// Stale responses
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn response_for_older_epoch_is_discarded() {
    let gateway = FakeGateway::with_vault("Personal", "pw", &["github"]);
    let controller = unlocked(&gateway, "pw").await;

    // A slow manual refresh captures the list before the generate lands.
    gateway.push_list_delay(Duration::from_secs(5));
    let slow = tokio::spawn({
        let controller = controller.clone();
        async move { controller.refresh_secrets().await }
    });
    tokio::task::yield_now().await;

    controller.set_generator_name("email");
    let fresh = controller.generate_secret().await.unwrap();
    assert_eq!(names(&fresh), vec!["email", "github"]);

    let stale = slow.await.unwrap().unwrap();
    assert_eq!(names(&stale), vec!["email", "github"]);
    assert_eq!(names(&controller.secrets()), vec!["email", "github"]);
}

#[tokio::test(start_paused = true)]
async fn response_from_previous_session_is_discarded() {
    let gateway = FakeGateway::with_vault("Personal", "pw", &["github"]);
    let controller = unlocked(&gateway, "pw").await;

    gateway.push_list_delay(Duration::from_secs(5));
    let slow = tokio::spawn({
        let controller = controller.clone();
        async move { controller.refresh_secrets().await }
    });
    tokio::task::yield_now().await;

    controller.lock().await;
    slow.await.unwrap().unwrap();

    assert!(controller.secrets().is_empty());
}

#[tokio::test(start_paused = true)]
async fn same_epoch_last_resolved_wins() {
    let gateway: Arc<FakeGateway> = FakeGateway::with_vault("Personal", "pw", &["github"]);
    let _controller = unlocked(&gateway, "pw").await;
    let shared: SharedGateway = Arc::clone(&gateway) as SharedGateway;
    let list = SecretList::new(Arc::clone(&shared), EventHub::new());

    // Issued first, resolves last, carrying the older backend state.
    gateway.push_list_delay(Duration::from_secs(5));
    let slow = tokio::spawn({
        let list = list.clone();
        async move { list.refresh().await }
    });
    tokio::task::yield_now().await;

    shared
        .add_password("bank", &SecretString::from("v"))
        .await
        .unwrap();
    let quick = list.refresh().await.unwrap();
    assert_eq!(names(&quick), vec!["bank", "github"]);

    let last = slow.await.unwrap().unwrap();
    assert_eq!(names(&last), vec!["github"]);
    assert_eq!(names(&list.snapshot()), vec!["github"]);
    assert_eq!(list.epoch(), RefreshEpoch(0));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Op {
    Add(String),
    Generate(String),
    Delete(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let name = "[a-z]{1,12}";
    prop_oneof![
        name.prop_map(Op::Add),
        name.prop_map(Op::Generate),
        (0usize..8).prop_map(Op::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// After every successful mutation the visible list equals the
    /// backend's list, and the epoch counts exactly the successes.
    #[test]
    fn list_tracks_backend_after_mutations(ops in prop::collection::vec(op_strategy(), 1..12)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let gateway = FakeGateway::with_vault("Personal", "pw", &["github", "bank"]);
            let controller = unlocked(&gateway, "pw").await;
            let mut successes = 0u64;

            for op in ops {
                let result = match op {
                    Op::Add(name) => {
                        controller.set_new_secret_name(&name);
                        controller.set_new_secret_value("value");
                        controller.add_secret().await
                    }
                    Op::Generate(name) => {
                        controller.set_generator_name(&name);
                        controller.generate_secret().await
                    }
                    Op::Delete(index) => {
                        let current = controller.secrets();
                        let Some(target) = current.get(index) else { continue };
                        let challenge = controller.open_delete(&target.name).await.unwrap();
                        controller
                            .enter_delete_code(&challenge.expected_code.to_string())
                            .unwrap();
                        controller.confirm_delete().await
                    }
                };
                if let Ok(list) = result {
                    successes += 1;
                    prop_assert_eq!(names(&list), gateway.backend_names());
                }
                prop_assert_eq!(names(&controller.secrets()), gateway.backend_names());
                prop_assert_eq!(controller.epoch(), RefreshEpoch(successes));
            }
            Ok(())
        })?;
    }
}
