//! In-memory command gateway for controller tests.

#![allow(dead_code, clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ancrypt_session::model::{CommandOutcome, VaultId, VaultSummary};
use ancrypt_session::{
    CommandGateway, ControllerSettings, GatewayError, SharedGateway, VaultController,
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug, Clone)]
struct FakeVault {
    name: String,
    password: String,
    secrets: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct FakeState {
    vaults: Vec<FakeVault>,
    open: Option<usize>,
    clipboard: Option<String>,
    codes: VecDeque<u32>,
    list_delays: VecDeque<Duration>,
    catalog_delay: Duration,
    open_delay: Duration,
    delete_delay: Duration,
    lock_delay: Duration,
    fail_catalog: bool,
    fail_list: bool,
    fail_delete: Option<String>,
    fail_lock: bool,
    fail_copy: bool,
    calls: Vec<String>,
}

/// Scriptable [`CommandGateway`] keeping everything in memory.
#[derive(Debug, Default)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Gateway with one vault holding `secrets` (value = name reversed).
    pub fn with_vault(name: &str, password: &str, secrets: &[&str]) -> Arc<Self> {
        let gateway = Self::new();
        gateway.add_vault(name, password, secrets);
        gateway
    }

    pub fn add_vault(&self, name: &str, password: &str, secrets: &[&str]) {
        let secrets = secrets
            .iter()
            .map(|s| ((*s).to_string(), s.chars().rev().collect()))
            .collect();
        self.state().vaults.push(FakeVault {
            name: name.to_string(),
            password: password.to_string(),
            secrets,
        });
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn record(&self, call: impl Into<String>) {
        self.state().calls.push(call.into());
    }

    /// Every call so far, as `method` or `method:arg`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Number of calls to `method`.
    pub fn count(&self, method: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.split(':').next() == Some(method))
            .count()
    }

    /// Secret names the backend holds for the open vault.
    pub fn backend_names(&self) -> Vec<String> {
        let state = self.state();
        state
            .open
            .map(|i| state.vaults[i].secrets.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_open(&self) -> bool {
        self.state().open.is_some()
    }

    pub fn clipboard(&self) -> Option<String> {
        self.state().clipboard.clone()
    }

    pub fn push_code(&self, code: u32) {
        self.state().codes.push_back(code);
    }

    /// Delay applied to the next `retrieve_password_list` calls, in order.
    pub fn push_list_delay(&self, delay: Duration) {
        self.state().list_delays.push_back(delay);
    }

    pub fn set_catalog_delay(&self, delay: Duration) {
        self.state().catalog_delay = delay;
    }

    /// Delay applied to every `open_vault` before it answers.
    pub fn set_open_delay(&self, delay: Duration) {
        self.state().open_delay = delay;
    }

    /// Delay applied to every `delete_password` before it acts.
    pub fn set_delete_delay(&self, delay: Duration) {
        self.state().delete_delay = delay;
    }

    /// Delay applied to every `lock_vault` before it acts.
    pub fn set_lock_delay(&self, delay: Duration) {
        self.state().lock_delay = delay;
    }

    pub fn fail_catalog(&self, fail: bool) {
        self.state().fail_catalog = fail;
    }

    pub fn fail_list(&self, fail: bool) {
        self.state().fail_list = fail;
    }

    pub fn fail_delete(&self, message: Option<&str>) {
        self.state().fail_delete = message.map(str::to_string);
    }

    pub fn fail_lock(&self, fail: bool) {
        self.state().fail_lock = fail;
    }

    pub fn fail_copy(&self, fail: bool) {
        self.state().fail_copy = fail;
    }

    fn with_open<T>(
        &self,
        f: impl FnOnce(&mut FakeVault) -> Result<T, GatewayError>,
    ) -> Result<T, GatewayError> {
        let mut state = self.state();
        let index = state
            .open
            .ok_or_else(|| GatewayError::Rejected("No vault is open".into()))?;
        f(&mut state.vaults[index])
    }
}

#[async_trait]
impl CommandGateway for FakeGateway {
    async fn request_vaults(&self) -> Result<Vec<VaultSummary>, GatewayError> {
        self.record("request_vaults");
        let (result, delay) = {
            let state = self.state();
            let result = if state.fail_catalog {
                Err(GatewayError::Unavailable("catalog offline".into()))
            } else {
                Ok((0u32..)
                    .zip(&state.vaults)
                    .map(|(id, v)| VaultSummary {
                        name: v.name.clone(),
                        id: VaultId(id),
                    })
                    .collect())
            };
            (result, state.catalog_delay)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn create_vault(&self, name: &str, password: &SecretString) -> CommandOutcome {
        self.record(format!("create_vault:{name}"));
        if name.is_empty() || password.expose_secret().is_empty() {
            return CommandOutcome::failed("Invalid vault name and/or password. Try again!");
        }
        let mut state = self.state();
        if state.vaults.iter().any(|v| v.name == name) {
            return CommandOutcome::failed("A vault with that name already exists");
        }
        state.vaults.push(FakeVault {
            name: name.to_string(),
            password: password.expose_secret().to_string(),
            secrets: BTreeMap::new(),
        });
        CommandOutcome::ok()
    }

    async fn open_vault(&self, id: VaultId, password: &SecretString) -> CommandOutcome {
        self.record(format!("open_vault:{id}"));
        let delay = self.state().open_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state();
        let index = id.0 as usize;
        let password_ok = state
            .vaults
            .get(index)
            .map(|v| v.password == password.expose_secret());
        match password_ok {
            Some(true) => {
                state.open = Some(index);
                CommandOutcome::ok()
            }
            Some(false) => CommandOutcome::failed("Incorrect Password"),
            None => CommandOutcome::failed("Something went wrong"),
        }
    }

    async fn lock_vault(&self) -> Result<(), GatewayError> {
        self.record("lock_vault");
        let delay = self.state().lock_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state();
        state.open = None;
        state.clipboard = None;
        if state.fail_lock {
            return Err(GatewayError::Unavailable("lock failed".into()));
        }
        Ok(())
    }

    async fn retrieve_password_list(&self) -> Result<Vec<String>, GatewayError> {
        self.record("retrieve_password_list");
        let delay = self.state().list_delays.pop_front().unwrap_or_default();
        let result = if self.state().fail_list {
            Err(GatewayError::Unavailable("list offline".into()))
        } else {
            self.with_open(|v| Ok(v.secrets.keys().cloned().collect()))
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn add_password(&self, name: &str, password: &SecretString) -> Result<(), GatewayError> {
        self.record(format!("add_password:{name}"));
        self.with_open(|v| {
            if v.secrets.contains_key(name) {
                return Err(GatewayError::Rejected(
                    "Something went wrong inserting your password".into(),
                ));
            }
            v.secrets
                .insert(name.to_string(), password.expose_secret().to_string());
            Ok(())
        })
    }

    async fn delete_password(&self, name: &str) -> Result<(), GatewayError> {
        self.record(format!("delete_password:{name}"));
        let delay = self.state().delete_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.state().fail_delete.clone() {
            return Err(GatewayError::Rejected(message));
        }
        self.with_open(|v| {
            v.secrets
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| GatewayError::Rejected("That's not an existing password".into()))
        })
    }

    async fn delete_vault(&self, id: VaultId) -> Result<(), GatewayError> {
        self.record(format!("delete_vault:{id}"));
        let mut state = self.state();
        let index = id.0 as usize;
        if index >= state.vaults.len() {
            return Err(GatewayError::Rejected("Something went wrong".into()));
        }
        state.vaults.remove(index);
        state.open = None;
        Ok(())
    }

    async fn five_number_rng(&self) -> Result<u32, GatewayError> {
        self.record("five_number_rng");
        Ok(self.state().codes.pop_front().unwrap_or(42_424))
    }

    async fn generate_password(&self, name: &str) -> Result<(), GatewayError> {
        self.record(format!("generate_password:{name}"));
        self.with_open(|v| {
            if v.secrets.contains_key(name) {
                return Err(GatewayError::Rejected("Name already in use".into()));
            }
            v.secrets.insert(name.to_string(), "Gen3ratedSecret123".into());
            Ok(())
        })
    }

    async fn copy_to_clipboard(&self, name: &str) -> Result<(), GatewayError> {
        self.record(format!("copy_to_clipboard:{name}"));
        if self.state().fail_copy {
            return Err(GatewayError::Unavailable("clipboard busy".into()));
        }
        let value = self.with_open(|v| {
            v.secrets
                .get(name)
                .cloned()
                .ok_or_else(|| GatewayError::Rejected("That's not an existing password".into()))
        })?;
        self.state().clipboard = Some(value);
        Ok(())
    }

    async fn clear_clipboard(&self) -> Result<(), GatewayError> {
        self.record("clear_clipboard");
        self.state().clipboard = None;
        Ok(())
    }
}

/// Controller over `gateway` with default settings.
pub fn controller(gateway: &Arc<FakeGateway>) -> VaultController {
    controller_with(gateway, ControllerSettings::default())
}

pub fn controller_with(gateway: &Arc<FakeGateway>, settings: ControllerSettings) -> VaultController {
    let shared: SharedGateway = Arc::clone(gateway) as SharedGateway;
    VaultController::new(shared, settings)
}

/// Controller with vault 0 already unlocked.
pub async fn unlocked(gateway: &Arc<FakeGateway>, password: &str) -> VaultController {
    let controller = controller(gateway);
    controller.refresh_catalog().await;
    controller
        .unlock_with_password(VaultId(0), &SecretString::from(password))
        .await
        .unwrap();
    controller
}

pub fn names(list: &[ancrypt_session::SecretEntry]) -> Vec<String> {
    list.iter().map(|e| e.name.clone()).collect()
}
