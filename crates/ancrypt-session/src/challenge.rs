//! Delete confirmation challenge.
//!
//! Deleting a secret requires typing back a random five-digit code. A
//! matching code issues exactly one `delete_password`; a mismatch issues
//! none and keeps the same code.
//!
//! Every open or cancel starts a new attempt. A delete that fails after
//! its attempt was cancelled (for example by a lock) or after the session
//! changed is not put back.

use std::sync::{Arc, Mutex};

use ancrypt_crypto::CONFIRMATION_CODE_MAX;
use serde::Serialize;

use crate::error::SessionError;
use crate::forms::parse_code_input;
use crate::gateway::SharedGateway;
use crate::lock_unpoisoned;
use crate::secrets::{SecretList, SecretSnapshot};

/// An open delete confirmation for one secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteChallenge {
    /// Code the user must type, `0..=99_999`.
    pub expected_code: u32,
    /// Code typed so far.
    pub entered_code: u32,
    /// Secret name to delete.
    pub target: String,
    /// Message from the last failed confirm.
    pub error: Option<String>,
}

impl DeleteChallenge {
    fn new(target: String, expected_code: u32) -> Self {
        Self {
            expected_code,
            entered_code: 0,
            target,
            error: None,
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    challenge: Option<DeleteChallenge>,
    attempt: u64,
    generation: u64,
}

impl Slot {
    fn replace(&mut self, challenge: Option<DeleteChallenge>, generation: u64) {
        self.challenge = challenge;
        self.attempt = self.attempt.wrapping_add(1);
        self.generation = generation;
    }
}

/// Manages at most one [`DeleteChallenge`] at a time.
#[derive(Clone)]
pub struct DeleteConfirmation {
    gateway: SharedGateway,
    secrets: SecretList,
    current: Arc<Mutex<Slot>>,
}

impl DeleteConfirmation {
    /// No challenge open.
    #[must_use]
    pub fn new(gateway: SharedGateway, secrets: SecretList) -> Self {
        Self {
            gateway,
            secrets,
            current: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// The open challenge, if any.
    #[must_use]
    pub fn current(&self) -> Option<DeleteChallenge> {
        lock_unpoisoned(&self.current).challenge.clone()
    }

    /// Open a challenge for `target`, replacing any open one.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Backend`] if the backend cannot supply a
    /// code or supplies one out of range, and [`SessionError::NotUnlocked`]
    /// if the session changed while the code was requested.
    pub async fn open(&self, target: &str) -> Result<DeleteChallenge, SessionError> {
        let generation = self.secrets.generation();
        let code = self.gateway.five_number_rng().await?;
        if code > CONFIRMATION_CODE_MAX {
            return Err(SessionError::Backend(format!(
                "confirmation code out of range: {code}"
            )));
        }
        if self.secrets.generation() != generation {
            return Err(SessionError::NotUnlocked);
        }
        let challenge = DeleteChallenge::new(target.to_string(), code);
        lock_unpoisoned(&self.current).replace(Some(challenge.clone()), generation);
        tracing::debug!(secret = target, "delete confirmation opened");
        Ok(challenge)
    }

    /// Record typed input (see [`parse_code_input`]); returns the parsed
    /// value.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoChallenge`] if none is open.
    pub fn enter(&self, text: &str) -> Result<u32, SessionError> {
        let mut current = lock_unpoisoned(&self.current);
        let challenge = current
            .challenge
            .as_mut()
            .ok_or(SessionError::NoChallenge)?;
        challenge.entered_code = parse_code_input(text);
        Ok(challenge.entered_code)
    }

    /// Close the challenge without deleting anything.
    pub fn cancel(&self) {
        let mut current = lock_unpoisoned(&self.current);
        let was_open = current.challenge.is_some();
        let generation = current.generation;
        current.replace(None, generation);
        if was_open {
            tracing::debug!("delete confirmation cancelled");
        }
    }

    /// Compare codes and, on a match, delete the target.
    ///
    /// The challenge is taken out of the slot while the delete is in
    /// flight, so a second confirm cannot issue a second delete. On backend
    /// failure it is put back with the message recorded, but only if no
    /// open, cancel or lock happened meanwhile.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NoChallenge`] if none is open
    /// - [`SessionError::ChallengeMismatch`] if the codes differ
    /// - [`SessionError::Backend`] with the backend message
    pub async fn confirm(&self) -> Result<SecretSnapshot, SessionError> {
        let (challenge, attempt, generation) = {
            let mut current = lock_unpoisoned(&self.current);
            let open = current
                .challenge
                .as_mut()
                .ok_or(SessionError::NoChallenge)?;
            if open.entered_code != open.expected_code {
                open.error = Some(SessionError::ChallengeMismatch.to_string());
                return Err(SessionError::ChallengeMismatch);
            }
            let challenge = current.challenge.take().ok_or(SessionError::NoChallenge)?;
            (challenge, current.attempt, current.generation)
        };

        match self.gateway.delete_password(&challenge.target).await {
            Ok(()) => {
                tracing::debug!(secret = %challenge.target, "secret deleted");
                Ok(self.secrets.after_mutation().await)
            }
            Err(e) => {
                let err = SessionError::from(e);
                let session_generation = self.secrets.generation();
                let mut current = lock_unpoisoned(&self.current);
                if current.attempt == attempt
                    && current.generation == generation
                    && session_generation == generation
                    && current.challenge.is_none()
                {
                    current.challenge = Some(DeleteChallenge {
                        error: Some(err.to_string()),
                        ..challenge
                    });
                } else {
                    tracing::debug!(
                        secret = %challenge.target,
                        "dropping superseded delete challenge"
                    );
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for DeleteConfirmation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeleteConfirmation")
            .field("open", &lock_unpoisoned(&self.current).challenge.is_some())
            .finish_non_exhaustive()
    }
}
