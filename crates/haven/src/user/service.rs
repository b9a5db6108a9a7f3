//! Registration and login logic.

use std::sync::Arc;

use chrono::Utc;
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

use crate::accounts::LinuxAccounts;

use super::store::{UserRecord, UserStore};

/// Credential and account failures.
///
/// Display strings are the exact client-visible messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    /// Login-time username shape failure.
    #[error("Invalid username format")]
    InvalidUsername,

    /// Registration-time username shape failure, with the rules spelled out.
    #[error("Invalid username. Must be 3-32 chars, start with letter, lowercase alphanumeric only.")]
    UsernameRules,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Username already taken")]
    AlreadyTaken,

    #[error("User not found")]
    NotFound,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Could not create user directory")]
    Provision,

    #[error("{0}")]
    Internal(String),
}

const MIN_PASSWORD_LEN: usize = 6;

/// Registration and login over the user store, delegating password hashing
/// to bcrypt and home provisioning to [`LinuxAccounts`].
pub struct UserService {
    store: UserStore,
    accounts: Arc<LinuxAccounts>,
    username_re: Regex,
}

impl UserService {
    /// Create the service.
    pub fn new(store: UserStore, accounts: Arc<LinuxAccounts>) -> Self {
        Self {
            store,
            accounts,
            username_re: Regex::new(r"^[a-z][a-z0-9_]{2,31}$").expect("username pattern compiles"),
        }
    }

    /// Check the username shape: 3-32 chars, leading lowercase letter,
    /// lowercase alphanumerics and underscores only.
    pub fn valid_username(&self, username: &str) -> bool {
        self.username_re.is_match(username)
    }

    /// Register a new user: validate, provision the OS account and home
    /// directory, hash the password, persist the record.
    pub async fn register(&self, username: &str, password: &str) -> Result<UserRecord, UserError> {
        if !self.valid_username(username) {
            return Err(UserError::UsernameRules);
        }

        if password.len() < MIN_PASSWORD_LEN {
            return Err(UserError::PasswordTooShort);
        }

        if self.store.exists(username).await {
            return Err(UserError::AlreadyTaken);
        }

        let provisioned = self
            .accounts
            .ensure_account(username)
            .await
            .map_err(|err| {
                warn!(username, error = %err, "account provisioning failed");
                UserError::Provision
            })?;
        if !provisioned {
            return Err(UserError::Provision);
        }

        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|err| UserError::Internal(err.to_string()))?;

        let now = Utc::now().timestamp();
        let record = UserRecord {
            username: username.to_string(),
            password_hash,
            created: now,
            last_login: now,
        };

        self.store
            .save(&record)
            .await
            .map_err(|err| UserError::Internal(err.to_string()))?;

        info!(username, "user registered");
        Ok(record)
    }

    /// Verify credentials and stamp `last_login`.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserRecord, UserError> {
        if !self.valid_username(username) {
            return Err(UserError::InvalidUsername);
        }

        let mut record = self
            .store
            .load(username)
            .await
            .map_err(|err| UserError::Internal(err.to_string()))?
            .ok_or(UserError::NotFound)?;

        let verified = bcrypt::verify(password, &record.password_hash).unwrap_or(false);
        if !verified {
            return Err(UserError::InvalidPassword);
        }

        record.last_login = Utc::now().timestamp();
        self.store
            .save(&record)
            .await
            .map_err(|err| UserError::Internal(err.to_string()))?;

        info!(username, "user logged in");
        Ok(record)
    }
}
