//! JSON-file-backed user store.
//!
//! One pretty-printed JSON file per user under `<data_dir>/users/`, keyed
//! by username. The username is the record's identity and never changes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A stored user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
    /// Registration time, epoch seconds.
    pub created: i64,
    /// Last successful login, epoch seconds.
    pub last_login: i64,
}

/// Filesystem repository for user records.
#[derive(Debug, Clone)]
pub struct UserStore {
    users_dir: PathBuf,
}

impl UserStore {
    /// Create a store rooted at `<data_dir>/users`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            users_dir: data_dir.join("users"),
        }
    }

    /// Ensure the backing directory exists.
    pub async fn init(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.users_dir)
            .await
            .with_context(|| format!("creating users directory {}", self.users_dir.display()))?;
        Ok(())
    }

    fn user_file(&self, username: &str) -> PathBuf {
        self.users_dir.join(format!("{username}.json"))
    }

    /// Check whether a record exists for the username.
    pub async fn exists(&self, username: &str) -> bool {
        tokio::fs::try_exists(self.user_file(username))
            .await
            .unwrap_or(false)
    }

    /// Load a record, if present.
    pub async fn load(&self, username: &str) -> Result<Option<UserRecord>> {
        let path = self.user_file(username);

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("reading user record {}", path.display()));
            }
        };

        let record = serde_json::from_str(&contents)
            .with_context(|| format!("parsing user record {}", path.display()))?;

        Ok(Some(record))
    }

    /// Persist a record, overwriting any previous version.
    pub async fn save(&self, record: &UserRecord) -> Result<()> {
        let path = self.user_file(&record.username);
        let contents =
            serde_json::to_string_pretty(record).context("serializing user record")?;

        tokio::fs::write(&path, contents)
            .await
            .with_context(|| format!("writing user record {}", path.display()))?;

        Ok(())
    }
}
