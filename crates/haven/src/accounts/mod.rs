//! OS account and home-directory provisioning.
//!
//! Each tenant's home root is a real directory under `homes_dir`. When
//! system-user provisioning is enabled a matching Linux account is created
//! via `useradd` (through sudo when not running as root); when it is
//! disabled, or when account creation fails, the home directory is created
//! directly so registration still succeeds.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Configuration for OS account provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    /// Create real Linux users (requires root or passwordless sudo).
    /// When false only the home directory is provisioned.
    pub provision_system_users: bool,
    /// Use sudo for privileged commands when not running as root.
    pub use_sudo: bool,
    /// Login shell for created users.
    pub shell: String,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            provision_system_users: true,
            use_sudo: true,
            shell: "/bin/bash".to_string(),
        }
    }
}

/// Provisions tenant accounts and home directories.
#[derive(Debug)]
pub struct LinuxAccounts {
    config: AccountsConfig,
    homes_dir: PathBuf,
}

impl LinuxAccounts {
    /// Create a provisioner rooted at `homes_dir`.
    pub fn new(config: AccountsConfig, homes_dir: PathBuf) -> Self {
        Self { config, homes_dir }
    }

    /// The tenant's home root. Purely path arithmetic; nothing is created.
    pub fn home_dir(&self, username: &str) -> PathBuf {
        self.homes_dir.join(username)
    }

    /// Ensure the OS account and home directory exist for a tenant.
    ///
    /// Returns true when the home directory exists afterwards.
    pub async fn ensure_account(&self, username: &str) -> Result<bool> {
        let home = self.home_dir(username);

        if user_exists(username).await? {
            debug!(username, "system user already exists");
            tokio::fs::create_dir_all(&home)
                .await
                .with_context(|| format!("creating home directory {}", home.display()))?;
            return Ok(true);
        }

        if self.config.provision_system_users {
            match self.create_system_user(username, &home).await {
                Ok(()) => info!(username, home = %home.display(), "created system user"),
                Err(err) => {
                    // Unprivileged deployments land here.
                    warn!(username, error = %err, "useradd failed, creating home directory only");
                    tokio::fs::create_dir_all(&home)
                        .await
                        .with_context(|| format!("creating home directory {}", home.display()))?;
                }
            }
        } else {
            tokio::fs::create_dir_all(&home)
                .await
                .with_context(|| format!("creating home directory {}", home.display()))?;
        }

        Ok(tokio::fs::try_exists(&home).await.unwrap_or(false))
    }

    /// Ensure the home directory exists and return it.
    pub async fn ensure_home(&self, username: &str) -> Result<PathBuf> {
        let home = self.home_dir(username);
        tokio::fs::create_dir_all(&home)
            .await
            .with_context(|| format!("creating home directory {}", home.display()))?;
        Ok(home)
    }

    async fn create_system_user(&self, username: &str, home: &Path) -> Result<()> {
        let home_str = home.display().to_string();
        let args = [
            "-m",
            "-d",
            &home_str,
            "-s",
            &self.config.shell,
            username,
        ];

        run_privileged(self.config.use_sudo, "useradd", &args).await
    }
}

/// Check whether a system user exists via `id`.
async fn user_exists(username: &str) -> Result<bool> {
    let output = Command::new("id")
        .arg(username)
        .output()
        .await
        .context("checking if user exists")?;

    Ok(output.status.success())
}

/// Run a command with optional sudo.
async fn run_privileged(use_sudo: bool, cmd: &str, args: &[&str]) -> Result<()> {
    let is_root = unsafe { libc::geteuid() } == 0;

    let output = if use_sudo && !is_root {
        debug!("running: sudo -n {} {:?}", cmd, args);
        Command::new("sudo")
            .arg("-n")
            .arg(cmd)
            .args(args)
            .output()
            .await
            .with_context(|| format!("running sudo {cmd}"))?
    } else {
        debug!("running: {} {:?}", cmd, args);
        Command::new(cmd)
            .args(args)
            .output()
            .await
            .with_context(|| format!("running {cmd}"))?
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("command failed: {} {:?}: {}", cmd, args, stderr.trim());
    }

    Ok(())
}
