//! Application configuration.
//!
//! Loaded from an optional TOML file with `HAVEN_`-prefixed environment
//! variable overrides (e.g. `HAVEN_SERVER__PORT=9090`). Every section has
//! serde defaults so an empty config is a valid config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::accounts::AccountsConfig;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub branding: BrandingConfig,
    pub auth: AuthConfig,
    pub paths: PathsConfig,
    pub terminal: TerminalConfig,
    pub accounts: AccountsConfig,
}

impl AppConfig {
    /// Load configuration from an optional TOML file plus environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        } else {
            builder = builder.add_source(File::with_name("haven").required(false));
        }

        builder = builder.add_source(Environment::with_prefix("HAVEN").separator("__"));

        let config = builder
            .build()
            .context("building configuration")?
            .try_deserialize::<AppConfig>()
            .context("deserializing configuration")?;

        Ok(config)
    }

    /// Validate the configuration for the current mode.
    pub fn validate(&self) -> Result<()> {
        self.auth.validate().context("auth configuration")?;
        Ok(())
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Branding values substituted into the portal page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandingConfig {
    pub os_name: String,
    pub os_icon: String,
    pub api_base: String,
    pub terminal_icon: String,
    pub folder_icon: String,
    pub settings_icon: String,
    pub logout_icon: String,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            os_name: "Haven".to_string(),
            os_icon: "\u{1f3e0}".to_string(),
            api_base: "/api".to_string(),
            terminal_icon: "\u{1f4bb}".to_string(),
            folder_icon: "\u{1f4c1}".to_string(),
            settings_icon: "\u{2699}".to_string(),
            logout_icon: "\u{1f6aa}".to_string(),
        }
    }
}

/// Session token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Enable development mode (permits running without a configured secret).
    pub dev_mode: bool,

    /// Session signing secret. Supports `env:VAR_NAME` indirection.
    /// REQUIRED when dev_mode is false.
    pub session_secret: Option<String>,

    /// Session lifetime in seconds.
    pub session_expiry_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            dev_mode: false,
            // No default secret - must be explicitly configured
            session_secret: None,
            session_expiry_secs: 86_400 * 7,
        }
    }
}

impl AuthConfig {
    /// Resolve the session secret, expanding `env:VAR_NAME` syntax.
    pub fn resolve_secret(&self) -> Result<Option<String>, ConfigValidationError> {
        match &self.session_secret {
            None => Ok(None),
            Some(value) => {
                if let Some(var_name) = value.strip_prefix("env:") {
                    match std::env::var(var_name) {
                        Ok(secret) if !secret.is_empty() => Ok(Some(secret)),
                        Ok(_) => Err(ConfigValidationError::EnvVarEmpty(var_name.to_string())),
                        Err(_) => Err(ConfigValidationError::EnvVarNotFound(var_name.to_string())),
                    }
                } else {
                    Ok(Some(value.clone()))
                }
            }
        }
    }

    /// Validate the configuration for the current mode.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.dev_mode {
            let secret = self.resolve_secret()?;

            match secret {
                None => return Err(ConfigValidationError::MissingSecret),
                Some(secret) => {
                    if secret == "change-this-secret-key-in-production" {
                        return Err(ConfigValidationError::InsecureSecret);
                    }
                    if secret.len() < 32 {
                        return Err(ConfigValidationError::SecretTooShort);
                    }
                }
            }
        }

        Ok(())
    }

    /// Generate a random session secret (dev mode fallback).
    ///
    /// Backed by the OS's cryptographically secure RNG via the `rand` crate.
    pub fn generate_secret() -> String {
        use rand::Rng;

        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        const SECRET_LENGTH: usize = 64;

        let mut rng = rand::rng();
        (0..SECRET_LENGTH)
            .map(|_| {
                let idx = rng.random_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error(
        "session secret is required when dev_mode is false; set auth.session_secret or HAVEN_AUTH__SESSION_SECRET"
    )]
    MissingSecret,
    #[error("session secret cannot be the well-known default value")]
    InsecureSecret,
    #[error("session secret must be at least 32 characters long")]
    SecretTooShort,
    #[error("environment variable '{0}' not found (referenced via env: in config)")]
    EnvVarNotFound(String),
    #[error("environment variable '{0}' is empty (referenced via env: in config)")]
    EnvVarEmpty(String),
}

/// On-disk layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory for server-owned state (user records live in `<data_dir>/users`).
    pub data_dir: PathBuf,
    /// Directory containing tenant home directories.
    pub homes_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            homes_dir: PathBuf::from("/home"),
        }
    }
}

/// Terminal sandbox configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Leading tokens permitted to execute.
    pub allowed_commands: Vec<String>,
    /// Leading tokens refused even if also allowed.
    pub blocked_commands: Vec<String>,
    /// Wall-clock limit per command, enforced by forceful termination.
    pub timeout_secs: u64,
    /// Shell used to interpret the command line.
    pub shell: String,
    /// PATH value handed to sandboxed commands.
    pub path_env: String,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            allowed_commands: default_allowed_commands(),
            blocked_commands: default_blocked_commands(),
            timeout_secs: 30,
            shell: "/bin/sh".to_string(),
            path_env: "/usr/local/bin:/usr/bin:/bin".to_string(),
        }
    }
}

fn default_allowed_commands() -> Vec<String> {
    [
        "ls", "cd", "pwd", "cat", "head", "tail", "wc", "mkdir", "rmdir", "touch", "cp", "mv",
        "rm", "echo", "date", "whoami", "id", "uname", "grep", "find", "sort", "uniq", "diff",
        "tar", "gzip", "gunzip", "zip", "unzip", "curl", "wget", "node", "npm", "npx", "python",
        "python3", "pip", "pip3", "git", "claude", "vim", "nano", "less", "more",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_blocked_commands() -> Vec<String> {
    [
        "sudo", "su", "passwd", "useradd", "userdel", "usermod", "chown", "chmod", "chgrp",
        "mount", "umount", "reboot", "shutdown", "halt", "poweroff", "systemctl", "service",
        "iptables", "ufw", "dd", "mkfs", "fdisk", "parted",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
