//! Sandboxed command execution.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::TerminalConfig;

use super::policy::{Builtin, CommandPolicy, Decision};

/// Command execution failures.
///
/// Blocked and NotAllowed surface the same message on the wire but stay
/// distinct so callers and logs can tell policy precedence apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerminalError {
    #[error("No command provided")]
    EmptyCommand,

    #[error("Command not allowed: {0}")]
    Blocked(String),

    #[error("Command not allowed: {0}")]
    NotAllowed(String),

    #[error("Command timed out")]
    TimedOut,

    #[error("Failed to execute command: {0}")]
    Spawn(String),
}

/// Captured result of a completed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Right-trimmed standard output. Always present, possibly empty.
    pub output: String,
    /// Right-trimmed standard error, but only when the exit status was
    /// non-zero AND stderr was non-empty. A failing command that printed
    /// nothing to stderr carries no error at all.
    pub error: Option<String>,
}

impl ExecOutcome {
    fn output_only(output: String) -> Self {
        Self {
            output,
            error: None,
        }
    }
}

/// Executes tenant commands under policy, a reduced environment, and a
/// hard wall-clock timeout.
#[derive(Debug, Clone)]
pub struct CommandSandbox {
    policy: CommandPolicy,
    shell: String,
    path_env: String,
    timeout: Duration,
}

impl CommandSandbox {
    /// Build a sandbox from terminal configuration.
    pub fn new(config: &TerminalConfig) -> Self {
        Self {
            policy: CommandPolicy::new(
                config.allowed_commands.iter().cloned(),
                config.blocked_commands.iter().cloned(),
            ),
            shell: config.shell.clone(),
            path_env: config.path_env.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Classify and run a raw command line for a tenant.
    ///
    /// Only the leading token is checked against policy; the full original
    /// line is what the shell interprets.
    pub async fn run(
        &self,
        raw: &str,
        username: &str,
        home: &Path,
    ) -> Result<ExecOutcome, TerminalError> {
        let Some((base, _remainder)) = CommandPolicy::split(raw) else {
            return Err(TerminalError::EmptyCommand);
        };

        match self.policy.evaluate(base) {
            Decision::Blocked => {
                warn!(username, command = base, "blocked command rejected");
                Err(TerminalError::Blocked(base.to_string()))
            }
            Decision::NotAllowed => {
                debug!(username, command = base, "command not in allow list");
                Err(TerminalError::NotAllowed(base.to_string()))
            }
            Decision::Builtin(Builtin::Help) => {
                Ok(ExecOutcome::output_only(self.policy.help_text()))
            }
            Decision::Execute => self.spawn(raw.trim(), username, home).await,
        }
    }

    async fn spawn(
        &self,
        line: &str,
        username: &str,
        home: &Path,
    ) -> Result<ExecOutcome, TerminalError> {
        debug!(username, command = line, "executing command");

        let child = Command::new(&self.shell)
            .arg("-c")
            .arg(line)
            .current_dir(home)
            // Nothing from the server environment leaks into the sandbox.
            .env_clear()
            .env("HOME", home)
            .env("USER", username)
            .env("PATH", &self.path_env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TerminalError::Spawn(e.to_string()))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| TerminalError::Spawn(e.to_string()))?,
            Err(_) => {
                // kill_on_drop reaps the process; partial output is discarded.
                warn!(username, command = line, "command timed out");
                return Err(TerminalError::TimedOut);
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout)
            .trim_end()
            .to_string();
        let stderr = String::from_utf8_lossy(&output.stderr)
            .trim_end()
            .to_string();

        let error = (!output.status.success() && !stderr.is_empty()).then_some(stderr);

        Ok(ExecOutcome {
            output: stdout,
            error,
        })
    }
}
