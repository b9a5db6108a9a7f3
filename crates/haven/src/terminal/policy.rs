//! Allow/block policy over leading command tokens.

use std::collections::{BTreeSet, HashSet};

/// Commands handled by the sandbox itself instead of the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// Report the allowed-command set.
    Help,
}

/// Outcome of classifying a leading token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Token is allowed; hand the full line to the shell.
    Execute,
    /// Token is in the blocked set. Blocked wins over allowed.
    Blocked,
    /// Token matched a builtin.
    Builtin(Builtin),
    /// Token is in neither set.
    NotAllowed,
}

/// The two policy sets gating which leading tokens may execute.
#[derive(Debug, Clone)]
pub struct CommandPolicy {
    // BTreeSet keeps help output sorted without re-sorting per call.
    allowed: BTreeSet<String>,
    blocked: HashSet<String>,
}

impl CommandPolicy {
    /// Build a policy from allow and block lists.
    pub fn new<A, B>(allowed: A, blocked: B) -> Self
    where
        A: IntoIterator<Item = String>,
        B: IntoIterator<Item = String>,
    {
        Self {
            allowed: allowed.into_iter().collect(),
            blocked: blocked.into_iter().collect(),
        }
    }

    /// Split a trimmed command line into its leading token and remainder.
    ///
    /// The remainder is never parsed further; it goes to the shell as-is.
    pub fn split(line: &str) -> Option<(&str, &str)> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match line.split_once(char::is_whitespace) {
            Some((base, rest)) => Some((base, rest.trim_start())),
            None => Some((line, "")),
        }
    }

    /// Classify a leading token. Evaluation order is block-before-allow.
    pub fn evaluate(&self, base: &str) -> Decision {
        if self.blocked.contains(base) {
            return Decision::Blocked;
        }
        if self.allowed.contains(base) {
            return Decision::Execute;
        }
        if base == "help" {
            return Decision::Builtin(Builtin::Help);
        }
        Decision::NotAllowed
    }

    /// Text reported by the `help` builtin: the allowed set, sorted.
    pub fn help_text(&self) -> String {
        let joined = self
            .allowed
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        format!("Available commands: {joined}")
    }
}
