//! Terminal command sandbox.
//!
//! Classifies a raw command line against allow/block policy and runs it in
//! the tenant's home directory under a reduced environment and a hard
//! timeout. Only the leading token is policy-checked; the remainder is
//! handed to the shell verbatim.

mod exec;
mod policy;

pub use exec::{CommandSandbox, ExecOutcome, TerminalError};
pub use policy::{Builtin, CommandPolicy, Decision};
