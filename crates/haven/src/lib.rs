//! Haven backend library.
//!
//! Multi-tenant web OS backend: every registered user gets a real home
//! directory on the host, a sandboxed terminal, and a file browser, all
//! behind bearer-token authenticated HTTP endpoints.
//!
//! The crate is organized around the security boundary:
//! - [`auth`]: session token issuance/verification and the request gate
//! - [`terminal`]: command policy and sandboxed execution
//! - [`files`]: path confinement and directory operations
//!
//! Everything else (user store, OS account provisioning, portal page,
//! HTTP plumbing) supports that boundary.

pub mod accounts;
pub mod api;
pub mod auth;
pub mod config;
pub mod files;
pub mod portal;
pub mod terminal;
pub mod user;

pub use api::state::AppState;
pub use config::AppConfig;
