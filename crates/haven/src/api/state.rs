//! Application state shared across handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

use crate::accounts::LinuxAccounts;
use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::terminal::CommandSandbox;
use crate::user::{UserService, UserStore};

/// Application state shared across all handlers.
///
/// Built once at startup from an immutable configuration value; nothing
/// here is ambient global state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub users: Arc<UserService>,
    pub accounts: Arc<LinuxAccounts>,
    pub sandbox: Arc<CommandSandbox>,
    store: UserStore,
}

impl AppState {
    /// Create application state from validated configuration.
    pub fn new(config: AppConfig) -> Result<Self> {
        let secret = match config.auth.resolve_secret().context("resolving session secret")? {
            Some(secret) => secret,
            None => {
                // validate() requires a secret outside dev mode, so this is
                // the dev-mode-only path. Tokens will not survive restarts.
                warn!("no session secret configured; generated an ephemeral dev secret");
                crate::config::AuthConfig::generate_secret()
            }
        };

        let tokens = TokenService::new(secret, config.auth.session_expiry_secs);
        let accounts = Arc::new(LinuxAccounts::new(
            config.accounts.clone(),
            config.paths.homes_dir.clone(),
        ));
        let store = UserStore::new(&config.paths.data_dir);
        let users = Arc::new(UserService::new(store.clone(), accounts.clone()));
        let sandbox = Arc::new(CommandSandbox::new(&config.terminal));

        Ok(Self {
            config: Arc::new(config),
            tokens,
            users,
            accounts,
            sandbox,
            store,
        })
    }

    /// Create on-disk directories the services expect.
    pub async fn init(&self) -> Result<()> {
        self.store.init().await?;
        tokio::fs::create_dir_all(&self.config.paths.homes_dir)
            .await
            .with_context(|| {
                format!(
                    "creating homes directory {}",
                    self.config.paths.homes_dir.display()
                )
            })?;
        Ok(())
    }
}
