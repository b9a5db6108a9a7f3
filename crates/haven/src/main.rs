use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use haven::{AppConfig, AppState, api};

#[derive(Parser, Debug)]
#[command(name = "haven")]
#[command(about = "Multi-tenant web OS backend")]
#[command(version)]
struct Cli {
    /// Address to bind to
    #[arg(short, long, env = "HAVEN_BIND")]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "HAVEN_PORT")]
    port: Option<u16>,

    /// Base directory for server state
    #[arg(long, env = "HAVEN_DATA_DIR", value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Directory containing tenant home directories
    #[arg(long, env = "HAVEN_HOMES_DIR", value_name = "PATH")]
    homes_dir: Option<PathBuf>,

    /// Config file path (optional)
    #[arg(short, long, env = "HAVEN_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, env = "HAVEN_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "haven=debug,tower_http=debug"
    } else {
        "haven=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = AppConfig::load(cli.config.as_deref())?;

    // CLI flags win over config file and environment sections.
    if let Some(bind) = cli.bind {
        config.server.host = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(data_dir) = cli.data_dir {
        config.paths.data_dir = data_dir;
    }
    if let Some(homes_dir) = cli.homes_dir {
        config.paths.homes_dir = homes_dir;
    }

    config.validate()?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("parsing listen address")?;

    let state = AppState::new(config)?;
    state.init().await?;

    info!(
        homes = %state.config.paths.homes_dir.display(),
        data = %state.config.paths.data_dir.display(),
        "serving tenant homes"
    );

    let app = api::create_router(state);

    info!("starting haven on {addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("binding listener")?;
    axum::serve(listener, app).await.context("serving")?;

    Ok(())
}
