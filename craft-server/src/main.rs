use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use craft_core::{CraftConfig, Crafter};
use craft_server::{AppState, create_router};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Config file picked up from the working directory when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "craft.toml";

/// Combine and split symbols with a chat model over HTTP.
#[derive(Debug, Parser)]
#[command(name = "craft-server", version, about)]
struct Args {
    /// Path to a TOML config file (defaults to ./craft.toml when present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding `[server] bind`.
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

fn load_config(args: &Args) -> anyhow::Result<CraftConfig> {
    let path = match &args.config {
        Some(path) => Some(path.as_path()),
        None => Some(Path::new(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
    };
    let mut config = match path {
        Some(path) => CraftConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => CraftConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        provider = ?config.llm.provider,
        model = %config.llm.model,
        single_flight = config.cache.single_flight,
        "starting infini-craft"
    );

    let crafter = Crafter::from_config(&config).context("failed to build crafting pipeline")?;
    let router = create_router(AppState::new(crafter));

    let listener = tokio::net::TcpListener::bind(config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    info!("Server listening on http://{}", config.server.bind);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
