mod config;
mod protocol;
mod server;
mod store;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use config::{Config, LogConfig};
use server::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// HTTP front end for a key-value and queue store
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening address, overrides the config file and KVGATE_LISTEN
    #[arg(short, long)]
    listen: Option<String>,
}

fn init_logging(log: &LogConfig) -> anyhow::Result<()> {
    // RUST_LOG takes precedence over the configured level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    match &log.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file '{}'", path))?;
            builder.with_ansi(false).with_writer(Arc::new(file)).init();
        }
        None => builder.init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_overrides(|name| std::env::var(name).ok())?;
    if let Some(listen) = cli.listen {
        config.server_addr = listen;
    }

    init_logging(&config.log)?;

    info!("Starting kvgate - HTTP key-value and queue API");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let store = store::connect(&config.store)
        .await
        .context("Failed to set up the store")?;

    let server = Server::bind(&config.server_addr, store, &config.static_dir)
        .await
        .with_context(|| format!("Failed to bind {}", config.server_addr))?;
    info!("Server listening on: {}", server.local_addr());

    server.run().await?;

    Ok(())
}
