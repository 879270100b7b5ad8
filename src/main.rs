use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use md_tools::config::Config;
use md_tools::server::{self, AppState};

/// Get the config directory path (~/.config/md-tools/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("md-tools"))
}

#[derive(Parser, Debug)]
#[command(
    name = "md-tools",
    version,
    about = "Feed reader page, RSS feed and sitemap over markdown files"
)]
struct Args {
    /// Config file (default: ~/.config/md-tools/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Port to listen on, overriding config and WSGI_PORT
    #[arg(long)]
    port: Option<u16>,

    /// Embed feed summaries directly instead of in sandboxed frames
    #[arg(long = "unsafe")]
    unsafe_html: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => get_config_dir()?.join("config.toml"),
    };

    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    config
        .apply_env()
        .context("Invalid configuration in environment")?;

    if let Some(port) = args.port {
        config.port = port;
    }
    if args.unsafe_html {
        config.unsafe_html = true;
    }

    if config.feeds.is_empty() {
        tracing::warn!("No feeds configured, the feed page will be empty");
    }

    let state = AppState::from_config(&config).context("Failed to initialize server")?;
    server::serve(Arc::new(state), config.port).await
}
