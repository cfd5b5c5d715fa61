/*
newsdeck-proxy - main.rs
This binary starts the Rocket HTTP server that forwards client queries to the upstream news API.
*/

use anyhow::Result;
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use newsdeck_proxy::server::launch_rocket;

#[derive(Parser, Debug)]
#[command(name = "newsdeck-proxy", about = "Newsdeck news API proxy")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Local development: pick up the API key from .env if present
    if dotenv::dotenv().is_ok() {
        info!("loaded environment from .env");
    }

    let default_path = PathBuf::from("config.default.toml");
    let override_path = match args.config {
        Some(p) => {
            if !p.exists() {
                error!(path = ?p, "specified config file not found");
                return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
            }
            Some(p)
        }
        None => std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .ok()
            .or_else(|| Some(PathBuf::from("config.toml")))
            .filter(|p| p.exists()),
    };

    let config = match Config::load_with_defaults(Some(&default_path), override_path.as_deref()).await {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    if let Err(e) = launch_rocket(&config).await {
        error!(%e, "Rocket server failed");
        return Err(e);
    }

    info!("Shutdown complete");
    Ok(())
}
