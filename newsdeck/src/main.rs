/*
newsdeck - terminal front-end
Browses headlines by category or searches through the proxy and prints article cards.
*/

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use common::Config;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use newsdeck::progress::ProgressMeter;
use newsdeck::render::render_state;
use newsdeck::{
    DateRange, FetchState, FetchStatus, HttpNewsSource, Orchestrator, OrchestratorConfig,
    SortOrder,
};

#[derive(Parser, Debug)]
#[command(name = "newsdeck", about = "Browse and search news through the Newsdeck proxy")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Proxy news route, overrides client.proxy_url
    #[arg(long)]
    proxy_url: Option<String>,

    /// Headline category (general, business, entertainment, health, science, sports, technology)
    #[arg(long)]
    category: Option<String>,

    /// Two-letter country code for headlines
    #[arg(long)]
    country: Option<String>,

    /// Free-text search; switches to search mode
    #[arg(long, short)]
    query: Option<String>,

    /// publishedAt, relevancy or popularity
    #[arg(long)]
    sort_by: Option<SortOrder>,

    /// today, week, month or all
    #[arg(long)]
    date_range: Option<DateRange>,

    /// Language filter for search results
    #[arg(long)]
    language: Option<String>,

    #[arg(long, default_value_t = 1)]
    page: u32,

    #[arg(long)]
    page_size: Option<u32>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

async fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let default_path = PathBuf::from("config.default.toml");
    let override_path = match path {
        Some(p) => {
            if !p.exists() {
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
    let config = Config::load_with_defaults(Some(&default_path), override_path.as_deref()).await?;
    info!(override = ?override_path, "configuration loaded");
    Ok(config)
}

/// Drive `fetch` to completion while printing the progress meter to stderr.
async fn with_progress(fetch: impl Future<Output = FetchState>, meter: &ProgressMeter, tick: Duration) -> FetchState {
    tokio::pin!(fetch);
    let mut ticker = tokio::time::interval(tick);
    let state = loop {
        tokio::select! {
            state = &mut fetch => break state,
            _ = ticker.tick() => eprint!("\rLoading {:>3}%", meter.value()),
        }
    };
    eprintln!("\rLoading {:>3}%", meter.value());
    state
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let config = load_config(args.config).await?;

    let mut orchestrator_config = OrchestratorConfig::from_defaults(&config.defaults);
    if let Some(category) = args.category {
        orchestrator_config.category = category;
    }
    if let Some(country) = args.country {
        orchestrator_config.country = country;
    }
    if let Some(sort_by) = args.sort_by {
        orchestrator_config.sort_by = sort_by;
    }
    if let Some(date_range) = args.date_range {
        orchestrator_config.date_range = date_range;
    }
    if let Some(language) = args.language {
        orchestrator_config.language = language;
    }
    if let Some(page_size) = args.page_size {
        orchestrator_config.page_size = page_size.max(1);
    }

    let proxy_url = args.proxy_url.unwrap_or(config.client.proxy_url.clone());
    let source = HttpNewsSource::new(&proxy_url, Duration::from_secs(config.client.timeout_seconds))
        .context("failed to create proxy client")?;

    let tick = Duration::from_millis(config.client.progress_tick_ms.max(1));
    let meter = Arc::new(ProgressMeter::new(
        tick,
        Duration::from_millis(config.client.progress_reset_ms),
    ));
    let orchestrator = Orchestrator::with_observer(Arc::new(source), orchestrator_config, meter.clone());

    let mut state = match args.query {
        Some(q) => with_progress(orchestrator.submit_search(q), &meter, tick).await,
        None => with_progress(orchestrator.fetch(), &meter, tick).await,
    };

    if args.page > 1 && state.status == FetchStatus::Success {
        state = with_progress(orchestrator.go_to_page(args.page), &meter, tick).await;
    }

    println!(
        "{}",
        render_state(&orchestrator.heading(), &state, &orchestrator.pagination())
    );

    if state.status == FetchStatus::Error {
        let message = state.error.unwrap_or_default();
        error!(%message, "fetch ended in error state");
        anyhow::bail!("could not fetch news: {}", message);
    }

    Ok(())
}
