/*!
common/src/lib.rs

Shared configuration types and wire models for Newsdeck.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader for a TOML config file, with default + override merging
- The query parameter and article models shared by the proxy and the client
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod article;
pub mod query;

pub use article::{Article, ArticlePage, ArticleSource};
pub use query::{NewsMode, QueryParams};

/// HTTP server section used by the proxy binary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Directory with a built front-end to serve at `/` (optional)
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8000,
            static_dir: None,
        }
    }
}

/// Upstream news API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL without trailing endpoint, e.g. "https://newsapi.org/v2"
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    /// The variable is read on every request, never cached.
    pub api_key_env: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org/v2".to_string(),
            api_key_env: "NEWS_API_KEY".to_string(),
            timeout_seconds: 10,
            user_agent: format!("Newsdeck/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Default query values applied when a request leaves a parameter unset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryDefaults {
    pub country: String,
    pub category: String,
    pub page_size: u32,
    pub sort_by: String,
    pub language: String,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            country: "in".to_string(),
            category: "general".to_string(),
            page_size: 18,
            sort_by: "publishedAt".to_string(),
            language: "en".to_string(),
        }
    }
}

/// Client (orchestrator / terminal front-end) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Full URL of the proxy news route
    pub proxy_url: String,
    pub timeout_seconds: u64,
    pub progress_tick_ms: u64,
    pub progress_reset_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proxy_url: "http://127.0.0.1:8000/api/news".to_string(),
            timeout_seconds: 30,
            progress_tick_ms: 120,
            progress_reset_ms: 400,
        }
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub defaults: QueryDefaults,
    pub client: ClientConfig,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    /// Missing files are skipped; with neither present the built-in defaults apply.
    pub async fn load_with_defaults(
        default_path: Option<&Path>,
        override_path: Option<&Path>,
    ) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value
            .try_into()
            .context("Failed to parse merged configuration")?;
        Ok(cfg)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
