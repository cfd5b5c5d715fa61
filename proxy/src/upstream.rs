use anyhow::{Context, Result};
use common::query::non_empty;
use common::{NewsMode, QueryDefaults, QueryParams, UpstreamConfig};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::GatewayError;

/// Header carrying the credential. The key is never placed in the URL.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Normalized request to the upstream API: endpoint plus ordered parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub mode: NewsMode,
    pub params: Vec<(&'static str, String)>,
}

impl UpstreamRequest {
    /// Resolve mode and fill defaults.
    ///
    /// Search: `q` (trimmed), `sortBy`, then `from` and `language` when given.
    /// Browse: `country`, `category`; `language` is dropped.
    /// Both: `page`, `pageSize`.
    pub fn from_query(query: &QueryParams, defaults: &QueryDefaults) -> Self {
        let mode = query.mode();
        let mut params: Vec<(&'static str, String)> = Vec::with_capacity(6);

        match (mode, query.search_text()) {
            (NewsMode::Everything, Some(q)) => {
                params.push(("q", q.to_string()));
                params.push((
                    "sortBy",
                    non_empty(&query.sort_by).unwrap_or(defaults.sort_by.as_str()).to_string(),
                ));
                if let Some(from) = non_empty(&query.from) {
                    params.push(("from", from.to_string()));
                }
                if let Some(language) = non_empty(&query.language) {
                    params.push(("language", language.to_string()));
                }
            }
            _ => {
                params.push((
                    "country",
                    non_empty(&query.country).unwrap_or(defaults.country.as_str()).to_string(),
                ));
                params.push((
                    "category",
                    non_empty(&query.category).unwrap_or(defaults.category.as_str()).to_string(),
                ));
            }
        }

        params.push(("page", non_empty(&query.page).unwrap_or("1").to_string()));
        params.push((
            "pageSize",
            non_empty(&query.page_size)
                .map(str::to_string)
                .unwrap_or_else(|| defaults.page_size.to_string()),
        ));

        UpstreamRequest { mode, params }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// JSON reply from upstream, body kept as received.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

/// HTTP client for the upstream news API (NewsAPI v2 layout)
pub struct NewsApiClient {
    base_url: Url,
    client: reqwest::Client,
}

impl NewsApiClient {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid upstream base_url: {}", base_url))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self { base_url, client })
    }

    pub fn from_config(cfg: &UpstreamConfig) -> Result<Self> {
        Self::new(
            &cfg.base_url,
            Duration::from_secs(cfg.timeout_seconds),
            &cfg.user_agent,
        )
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// `{base}/{top-headlines|everything}` without query.
    pub fn endpoint_url(&self, mode: NewsMode) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), mode.path())
    }

    /// Issue exactly one GET. Non-JSON replies are rejected; JSON replies are
    /// returned whatever their status.
    pub async fn send(
        &self,
        request: &UpstreamRequest,
        api_key: &str,
    ) -> Result<UpstreamReply, GatewayError> {
        let url = self.endpoint_url(request.mode);
        debug!(%url, params = ?request.params, "upstream request");

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .query(&request.params)
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !is_json_content_type(&content_type) {
            return Err(GatewayError::NonJson { content_type });
        }

        let body = response.text().await?;
        if serde_json::from_str::<serde_json::Value>(&body).is_err() {
            return Err(GatewayError::NonJson { content_type });
        }

        Ok(UpstreamReply { status, body })
    }
}

/// `application/json` or any `+json` media type, parameters ignored.
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}
