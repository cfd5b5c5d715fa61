use anyhow::Context;
use common::ArticlePage;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::request::ProxyRequest;

/// Why a single proxy call failed. `Display` is what the user sees.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network failure reaching the proxy. Details go to the log only.
    #[error("Failed to fetch news")]
    Transport(#[from] reqwest::Error),

    /// Proxy route answered with something that is not JSON
    #[error("Function route returned non-JSON body. Check dev server and function.")]
    NonJson,

    /// Non-2xx reply; message taken from the JSON body when present
    #[error("{message}")]
    Status { status: u16, message: String },
}

impl FetchError {
    /// `message`, then `error` (when it is a string), then `HTTP <status>`.
    pub fn from_status_body(status: u16, body: &serde_json::Value) -> Self {
        let message = ["message", "error"]
            .iter()
            .find_map(|key| {
                body.get(*key)
                    .and_then(|v| v.as_str())
                    .filter(|m| !m.is_empty())
            })
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status));
        FetchError::Status { status, message }
    }
}

fn transport(err: reqwest::Error) -> FetchError {
    warn!(error = %err, "request to proxy failed");
    FetchError::Transport(err)
}

/// Anything able to answer a proxy request with an article page.
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch(&self, request: &ProxyRequest) -> Result<ArticlePage, FetchError>;
}

/// [`NewsSource`] talking to the proxy over HTTP
pub struct HttpNewsSource {
    proxy_url: Url,
    client: reqwest::Client,
}

impl HttpNewsSource {
    pub fn new(proxy_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let proxy_url =
            Url::parse(proxy_url).with_context(|| format!("invalid proxy_url: {}", proxy_url))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self { proxy_url, client })
    }

    pub fn url_for(&self, request: &ProxyRequest) -> Url {
        let mut url = self.proxy_url.clone();
        url.set_query(Some(&request.query));
        url
    }
}

#[async_trait::async_trait]
impl NewsSource for HttpNewsSource {
    async fn fetch(&self, request: &ProxyRequest) -> Result<ArticlePage, FetchError> {
        let url = self.url_for(request);
        debug!(%url, endpoint = %request.endpoint, "fetching from proxy");

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;

        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(|_| FetchError::NonJson)?;

        if !status.is_success() {
            return Err(FetchError::from_status_body(status.as_u16(), &json));
        }

        Ok(ArticlePage::from_value(&json))
    }
}
