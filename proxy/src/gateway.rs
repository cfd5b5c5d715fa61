use anyhow::Result;
use common::{Config, QueryDefaults, QueryParams};
use tracing::{error, info, warn};

use crate::error::GatewayError;
use crate::upstream::{NewsApiClient, UpstreamReply, UpstreamRequest};

/// Where the upstream credential comes from.
#[derive(Debug, Clone)]
pub enum ApiKeySource {
    /// Read this environment variable on every request
    Env(String),
    /// Fixed key, for embedding and tests
    Fixed(String),
}

impl ApiKeySource {
    /// Current key, `None` when unset or empty.
    pub fn resolve(&self) -> Option<String> {
        let key = match self {
            ApiKeySource::Env(name) => std::env::var(name).ok()?,
            ApiKeySource::Fixed(key) => key.clone(),
        };
        let key = key.trim().to_string();
        (!key.is_empty()).then_some(key)
    }

    fn describe(&self) -> String {
        match self {
            ApiKeySource::Env(name) => name.clone(),
            ApiKeySource::Fixed(_) => "configured API key".to_string(),
        }
    }
}

/// What the HTTP layer sends back: a status and a JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: String,
}

impl From<UpstreamReply> for GatewayResponse {
    fn from(reply: UpstreamReply) -> Self {
        GatewayResponse {
            status: reply.status,
            body: reply.body,
        }
    }
}

impl From<&GatewayError> for GatewayResponse {
    fn from(err: &GatewayError) -> Self {
        GatewayResponse {
            status: err.status_code(),
            body: err.body().to_string(),
        }
    }
}

/// Stateless forwarder: normalize the query, attach the credential, make one
/// upstream call, relay the outcome.
pub struct Gateway {
    client: NewsApiClient,
    key_source: ApiKeySource,
    defaults: QueryDefaults,
}

impl Gateway {
    pub fn new(client: NewsApiClient, key_source: ApiKeySource, defaults: QueryDefaults) -> Self {
        Self {
            client,
            key_source,
            defaults,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let client = NewsApiClient::from_config(&cfg.upstream)?;
        Ok(Self::new(
            client,
            ApiKeySource::Env(cfg.upstream.api_key_env.clone()),
            cfg.defaults.clone(),
        ))
    }

    pub fn upstream_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn api_key_configured(&self) -> bool {
        self.key_source.resolve().is_some()
    }

    /// Forward and return the upstream JSON reply, or the gateway's own failure.
    /// The credential is checked before anything is sent.
    pub async fn forward(&self, query: &QueryParams) -> Result<UpstreamReply, GatewayError> {
        let api_key = self.key_source.resolve().ok_or_else(|| GatewayError::ApiKeyMissing {
            env: self.key_source.describe(),
        })?;

        let request = UpstreamRequest::from_query(query, &self.defaults);
        let reply = self.client.send(&request, &api_key).await?;

        if reply.status != 200 {
            warn!(
                status = reply.status,
                endpoint = %request.mode,
                body = %reply.body,
                "upstream returned an error, relaying"
            );
        } else {
            info!(
                endpoint = %request.mode,
                page = request.get("page").unwrap_or_default(),
                "upstream request succeeded"
            );
        }

        Ok(reply)
    }

    /// Same as [`Gateway::forward`] but folds failures into their wire form.
    pub async fn handle(&self, query: &QueryParams) -> GatewayResponse {
        match self.forward(query).await {
            Ok(reply) => reply.into(),
            Err(e) => {
                match &e {
                    GatewayError::Transport(source) => {
                        error!(code = e.code(), error = %source, "error fetching from upstream")
                    }
                    _ => error!(code = e.code(), "{}", e),
                }
                GatewayResponse::from(&e)
            }
        }
    }
}
