use serde_json::{json, Value};
use thiserror::Error;

/// Failures the gateway turns into its own error responses.
///
/// Upstream 4xx/5xx replies are not errors here: they are relayed verbatim.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The credential variable is unset or empty. Never retried.
    #[error("API key is not configured (env var {env})")]
    ApiKeyMissing { env: String },

    /// Upstream answered with something other than JSON.
    #[error("upstream returned non-JSON (content-type: {content_type})")]
    NonJson { content_type: String },

    /// Connect, timeout or body read failure.
    #[error("failed to contact upstream: {0}")]
    Transport(#[from] reqwest::Error),
}

impl GatewayError {
    /// Machine-readable condition name, used in logs and for `apiKeyMissing` on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::ApiKeyMissing { .. } => "apiKeyMissing",
            GatewayError::NonJson { .. } => "badUpstreamResponse",
            GatewayError::Transport(_) => "internalProxyError",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::ApiKeyMissing { .. } => 500,
            GatewayError::NonJson { .. } => 502,
            GatewayError::Transport(_) => 500,
        }
    }

    /// JSON body sent to the caller. Transport details are never included.
    pub fn body(&self) -> Value {
        match self {
            GatewayError::ApiKeyMissing { env } => json!({
                "status": "error",
                "code": self.code(),
                "message": format!("The {} is not configured in the proxy environment.", env),
            }),
            GatewayError::NonJson { .. } => json!({
                "status": "error",
                "message": "Upstream returned non-JSON.",
            }),
            GatewayError::Transport(_) => json!({
                "status": "error",
                "message": "An internal error occurred while trying to contact the News API.",
            }),
        }
    }
}
