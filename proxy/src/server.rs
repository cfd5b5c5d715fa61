use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rocket::fs::FileServer;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::response::content::RawJson;
use rocket::response::status as response_status;
use rocket::serde::json::Json;
use rocket::{get, routes, Build, Rocket, State};
use serde::Serialize;

use common::{Config, QueryParams, ServerConfig};

use crate::gateway::Gateway;

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub gateway: Arc<Gateway>,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            started_at: Utc::now(),
            gateway: Arc::new(gateway),
        }
    }
}

/// Response structure for `/api/v1/status`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    upstream: String,
    api_key_configured: bool,
}

/// Raw query string decoded into [`QueryParams`]. Unknown keys are ignored.
pub struct NewsQuery(pub QueryParams);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for NewsQuery {
    type Error = std::convert::Infallible;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let params = req
            .uri()
            .query()
            .map(|q| QueryParams::from_query_str(q.as_str()))
            .unwrap_or_default();
        Outcome::Success(NewsQuery(params))
    }
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

/// Status endpoint returning uptime and whether the credential is present.
#[get("/api/v1/status")]
async fn status(state: &State<AppState>) -> Json<StatusResponse> {
    let uptime = (Utc::now() - state.started_at).num_seconds();

    Json(StatusResponse {
        status: "ok",
        uptime_seconds: uptime,
        upstream: state.gateway.upstream_url().to_string(),
        api_key_configured: state.gateway.api_key_configured(),
    })
}

/// The proxy route: forwards to top-headlines or everything.
#[get("/api/news")]
async fn news(query: NewsQuery, state: &State<AppState>) -> response_status::Custom<RawJson<String>> {
    let response = state.gateway.handle(&query.0).await;
    response_status::Custom(Status::new(response.status), RawJson(response.body))
}

/// Build the Rocket instance with routes mounted, without launching it.
pub fn build_rocket(state: AppState, server: &ServerConfig) -> Rocket<Build> {
    let fig = rocket::Config::figment()
        .merge(("address", server.bind.clone()))
        .merge(("port", server.port));

    let mut rocket = rocket::custom(fig)
        .manage(state)
        .mount("/", routes![health, status, news]);

    if let Some(dir) = server.static_dir.as_deref() {
        if Path::new(dir).is_dir() {
            tracing::info!(dir, "serving static front-end");
            rocket = rocket.mount("/", FileServer::from(dir).rank(20));
        } else {
            tracing::warn!(dir, "server.static_dir is not a directory, not serving static files");
        }
    }

    rocket
}

/// Build and launch a Rocket server.
///
/// This function blocks until the Rocket server shuts down (it awaits `rocket.launch().await`)
/// and returns an error if Rocket fails to start.
pub async fn launch_rocket(config: &Config) -> Result<()> {
    let gateway = Gateway::from_config(config)?;
    if !gateway.api_key_configured() {
        // Still start: requests answer with apiKeyMissing until the variable is set.
        tracing::warn!(
            env = %config.upstream.api_key_env,
            "upstream API key not set in environment"
        );
    }

    let rocket = build_rocket(AppState::new(gateway), &config.server);

    tracing::info!(bind = %config.server.bind, port = config.server.port, "Starting Rocket HTTP server");
    rocket
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
