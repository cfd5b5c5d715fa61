use std::time::Duration;

use common::{QueryDefaults, ServerConfig};
use mockito::Matcher;
use newsdeck_proxy::gateway::{ApiKeySource, Gateway};
use newsdeck_proxy::server::{build_rocket, AppState};
use newsdeck_proxy::upstream::NewsApiClient;
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;

async fn client_for(base_url: &str, key: ApiKeySource) -> Client {
    let upstream = NewsApiClient::new(base_url, Duration::from_secs(2), "Newsdeck/test")
        .expect("build upstream client");
    let gateway = Gateway::new(upstream, key, QueryDefaults::default());
    let rocket = build_rocket(AppState::new(gateway), &ServerConfig::default());
    Client::tracked(rocket).await.expect("valid rocket instance")
}

#[tokio::test]
async fn test_news_route_relays_upstream_status_and_body() {
    let mut server = mockito::Server::new_async().await;

    let body = r#"{"status":"error","code":"rateLimited","message":"rate limited"}"#;
    let mock = server
        .mock("GET", "/everything")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "climate change".into()),
            Matcher::UrlEncoded("sortBy".into(), "relevancy".into()),
        ]))
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await;

    let client = client_for(&server.url(), ApiKeySource::Fixed("k".into())).await;
    let response = client
        .get("/api/news?q=climate%20change&sortBy=relevancy&cacheBust=123")
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::TooManyRequests);
    assert_eq!(response.content_type(), Some(ContentType::JSON));
    assert_eq!(response.into_string().await.as_deref(), Some(body));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_news_route_without_key_is_500() {
    let client = client_for(
        "http://127.0.0.1:1",
        ApiKeySource::Env("NEWSDECK_ROUTE_TEST_UNSET_KEY".into()),
    )
    .await;

    let response = client.get("/api/news").dispatch().await;
    assert_eq!(response.status(), Status::InternalServerError);

    let text = response.into_string().await.expect("body");
    let json: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(json["code"], "apiKeyMissing");
}

#[tokio::test]
async fn test_health_and_status() {
    let client = client_for("http://127.0.0.1:1", ApiKeySource::Fixed("k".into())).await;

    let health = client.get("/health").dispatch().await;
    assert_eq!(health.status(), Status::Ok);
    assert_eq!(health.into_string().await.as_deref(), Some("OK"));

    let status = client.get("/api/v1/status").dispatch().await;
    assert_eq!(status.status(), Status::Ok);
    let json: serde_json::Value =
        serde_json::from_str(&status.into_string().await.expect("body")).expect("json");
    assert_eq!(json["status"], "ok");
    assert_eq!(json["api_key_configured"], true);
}
