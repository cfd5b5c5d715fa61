use std::sync::Arc;
use std::time::Duration;

use mockito::Matcher;
use newsdeck::{
    EndpointLabel, FetchError, FetchStatus, HttpNewsSource, NewsSource, Orchestrator,
    OrchestratorConfig, ProxyRequest,
};

fn source_for(server: &mockito::Server) -> HttpNewsSource {
    let url = format!("{}/api/news", server.url());
    HttpNewsSource::new(&url, Duration::from_secs(5)).expect("client")
}

#[tokio::test]
async fn test_fetch_decodes_article_page() {
    let mut server = mockito::Server::new_async().await;
    let body = serde_json::json!({
        "status": "ok",
        "totalResults": 2,
        "articles": [
            {"source": {"id": null, "name": "Wire"}, "title": "First", "url": "https://example.com/1"},
            {"title": "Second", "url": "https://example.com/2", "author": "Ana"}
        ]
    });
    let mock = server
        .mock("GET", "/api/news")
        .match_query(Matcher::Exact(
            "page=1&pageSize=18&country=in&category=general".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let request = ProxyRequest {
        endpoint: EndpointLabel::TopHeadlines,
        query: "page=1&pageSize=18&country=in&category=general".into(),
    };
    let page = source_for(&server).fetch(&request).await.expect("page");

    mock.assert_async().await;
    assert_eq!(page.total_results, 2);
    assert_eq!(page.articles.len(), 2);
    assert_eq!(page.articles[0].source_name(), Some("Wire"));
    assert_eq!(page.articles[1].author_or_unknown(), "Ana");
}

#[tokio::test]
async fn test_error_status_uses_body_message() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/news")
        .match_query(Matcher::Any)
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"error","code":"rateLimited","message":"rate limited"}"#)
        .create_async()
        .await;

    let request = ProxyRequest {
        endpoint: EndpointLabel::Everything,
        query: "q=x&sortBy=publishedAt&page=1&pageSize=18".into(),
    };
    let err = source_for(&server).fetch(&request).await.unwrap_err();

    match &err {
        FetchError::Status { status, message } => {
            assert_eq!(*status, 429);
            assert_eq!(message, "rate limited");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.to_string(), "rate limited");
}

#[tokio::test]
async fn test_error_status_without_message_reports_http_code() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/news")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("{}")
        .create_async()
        .await;

    let request = ProxyRequest {
        endpoint: EndpointLabel::TopHeadlines,
        query: "page=1".into(),
    };
    let err = source_for(&server).fetch(&request).await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 503");
}

#[tokio::test]
async fn test_non_json_body_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/news")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html>dev server</html>")
        .create_async()
        .await;

    let request = ProxyRequest {
        endpoint: EndpointLabel::TopHeadlines,
        query: "page=1".into(),
    };
    let err = source_for(&server).fetch(&request).await.unwrap_err();
    assert!(matches!(err, FetchError::NonJson));
    assert_eq!(
        err.to_string(),
        "Function route returned non-JSON body. Check dev server and function."
    );
}

#[tokio::test]
async fn test_unreachable_proxy_is_transport_error() {
    let source = HttpNewsSource::new("http://127.0.0.1:1/api/news", Duration::from_secs(2))
        .expect("client");
    let request = ProxyRequest {
        endpoint: EndpointLabel::TopHeadlines,
        query: "page=1".into(),
    };
    let err = source.fetch(&request).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
    assert_eq!(err.to_string(), "Failed to fetch news");
}

#[tokio::test]
async fn test_transport_error_state_hides_connection_details() {
    let source = HttpNewsSource::new("http://127.0.0.1:1/api/news", Duration::from_secs(2))
        .expect("client");
    let orchestrator = Orchestrator::new(Arc::new(source), OrchestratorConfig::default());

    let state = orchestrator.fetch().await;

    assert_eq!(state.status, FetchStatus::Error);
    let message = state.error.expect("error message");
    assert_eq!(message, "Failed to fetch news");
    assert!(!message.contains("127.0.0.1"));
    assert!(!message.contains("os error"));
}

#[tokio::test]
async fn test_orchestrator_falls_back_over_http() {
    let mut server = mockito::Server::new_async().await;
    let browse = server
        .mock("GET", "/api/news")
        .match_query(Matcher::UrlEncoded("category".into(), "general".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"ok","totalResults":0,"articles":[]}"#)
        .expect(1)
        .create_async()
        .await;
    let fallback = server
        .mock("GET", "/api/news")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "general".into()),
            Matcher::UrlEncoded("sortBy".into(), "publishedAt".into()),
            Matcher::UrlEncoded("language".into(), "en".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"status":"ok","totalResults":1,"articles":[{"title":"Found","url":"https://example.com/f"}]}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let orchestrator = Orchestrator::new(Arc::new(source_for(&server)), OrchestratorConfig::default());
    let state = orchestrator.fetch().await;

    browse.assert_async().await;
    fallback.assert_async().await;
    assert_eq!(state.status, FetchStatus::Success);
    assert_eq!(state.endpoint, Some(EndpointLabel::EverythingFallback));
    assert_eq!(state.articles[0].title(), "Found");
}
