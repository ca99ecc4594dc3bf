//! Search and scrape tools against mock HTTP servers.

use notecrew::tools::scrape::ScrapeWebsiteTool;
use notecrew::tools::search::SearchTool;
use notecrew::tools::Tool;
use notecrew::types::AppError;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============= web_search =============

fn serper_for(server: &MockServer) -> SearchTool {
    SearchTool::serper(format!("{}/search", server.uri()), "test-key".to_string(), 5, 5).unwrap()
}

#[tokio::test]
async fn test_serper_search_parses_organic_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("X-API-KEY", "test-key"))
        .and(body_json(json!({"q": "solid state batteries", "num": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic": [
                {"title": "Solid-state battery", "link": "https://en.wikipedia.org/wiki/Solid-state_battery", "snippet": "A battery with a solid electrolyte."},
                {"title": "Toyota plans", "link": "https://example.com/toyota", "snippet": "Production in 2027."},
                {"title": "Ignored", "link": "https://example.com/3", "snippet": "beyond the limit"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = serper_for(&server)
        .execute(json!({"query": "solid state batteries", "num_results": 2}))
        .await
        .unwrap();

    assert_eq!(result["count"], 2);
    assert_eq!(result["results"][0]["title"], "Solid-state battery");
    assert_eq!(
        result["results"][0]["url"],
        "https://en.wikipedia.org/wiki/Solid-state_battery"
    );
    assert_eq!(result["results"][1]["snippet"], "Production in 2027.");
}

#[tokio::test]
async fn test_serper_rate_limit_is_search_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too many requests"))
        .mount(&server)
        .await;

    let result = serper_for(&server).execute(json!({"query": "anything"})).await;

    match result {
        Err(AppError::SearchUnavailable(message)) => assert!(message.contains("429")),
        other => panic!("Expected SearchUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_search_requires_query() {
    let server = MockServer::start().await;
    let result = serper_for(&server).execute(json!({})).await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));
}

// ============= scrape_website =============

fn scraper(max_chars: usize) -> ScrapeWebsiteTool {
    ScrapeWebsiteTool::new(5, max_chars, "notecrew-test").unwrap()
}

#[tokio::test]
async fn test_scrape_extracts_visible_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><head><title>Coral Reefs</title><script>track()</script></head>
               <body><h1>Coral reefs</h1><p>Reefs cover less than 1% of the ocean floor.</p>
               <style>.x{}</style></body></html>"#,
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;

    let url = format!("{}/article", server.uri());
    let result = scraper(8000).execute(json!({"url": url})).await.unwrap();

    assert_eq!(result["title"], "Coral Reefs");
    let content = result["content"].as_str().unwrap();
    assert!(content.contains("Reefs cover less than 1% of the ocean floor."));
    assert!(!content.contains("track()"));
    assert_eq!(result["truncated"], false);
}

#[tokio::test]
async fn test_scrape_accepts_website_url_argument() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("just text", "text/plain"))
        .mount(&server)
        .await;

    let url = format!("{}/plain", server.uri());
    let result = scraper(8000)
        .execute(json!({"website_url": url}))
        .await
        .unwrap();

    assert_eq!(result["content"], "just text");
}

#[tokio::test]
async fn test_scrape_not_found_is_fetch_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = scraper(8000)
        .scrape(&format!("{}/missing", server.uri()))
        .await;
    assert!(matches!(result, Err(AppError::FetchFailed(_))));
}

#[tokio::test]
async fn test_scrape_rejects_binary_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/paper.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x25, 0x50, 0x44, 0x46], "application/pdf"))
        .mount(&server)
        .await;

    let result = scraper(8000)
        .scrape(&format!("{}/paper.pdf", server.uri()))
        .await;
    assert!(matches!(result, Err(AppError::FetchFailed(_))));
}

#[tokio::test]
async fn test_scrape_truncates_long_pages() {
    let server = MockServer::start().await;
    let body = "word ".repeat(500);
    Mock::given(method("GET"))
        .and(path("/long"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/plain"))
        .mount(&server)
        .await;

    let page = scraper(100)
        .scrape(&format!("{}/long", server.uri()))
        .await
        .unwrap();

    assert!(page.truncated);
    assert!(page.content.chars().count() <= 100);
}

#[tokio::test]
async fn test_scrape_rejects_non_http_scheme() {
    let result = scraper(8000).scrape("file:///etc/passwd").await;
    assert!(matches!(result, Err(AppError::FetchFailed(_))));
}
