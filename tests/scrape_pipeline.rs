//! End-to-end scrape runs: mock site, HTTP provider, JSON output.

use flashscrape::providers::{Backoff, HttpProvider, ProviderOptions};
use flashscrape::sink::read_cards;
use flashscrape::{Card, ExtractConfig, ExtractError, FetchError, JsonFileSink, ScrapeError, Scraper};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options() -> ProviderOptions {
    ProviderOptions {
        start_at_homepage: false,
        backoff: Backoff::None,
        timeout_secs: 5,
        ..Default::default()
    }
}

async fn serve(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_scrape_to_json_file() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/123/french",
        200,
        r#"<html><body><section data-testid="terms-list">
            <span class="TermText notranslate lang-fr">Bonjour</span>
            <span class="TermText notranslate lang-en">Hello</span>
            <span class="TermText notranslate lang-fr"></span>
            <span class="TermText notranslate lang-en">Goodbye</span>
            <span class="TermText notranslate lang-fr">Merci</span>
            <span class="TermText notranslate lang-en">Thanks</span>
        </section></body></html>"#,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("french.json");
    let sink = JsonFileSink::new(&out);
    let mut provider = HttpProvider::new(options());

    let scraper = Scraper::new(&ExtractConfig::default()).unwrap();
    let cards = scraper
        .scrape(&mut provider, &format!("{}/123/french", server.uri()), &sink)
        .await
        .unwrap();

    let expected = vec![
        Card::new("Bonjour", "Hello").unwrap(),
        Card::new("Merci", "Thanks").unwrap(),
    ];
    assert_eq!(cards.cards(), expected.as_slice());
    assert_eq!(read_cards(&out).unwrap(), cards);
}

#[tokio::test]
async fn test_non_ascii_written_unescaped() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/set",
        200,
        r#"<section data-testid="terms-list">
            <span class="TermText">été</span><span class="TermText">summer</span>
            <span class="TermText">日本</span><span class="TermText">Japan</span>
        </section>"#,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("cards.json");
    let sink = JsonFileSink::new(&out);
    let mut provider = HttpProvider::new(options());

    let scraper = Scraper::new(&ExtractConfig::default()).unwrap();
    scraper
        .scrape(&mut provider, &format!("{}/set", server.uri()), &sink)
        .await
        .unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.contains("\"term\": \"été\""));
    assert!(written.contains("日本"));
    assert!(written.starts_with("{\n  \"cards\": ["));
}

#[tokio::test]
async fn test_missing_container_leaves_no_file() {
    let server = MockServer::start().await;
    serve(&server, "/set", 200, "<html><body><h1>Log in</h1></body></html>").await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("cards.json");
    let sink = JsonFileSink::new(&out);
    let mut provider = HttpProvider::new(options());

    let scraper = Scraper::new(&ExtractConfig::default()).unwrap();
    let err = scraper
        .scrape(&mut provider, &format!("{}/set", server.uri()), &sink)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ScrapeError::Extract(ExtractError::ContainerNotFound { .. })
    ));
    assert!(!out.exists());
}

#[tokio::test]
async fn test_fetch_failure_leaves_previous_file() {
    let server = MockServer::start().await;
    serve(&server, "/set", 404, "").await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("cards.json");
    std::fs::write(&out, "{\"cards\": []}\n").unwrap();
    let sink = JsonFileSink::new(&out);
    let mut provider = HttpProvider::new(options());

    let scraper = Scraper::new(&ExtractConfig::default()).unwrap();
    let err = scraper
        .scrape(&mut provider, &format!("{}/set", server.uri()), &sink)
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Fetch(FetchError::NotFound { .. })));
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "{\"cards\": []}\n");
}

#[tokio::test]
async fn test_legacy_markup_fallback() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/old",
        200,
        r#"<div class="SetPageTerms-term">
              <div class="TermText-word">chat</div>
              <div class="TermText-definition">cat</div>
           </div>
           <div class="SetPageTerms-term">
              <div class="TermText-word">chien</div>
              <div class="TermText-definition">dog</div>
           </div>"#,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let sink = JsonFileSink::new(dir.path().join("cards.json"));
    let mut provider = HttpProvider::new(options());

    let scraper = Scraper::new(&ExtractConfig::default()).unwrap();
    let cards = scraper
        .scrape(&mut provider, &format!("{}/old", server.uri()), &sink)
        .await
        .unwrap();

    assert_eq!(cards.len(), 2);
    assert_eq!(cards.cards()[1], Card::new("chien", "dog").unwrap());
}
