//! Headless fetcher backed by a Browserless-compatible `/content` endpoint.
//!
//! The service loads the page in a real browser, waits for network idle,
//! and returns the rendered HTML, so script-built markup is visible to the
//! extractor.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use intelscout_shared::{FetchConfig, FetchedPage, IntelScoutError, Result};

use crate::Fetcher;
use crate::page::parse_page;

/// Resource types the renderer should not download.
const REJECTED_RESOURCES: &[&str] = &["image", "media", "font"];

/// Fetcher that asks a rendering service for the final DOM of a page.
pub struct RenderedFetcher {
    client: Client,
    endpoint: String,
    token: Option<String>,
    timeout: Duration,
    settle: Duration,
}

impl RenderedFetcher {
    /// Create a rendered fetcher; a missing service URL is a fatal setup error.
    pub fn new(config: &FetchConfig, token: Option<String>, timeout: Duration) -> Result<Self> {
        let base = config.browserless_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(IntelScoutError::setup(
                "headless mode requires fetch.browserless_url to be set",
            ));
        }
        Url::parse(base)
            .map_err(|e| IntelScoutError::setup(format!("invalid browserless_url '{base}': {e}")))?;

        // Leave headroom for the service to report its own navigation timeout.
        let client = Client::builder()
            .timeout(timeout + Duration::from_secs(5))
            .build()
            .map_err(|e| IntelScoutError::setup(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{base}/content"),
            token,
            timeout,
            settle: Duration::from_millis(config.settle_ms),
        })
    }

    fn request_body(&self, url: &Url) -> serde_json::Value {
        let mut body = serde_json::json!({
            "url": url.as_str(),
            "gotoOptions": {
                "waitUntil": "networkidle2",
                "timeout": self.timeout.as_millis() as u64,
            },
            "rejectResourceTypes": REJECTED_RESOURCES,
        });
        // Fixed settle delay only as a fallback to the idle check
        if !self.settle.is_zero() {
            body["waitForTimeout"] = serde_json::json!(self.settle.as_millis() as u64);
        }
        body
    }
}

#[async_trait]
impl Fetcher for RenderedFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        debug!(%url, endpoint = %self.endpoint, "rendering page");

        let mut request = self.client.post(&self.endpoint).json(&self.request_body(url));
        if let Some(token) = &self.token {
            request = request.query(&[("token", token.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IntelScoutError::Network(format!("{url}: renderer request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IntelScoutError::Network(format!(
                "{url}: renderer returned HTTP {status}: {}",
                message.chars().take(200).collect::<String>()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| IntelScoutError::Network(format!("{url}: body read failed: {e}")))?;

        Ok(parse_page(url, None, body))
    }

    fn name(&self) -> &str {
        "rendered"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base: &str) -> FetchConfig {
        FetchConfig {
            headless: true,
            browserless_url: base.to_string(),
            ..FetchConfig::default()
        }
    }

    #[test]
    fn missing_service_url_is_setup_error() {
        let err = RenderedFetcher::new(&config(""), None, Duration::from_secs(5))
            .err()
            .expect("should fail");
        assert!(matches!(err, IntelScoutError::Setup { .. }));
    }

    #[test]
    fn settle_delay_only_sent_when_configured() {
        let mut cfg = config("http://render.test");
        let fetcher = RenderedFetcher::new(&cfg, None, Duration::from_secs(5)).unwrap();
        let url = Url::parse("https://acme.test/").unwrap();
        let body = fetcher.request_body(&url);
        assert_eq!(body["gotoOptions"]["waitUntil"], "networkidle2");
        assert!(body.get("waitForTimeout").is_none());

        cfg.settle_ms = 2000;
        let fetcher = RenderedFetcher::new(&cfg, None, Duration::from_secs(5)).unwrap();
        assert_eq!(fetcher.request_body(&url)["waitForTimeout"], 2000);
    }

    #[tokio::test]
    async fn renders_through_content_endpoint() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/content"))
            .and(wiremock::matchers::query_param("token", "secret"))
            .and(wiremock::matchers::body_partial_json(
                serde_json::json!({ "url": "https://acme.test/" }),
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(
                r#"<html><body><div id="app">Rendered by JS</div><a href="/pricing">Pricing</a></body></html>"#,
            ))
            .mount(&server)
            .await;

        let fetcher = RenderedFetcher::new(
            &config(&server.uri()),
            Some("secret".into()),
            Duration::from_secs(5),
        )
        .unwrap();

        let url = Url::parse("https://acme.test/").unwrap();
        let page = fetcher.fetch(&url).await.unwrap();

        assert!(page.text.contains("Rendered by JS"));
        assert_eq!(page.links, vec!["https://acme.test/pricing".to_string()]);
        assert_eq!(page.status_code, None);
    }

    #[tokio::test]
    async fn renderer_failure_is_network_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/content"))
            .respond_with(wiremock::ResponseTemplate::new(500).set_body_string("navigation timeout"))
            .mount(&server)
            .await;

        let fetcher =
            RenderedFetcher::new(&config(&server.uri()), None, Duration::from_secs(5)).unwrap();
        let url = Url::parse("https://acme.test/").unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert!(err.to_string().contains("navigation timeout"));
    }
}
