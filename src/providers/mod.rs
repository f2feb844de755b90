//! Page providers: where set pages come from.
//!
//! A provider turns a URL into HTML. [`HttpProvider`] fetches directly;
//! [`BrowserProvider`] renders through Chrome (with the `browser` feature).

pub mod browser;
mod config;
mod http_client;
mod retry;

pub use browser::{BrowserEngineConfig, BrowserProvider};
pub use config::{Backoff, ProviderOptions};
pub use http_client::{browser_headers, random_user_agent, resolve_user_agent, HttpProvider};

use async_trait::async_trait;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Captcha detected at {url}")]
    CaptchaDetected { url: String },
    #[error("Request to {url} failed after {attempts} attempt(s): {reason}")]
    Transport {
        url: String,
        attempts: u32,
        status: Option<u16>,
        reason: String,
    },
    #[error("Page not found: {url}")]
    NotFound { url: String },
    #[error("HTTP client error: {0}")]
    Client(String),
    #[error("Browser error: {0}")]
    Browser(String),
}

impl FetchError {
    /// Whether a later attempt with a different provider or after a pause
    /// might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transport { .. })
    }
}

/// A fetched set page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub html: String,
}

/// Supplies HTML for a URL.
#[async_trait]
pub trait PageProvider: Send {
    /// Provider name for logs.
    fn name(&self) -> &str;

    async fn fetch(&mut self, url: &str) -> Result<FetchedPage, FetchError>;

    /// Release the session or browser. Safe to call more than once.
    async fn close(&mut self);
}

/// Check whether a page is a captcha challenge.
pub fn detect_captcha(html: &str, selectors: &[String]) -> bool {
    let document = Html::parse_document(html);
    selectors.iter().any(|s| match Selector::parse(s) {
        Ok(selector) => document.select(&selector).next().is_some(),
        Err(e) => {
            warn!("Ignoring invalid captcha selector '{}': {}", s, e);
            false
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_captcha() {
        let selectors = vec!["#px-captcha-wrapper".to_string()];
        assert!(detect_captcha(
            r#"<html><body><div id="px-captcha-wrapper"><div id="px-captcha"></div></div></body></html>"#,
            &selectors
        ));
        assert!(!detect_captcha(
            r#"<html><body><section data-testid="terms-list"></section></body></html>"#,
            &selectors
        ));
    }

    #[test]
    fn test_detect_captcha_ignores_bad_selector() {
        let selectors = vec!["div[".to_string(), ".challenge".to_string()];
        assert!(detect_captcha(r#"<p class="challenge">hi</p>"#, &selectors));
    }

    #[test]
    fn test_only_transport_is_transient() {
        let transport = FetchError::Transport {
            url: "u".to_string(),
            attempts: 4,
            status: Some(503),
            reason: "503 Service Unavailable".to_string(),
        };
        assert!(transport.is_transient());
        assert!(!FetchError::CaptchaDetected { url: "u".to_string() }.is_transient());
        assert!(!FetchError::NotFound { url: "u".to_string() }.is_transient());
    }
}
