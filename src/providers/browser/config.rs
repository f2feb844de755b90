//! Browser engine configuration types.
//!
//! These live outside `#[cfg(feature = "browser")]` so config parsing works
//! without the browser feature.

use serde::{Deserialize, Serialize};

/// Browser engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserEngineConfig {
    /// Run in headless mode (default: true).
    /// Ignored when attaching to a remote browser.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Remote Chrome DevTools URL (e.g., "ws://127.0.0.1:9222").
    /// If set, attaches to an existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    #[serde(default)]
    pub proxy: Option<String>,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Wait for this CSS selector before reading the page.
    #[serde(default = "default_wait_for_selector")]
    pub wait_for_selector: Option<String>,

    /// How long to wait for `wait_for_selector`, in seconds.
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_secs: u64,
}

pub fn default_headless() -> bool {
    true
}

pub fn default_wait_for_selector() -> Option<String> {
    Some("section[data-testid='terms-list']".to_string())
}

pub fn default_wait_timeout() -> u64 {
    10
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            remote_url: None,
            proxy: None,
            chrome_args: Vec::new(),
            wait_for_selector: default_wait_for_selector(),
            wait_timeout_secs: default_wait_timeout(),
        }
    }
}

impl BrowserEngineConfig {
    /// HTTP endpoint serving `/json/version` for a DevTools URL.
    pub fn version_endpoint(remote_url: &str) -> String {
        let http_url = remote_url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let http_url = if http_url.starts_with("http://") || http_url.starts_with("https://") {
            http_url
        } else {
            format!("http://{}", http_url)
        };
        format!("{}/json/version", http_url.trim_end_matches('/'))
    }

    /// Whether an open tab's URL is on the homepage's site: the same host
    /// or a subdomain of it, ignoring a leading `www.` on the homepage.
    pub fn tab_on_site(tab_url: &str, homepage: &str) -> bool {
        let host_of = |raw: &str| {
            url::Url::parse(raw)
                .ok()
                .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        };
        let (Some(tab_host), Some(site_host)) = (host_of(tab_url), host_of(homepage)) else {
            return false;
        };
        let site_host = site_host.trim_start_matches("www.");
        if site_host.is_empty() {
            return false;
        }
        tab_host == site_host || tab_host.ends_with(&format!(".{}", site_host))
    }
}
