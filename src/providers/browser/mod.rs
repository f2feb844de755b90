//! Browser-based page provider for client-rendered set pages.
//!
//! Uses chromiumoxide (CDP). Either attaches to a browser started with
//! `--remote-debugging-port` or launches a local Chrome/Chromium.

mod config;
#[cfg(feature = "browser")]
mod fetch;

pub use config::BrowserEngineConfig;

use async_trait::async_trait;

use super::{FetchError, FetchedPage, PageProvider, ProviderOptions};

#[cfg(feature = "browser")]
use std::time::Duration;

#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use super::retry::with_retries;
#[cfg(feature = "browser")]
use fetch::{browser_error, navigate, read_page, wait_for_page_ready, wait_for_selector};

/// Browser-based page provider.
#[cfg(feature = "browser")]
pub struct BrowserProvider {
    config: BrowserEngineConfig,
    options: ProviderOptions,
    browser: Option<Browser>,
    handler: Option<tokio::task::JoinHandle<()>>,
    /// True when we started the browser process and own its lifetime.
    launched: bool,
    visited_homepage: bool,
}

#[cfg(feature = "browser")]
impl BrowserProvider {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    pub fn new(config: BrowserEngineConfig, options: ProviderOptions) -> Self {
        Self {
            config,
            options,
            browser: None,
            handler: None,
            launched: false,
            visited_homepage: false,
        }
    }

    /// Find Chrome executable.
    fn find_chrome() -> Result<std::path::PathBuf, FetchError> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        info!("Found Chrome in PATH: {}", path);
                        return Ok(std::path::PathBuf::from(path));
                    }
                }
            }
        }

        Err(FetchError::Browser(
            "Chrome/Chromium not found. Install it, or attach to a running browser \
             with --remote ws://127.0.0.1:9222"
                .to_string(),
        ))
    }

    /// Launch or connect to browser if not already running.
    async fn ensure_browser(&mut self) -> Result<(), FetchError> {
        if self.browser.is_some() {
            return Ok(());
        }

        if let Some(remote_url) = self.config.remote_url.clone() {
            return self.connect_remote(&remote_url).await;
        }

        info!("Launching browser (headless={})", self.config.headless);

        let chrome_path = Self::find_chrome()?;
        let mut builder = BrowserConfig::builder().chrome_executable(chrome_path);

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = self.config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox") // Often needed for headless in containers
            .arg("--disable-gpu");

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| FetchError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to launch browser: {}", e)))?;

        self.attach(browser, handler, true);
        Ok(())
    }

    /// Connect to a remote Chrome instance.
    async fn connect_remote(&mut self, url: &str) -> Result<(), FetchError> {
        info!("Connecting to remote browser at {}", url);

        let version_url = BrowserEngineConfig::version_endpoint(url);
        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .timeout(self.options.timeout())
            .send()
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to reach {}: {}", version_url, e)))?
            .json()
            .await
            .map_err(|e| FetchError::Browser(format!("Bad browser version info: {}", e)))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| FetchError::Browser("No webSocketDebuggerUrl in response".to_string()))?;

        debug!("Connecting to WebSocket: {}", ws_url);

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: self.options.timeout(),
            ..Default::default()
        };

        let (browser, handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to connect: {}", e)))?;

        self.attach(browser, handler, false);
        Ok(())
    }

    fn attach(&mut self, browser: Browser, mut handler: chromiumoxide::Handler, launched: bool) {
        let task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });
        self.browser = Some(browser);
        self.handler = Some(task);
        self.launched = launched;
    }

    /// Inner fetch logic; the page is closed by the caller.
    async fn fetch_inner(
        &self,
        page: &chromiumoxide::Page,
        url: &str,
        visit_homepage: bool,
    ) -> Result<FetchedPage, FetchError> {
        let timeout = self.options.timeout();

        if visit_homepage {
            debug!("Visiting homepage {}", self.options.homepage);
            let homepage = self.options.homepage.as_str();
            match navigate(page, homepage).await {
                Ok(()) => wait_for_page_ready(page, timeout).await,
                Err(e) => warn!(
                    "Homepage visit failed: {}",
                    e.into_fetch_error(homepage, 1)
                ),
            }
        }

        info!("Navigating to {}", url);
        with_retries(&self.options, url, move |_| navigate(page, url)).await?;
        wait_for_page_ready(page, timeout).await;

        if let Some(ref selector) = self.config.wait_for_selector {
            wait_for_selector(
                page,
                selector,
                Duration::from_secs(self.config.wait_timeout_secs),
            )
            .await;
        }

        read_page(page, url, &self.options).await
    }

    /// Read the set page already open in an attached browser.
    ///
    /// Picks the first tab whose URL is on the homepage's host.
    pub async fn fetch_active_tab(&mut self) -> Result<FetchedPage, FetchError> {
        self.ensure_browser().await?;

        let site_host = url::Url::parse(&self.options.homepage)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
            .unwrap_or_default();

        let pages = {
            let browser = self
                .browser
                .as_mut()
                .ok_or_else(|| FetchError::Browser("browser not initialized".to_string()))?;
            if let Err(e) = browser.fetch_targets().await {
                debug!("Could not refresh browser targets: {}", e);
            }
            // Give the handler a moment to attach to existing tabs
            tokio::time::sleep(Duration::from_millis(500)).await;
            browser.pages().await.map_err(browser_error)?
        };
        debug!("Browser has {} open tabs", pages.len());

        for page in pages {
            let Some(tab_url) = page.url().await.ok().flatten() else {
                continue;
            };
            if !BrowserEngineConfig::tab_on_site(&tab_url, &self.options.homepage) {
                continue;
            }

            info!("Reading open tab {}", tab_url);
            if let Some(ref selector) = self.config.wait_for_selector {
                wait_for_selector(
                    &page,
                    selector,
                    Duration::from_secs(self.config.wait_timeout_secs),
                )
                .await;
            }
            return read_page(&page, &tab_url, &self.options).await;
        }

        Err(FetchError::NotFound {
            url: format!("open tab on {}", site_host),
        })
    }

    async fn shutdown(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            // Never close a browser we merely attached to
            if self.launched {
                if let Err(e) = browser.close().await {
                    debug!("Browser close failed: {}", e);
                }
                let _ = browser.wait().await;
                info!("Browser closed");
            }
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        self.launched = false;
        self.visited_homepage = false;
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl PageProvider for BrowserProvider {
    fn name(&self) -> &str {
        "browser"
    }

    async fn fetch(&mut self, url: &str) -> Result<FetchedPage, FetchError> {
        self.ensure_browser().await?;

        let visit_homepage = self.options.start_at_homepage && !self.visited_homepage;
        self.visited_homepage = true;

        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| FetchError::Browser("browser not initialized".to_string()))?;
        let page = browser.new_page("about:blank").await.map_err(browser_error)?;

        // Close the tab whatever happened
        let result = self.fetch_inner(&page, url, visit_homepage).await;
        let _ = page.close().await;
        result
    }

    async fn close(&mut self) {
        self.shutdown().await;
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
#[allow(dead_code)]
pub struct BrowserProvider {
    config: BrowserEngineConfig,
    options: ProviderOptions,
}

#[cfg(not(feature = "browser"))]
impl BrowserProvider {
    pub fn new(config: BrowserEngineConfig, options: ProviderOptions) -> Self {
        Self { config, options }
    }

    pub async fn fetch_active_tab(&mut self) -> Result<FetchedPage, FetchError> {
        Err(not_compiled())
    }
}

#[cfg(not(feature = "browser"))]
fn not_compiled() -> FetchError {
    FetchError::Browser(
        "Browser support not compiled. Rebuild with: cargo build --features browser".to_string(),
    )
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl PageProvider for BrowserProvider {
    fn name(&self) -> &str {
        "browser"
    }

    async fn fetch(&mut self, _url: &str) -> Result<FetchedPage, FetchError> {
        Err(not_compiled())
    }

    async fn close(&mut self) {}
}
