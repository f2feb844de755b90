//! Direct HTTP page provider with bounded retry.
//!
//! Every attempt sends a fresh set of browser-like headers. Statuses on the
//! configured allowlist and network errors are retried with backoff; 404 and
//! captcha pages are terminal.

mod user_agent;

pub use user_agent::{browser_headers, random_user_agent, resolve_user_agent};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use super::config::ProviderOptions;
use super::retry::{with_retries, AttemptError};
use super::{detect_captcha, FetchError, FetchedPage, PageProvider};

/// Fetches set pages over plain HTTP.
pub struct HttpProvider {
    options: ProviderOptions,
    client: Option<Client>,
    visited_homepage: bool,
}

impl HttpProvider {
    pub fn new(options: ProviderOptions) -> Self {
        Self {
            options,
            client: None,
            visited_homepage: false,
        }
    }

    pub fn options(&self) -> &ProviderOptions {
        &self.options
    }

    /// Build the HTTP session if not already open.
    ///
    /// The cookie store keeps whatever the homepage visit sets for the
    /// target request.
    fn ensure_client(&mut self) -> Result<Client, FetchError> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }

        let client = Client::builder()
            .cookie_store(true)
            .timeout(self.options.timeout())
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        self.client = Some(client.clone());
        Ok(client)
    }

    fn user_agent(&self) -> String {
        resolve_user_agent(self.options.user_agent.as_deref())
    }

    /// Warm up the session on the homepage. Failures are only logged.
    async fn visit_homepage(&mut self, client: &Client) {
        self.visited_homepage = true;
        let homepage = self.options.homepage.clone();
        debug!("Visiting homepage {}", homepage);

        match client
            .get(&homepage)
            .headers(browser_headers(&self.user_agent()))
            .send()
            .await
        {
            Ok(response) => debug!("Homepage returned {}", response.status()),
            Err(e) => warn!("Homepage visit failed: {}", e),
        }
    }

    async fn attempt(&self, client: &Client, url: &str) -> Result<FetchedPage, AttemptError> {
        let response = client
            .get(url)
            .headers(browser_headers(&self.user_agent()))
            .send()
            .await
            .map_err(|e| AttemptError::Retryable {
                status: None,
                reason: e.to_string(),
            })?;

        let status = response.status();
        let final_url = response.url().to_string();

        if status == StatusCode::NOT_FOUND {
            return Err(AttemptError::Fatal(FetchError::NotFound {
                url: url.to_string(),
            }));
        }

        let body = response.text().await.map_err(|e| AttemptError::Retryable {
            status: Some(status.as_u16()),
            reason: format!("failed to read body: {}", e),
        })?;

        // Blocked pages often come back as 403 with the challenge markup.
        if !self.options.allow_captcha_bypass
            && detect_captcha(&body, &self.options.captcha_selectors)
        {
            return Err(AttemptError::Fatal(FetchError::CaptchaDetected {
                url: url.to_string(),
            }));
        }

        if status.is_success() {
            return Ok(FetchedPage {
                url: url.to_string(),
                final_url,
                status: status.as_u16(),
                html: body,
            });
        }

        let reason = status.to_string();
        if self.options.is_retryable_status(status.as_u16()) {
            Err(AttemptError::Retryable {
                status: Some(status.as_u16()),
                reason,
            })
        } else {
            Err(AttemptError::Fatal(FetchError::Transport {
                url: url.to_string(),
                attempts: 0,
                status: Some(status.as_u16()),
                reason,
            }))
        }
    }
}

#[async_trait]
impl PageProvider for HttpProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&mut self, url: &str) -> Result<FetchedPage, FetchError> {
        let client = self.ensure_client()?;

        if self.options.start_at_homepage && !self.visited_homepage {
            self.visit_homepage(&client).await;
        }

        let this = &*self;
        let client = &client;
        let page = with_retries(&self.options, url, move |_| this.attempt(client, url)).await?;
        info!("Fetched {} ({} bytes)", page.final_url, page.html.len());
        Ok(page)
    }

    async fn close(&mut self) {
        if self.client.take().is_some() {
            debug!("Closed HTTP session");
        }
        self.visited_homepage = false;
    }
}
