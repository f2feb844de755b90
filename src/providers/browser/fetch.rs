//! Page navigation and read helpers for the browser provider.

use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::Page;
use tracing::{debug, warn};

use crate::providers::retry::AttemptError;
use crate::providers::{detect_captcha, FetchError, FetchedPage, ProviderOptions};

/// Poll interval while waiting for a selector to appear.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// JavaScript to wait for page ready state.
const WAIT_FOR_READY_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete') {
            resolve(document.readyState);
        } else {
            window.addEventListener('load', () => resolve(document.readyState));
            setTimeout(() => resolve('timeout'), 10000);
        }
    })
"#;

pub(super) fn browser_error(e: impl std::fmt::Display) -> FetchError {
    FetchError::Browser(e.to_string())
}

/// Navigate a page to a URL. Failed navigations are worth retrying; a URL
/// the browser rejects is not.
pub(super) async fn navigate(page: &Page, url: &str) -> Result<(), AttemptError> {
    let nav_params = NavigateParams::builder().url(url).build().map_err(|e| {
        AttemptError::Fatal(FetchError::Browser(format!("Invalid URL {}: {}", url, e)))
    })?;

    page.execute(nav_params)
        .await
        .map_err(|e| AttemptError::Retryable {
            status: None,
            reason: e.to_string(),
        })?;
    Ok(())
}

/// Wait for the page to reach a ready state.
pub(super) async fn wait_for_page_ready(page: &Page, timeout: Duration) {
    match tokio::time::timeout(timeout, page.evaluate(WAIT_FOR_READY_SCRIPT.to_string())).await {
        Ok(Ok(result)) => {
            let state: String = result
                .into_value()
                .unwrap_or_else(|_| "unknown".to_string());
            debug!("Page ready state: {}", state);
        }
        Ok(Err(e)) => debug!("Could not check ready state: {}", e),
        Err(_) => warn!("Timeout waiting for page ready state"),
    }
}

/// Poll until `selector` matches or the budget runs out.
///
/// Set content renders client-side, so a missing selector right after load
/// is normal. A timeout is not an error here; the caller reads whatever
/// rendered and extraction reports the missing container.
pub(super) async fn wait_for_selector(page: &Page, selector: &str, budget: Duration) -> bool {
    debug!("Waiting up to {:?} for selector: {}", budget, selector);
    let deadline = tokio::time::Instant::now() + budget;

    loop {
        if page.find_element(selector).await.is_ok() {
            debug!("Selector found");
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            warn!("Timeout waiting for selector {}", selector);
            return false;
        }
        tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
    }
}

/// Read the rendered HTML of a page and check it for a captcha.
pub(super) async fn read_page(
    page: &Page,
    url: &str,
    options: &ProviderOptions,
) -> Result<FetchedPage, FetchError> {
    let final_url = page
        .url()
        .await
        .map_err(browser_error)?
        .unwrap_or_else(|| url.to_string());

    let html = page.content().await.map_err(browser_error)?;

    if detect_captcha(&html, &options.captcha_selectors) {
        if options.allow_captcha_bypass {
            warn!("Captcha present on {}, continuing as configured", final_url);
        } else {
            return Err(FetchError::CaptchaDetected {
                url: url.to_string(),
            });
        }
    }

    Ok(FetchedPage {
        url: url.to_string(),
        final_url,
        // CDP doesn't give us status codes easily
        status: 200,
        html,
    })
}
