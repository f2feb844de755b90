//! Bounded retry with backoff, shared by the providers.

use std::future::Future;

use tracing::{debug, warn};

use super::config::ProviderOptions;
use super::FetchError;

/// Outcome of a single failed attempt.
pub(crate) enum AttemptError {
    Retryable { status: Option<u16>, reason: String },
    Fatal(FetchError),
}

impl AttemptError {
    /// The error reported to the caller after `attempts` tries.
    pub(crate) fn into_fetch_error(self, url: &str, attempts: u32) -> FetchError {
        match self {
            AttemptError::Retryable { status, reason } => FetchError::Transport {
                url: url.to_string(),
                attempts,
                status,
                reason,
            },
            AttemptError::Fatal(FetchError::Transport {
                url, status, reason, ..
            }) => FetchError::Transport {
                url,
                attempts,
                status,
                reason,
            },
            AttemptError::Fatal(e) => e,
        }
    }
}

/// Run `op` until it succeeds, fails fatally, or `max_retries + 1` attempts
/// have been made. `op` gets the 1-based attempt number.
pub(crate) async fn with_retries<T, F, Fut>(
    options: &ProviderOptions,
    url: &str,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let max_attempts = options.max_retries.saturating_add(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        debug!("Fetching {} (attempt {}/{})", url, attempt, max_attempts);

        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e @ AttemptError::Fatal(_)) => return Err(e.into_fetch_error(url, attempt)),
            Err(e @ AttemptError::Retryable { .. }) if attempt >= max_attempts => {
                return Err(e.into_fetch_error(url, attempt));
            }
            Err(AttemptError::Retryable { reason, .. }) => {
                let delay = options.backoff.delay(attempt);
                warn!(
                    "Attempt {} for {} failed ({}), retrying in {:?}",
                    attempt, url, reason, delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
