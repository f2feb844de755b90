//! Page provider options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Options shared by all page providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOptions {
    /// Carry on when a captcha is detected instead of failing.
    #[serde(default)]
    pub allow_captcha_bypass: bool,

    /// Visit the site's homepage once before the first target page.
    #[serde(default = "default_true")]
    pub start_at_homepage: bool,

    #[serde(default = "default_homepage")]
    pub homepage: String,

    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Statuses that trigger a retry.
    #[serde(default = "default_retry_status_codes")]
    pub retry_status_codes: Vec<u16>,

    #[serde(default)]
    pub backoff: Backoff,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Any match on a fetched page means the site served a captcha.
    #[serde(default = "default_captcha_selectors")]
    pub captcha_selectors: Vec<String>,

    /// User agent configuration.
    /// - "impersonate": a random real browser user agent, fresh per attempt
    /// - any other string: used as-is
    /// - unset: the flashscrape user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_homepage() -> String {
    "https://quizlet.com".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_status_codes() -> Vec<u16> {
    vec![429, 500, 502, 503, 504]
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_captcha_selectors() -> Vec<String> {
    vec!["#px-captcha-wrapper".to_string()]
}

fn default_user_agent() -> Option<String> {
    Some("impersonate".to_string())
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            allow_captcha_bypass: false,
            start_at_homepage: true,
            homepage: default_homepage(),
            max_retries: default_max_retries(),
            retry_status_codes: default_retry_status_codes(),
            backoff: Backoff::default(),
            timeout_secs: default_timeout_secs(),
            captcha_selectors: default_captcha_selectors(),
            user_agent: default_user_agent(),
        }
    }
}

impl ProviderOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_status_codes.contains(&status)
    }
}

/// Delay before each retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// No delay between attempts.
    None,
    /// `base_ms * retry`.
    Linear { base_ms: u64 },
    /// `base_ms * factor^(retry - 1)`.
    Exponential {
        base_ms: u64,
        #[serde(default = "default_factor")]
        factor: u32,
    },
}

fn default_factor() -> u32 {
    2
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base_ms: 1000,
            factor: default_factor(),
        }
    }
}

impl Backoff {
    /// Delay before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        let retry = retry.max(1);
        let ms = match self {
            Self::None => 0,
            Self::Linear { base_ms } => base_ms.saturating_mul(u64::from(retry)),
            Self::Exponential { base_ms, factor } => {
                let multiplier = u64::from(*factor).saturating_pow(retry - 1);
                base_ms.saturating_mul(multiplier)
            }
        };
        Duration::from_millis(ms)
    }
}
