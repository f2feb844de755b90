//! Top-level error type for a scrape run.

use thiserror::Error;

use crate::config::ConfigError;
use crate::extract::ExtractError;
use crate::import::ImportError;
use crate::providers::FetchError;
use crate::sink::PersistenceError;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),
    #[error("Could not write cards: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ScrapeError {
    /// Whether retrying the whole run later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ScrapeError::Fetch(e) if e.is_transient())
    }
}
