//! Term/definition extraction from set pages.
//!
//! The [`Extractor`] runs an ordered list of marker strategies against a
//! parsed document and keeps the first one that produces cards.

mod strategy;
mod text;

pub use strategy::{pair_alternating, CompiledStrategy, MarkerStrategy};
pub use text::{element_text, normalize_text};

use scraper::Html;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::CardSet;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Card container not found ({strategy})")]
    ContainerNotFound { strategy: String },
    #[error("No cards found after trying {tried} marker strategies")]
    NoCardsFound { tried: usize },
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// Extraction settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Strategies in priority order.
    #[serde(default = "MarkerStrategy::defaults")]
    pub strategies: Vec<MarkerStrategy>,

    /// Treat "container found but no cards under it" as an empty set rather
    /// than `NoCardsFound`.
    #[serde(default)]
    pub allow_empty: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            strategies: MarkerStrategy::defaults(),
            allow_empty: false,
        }
    }
}

/// Extracts cards from documents using a fixed list of strategies.
#[derive(Debug, Clone)]
pub struct Extractor {
    strategies: Vec<CompiledStrategy>,
    allow_empty: bool,
}

impl Extractor {
    /// Build an extractor, parsing every configured selector up front.
    pub fn new(config: &ExtractConfig) -> Result<Self, ExtractError> {
        let configured = if config.strategies.is_empty() {
            warn!("No marker strategies configured, using defaults");
            MarkerStrategy::defaults()
        } else {
            config.strategies.clone()
        };

        let strategies = configured
            .iter()
            .map(MarkerStrategy::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            strategies,
            allow_empty: config.allow_empty,
        })
    }

    pub fn strategies(&self) -> &[CompiledStrategy] {
        &self.strategies
    }

    /// Parse raw HTML and extract from it.
    pub fn extract_html(&self, html: &str) -> Result<CardSet, ExtractError> {
        self.extract(&Html::parse_document(html))
    }

    /// Try each strategy in order; the first that yields a card wins.
    ///
    /// If no strategy found its container the result is `ContainerNotFound`.
    /// If some did but none yielded a card, the result is `NoCardsFound`,
    /// or an empty set when `allow_empty` is configured.
    pub fn extract(&self, document: &Html) -> Result<CardSet, ExtractError> {
        let mut container_found = false;

        for strategy in &self.strategies {
            match strategy.run(document) {
                Ok(cards) if !cards.is_empty() => {
                    info!("Extracted {} cards using {}", cards.len(), strategy.label());
                    return Ok(cards);
                }
                Ok(_) => {
                    debug!("{}: container present but no cards", strategy.label());
                    container_found = true;
                }
                Err(ExtractError::ContainerNotFound { .. }) => {
                    debug!("{}: container not found", strategy.label());
                }
                Err(e) => return Err(e),
            }
        }

        if !container_found {
            let tried: Vec<&str> = self.strategies.iter().map(|s| s.label()).collect();
            return Err(ExtractError::ContainerNotFound {
                strategy: tried.join(", "),
            });
        }

        if self.allow_empty {
            warn!("Card container found but empty");
            return Ok(CardSet::empty());
        }

        Err(ExtractError::NoCardsFound {
            tried: self.strategies.len(),
        })
    }
}

/// Run a single strategy against a document, without fallback.
pub fn extract_with(strategy: &MarkerStrategy, document: &Html) -> Result<CardSet, ExtractError> {
    strategy.compile()?.run(document)
}
