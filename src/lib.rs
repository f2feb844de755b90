//! flashscrape - flashcard set scraper.
//!
//! Fetches a set page through a [`providers::PageProvider`], extracts its
//! term/definition pairs with an [`extract::Extractor`] and writes them as
//! JSON through a [`sink::CardSink`]. Saved sets can be drilled with a
//! [`quiz::Quiz`].

pub mod config;
pub mod error;
pub mod extract;
pub mod import;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod quiz;
pub mod sink;

pub use config::{ConfigError, Settings};
pub use error::ScrapeError;
pub use extract::{ExtractConfig, ExtractError, Extractor, MarkerStrategy};
pub use models::{Card, CardSet};
pub use pipeline::Scraper;
pub use providers::{FetchError, FetchedPage, PageProvider};
pub use quiz::{Quiz, QuizConfig};
pub use sink::{CardSink, JsonFileSink, PersistenceError};
