//! One scrape run: fetch, extract, persist.

use std::path::Path;

use tracing::{info, warn};

use crate::error::ScrapeError;
use crate::extract::{ExtractConfig, Extractor};
use crate::models::CardSet;
use crate::providers::{FetchedPage, PageProvider};
use crate::sink::{CardSink, PersistenceError};

/// Ties a provider, the extractor and a sink together.
#[derive(Debug, Clone)]
pub struct Scraper {
    extractor: Extractor,
}

impl Scraper {
    pub fn new(config: &ExtractConfig) -> Result<Self, ScrapeError> {
        Ok(Self {
            extractor: Extractor::new(config)?,
        })
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Fetch `url`, extract its cards and write them to `sink`.
    ///
    /// The provider is closed once the fetch is done, whatever its outcome.
    /// Nothing reaches the sink unless extraction succeeded.
    pub async fn scrape<P, S>(
        &self,
        provider: &mut P,
        url: &str,
        sink: &S,
    ) -> Result<CardSet, ScrapeError>
    where
        P: PageProvider + ?Sized,
        S: CardSink + ?Sized,
    {
        info!("Scraping {} via {}", url, provider.name());
        let fetched = provider.fetch(url).await;
        provider.close().await;

        self.process(&fetched?, sink)
    }

    /// Extract and persist an already fetched page.
    pub fn process<S>(&self, page: &FetchedPage, sink: &S) -> Result<CardSet, ScrapeError>
    where
        S: CardSink + ?Sized,
    {
        if page.final_url != page.url {
            info!("{} redirected to {}", page.url, page.final_url);
        }

        let cards = self.extractor.extract_html(&page.html)?;
        if cards.is_empty() {
            warn!("No cards extracted from {}", page.final_url);
        }
        sink.write(&cards)?;
        Ok(cards)
    }

    /// Extract cards from a saved HTML file.
    pub fn extract_file(&self, path: &Path) -> Result<CardSet, ScrapeError> {
        let html = std::fs::read_to_string(path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.extractor.extract_html(&html)?)
    }
}
