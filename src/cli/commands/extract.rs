//! Offline extraction from a saved page.

use std::path::Path;

use anyhow::Context;
use console::style;

use flashscrape::{CardSink, JsonFileSink, Scraper, Settings};

/// Extract cards from a saved HTML file and save them.
pub fn cmd_extract(settings: &Settings, html_file: &Path) -> anyhow::Result<()> {
    let scraper = Scraper::new(&settings.extract)?;
    let cards = scraper
        .extract_file(html_file)
        .with_context(|| format!("Failed to extract cards from {}", html_file.display()))?;

    let sink = JsonFileSink::with_list_field(&settings.output.path, &settings.output.list_field);
    sink.write(&cards)?;

    println!(
        "{} Saved {} cards to {}",
        style("✓").green(),
        cards.len(),
        sink.path().display()
    );
    Ok(())
}
