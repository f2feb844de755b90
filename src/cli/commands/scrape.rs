//! Scrape commands: fetch a set page, or read one from an open tab.

use anyhow::Context;
use console::style;

use flashscrape::providers::{BrowserProvider, HttpProvider};
use flashscrape::{FetchError, JsonFileSink, PageProvider, ScrapeError, Scraper, Settings};

/// Fetch a set page and save its cards.
pub async fn cmd_scrape(settings: &Settings, url: &str, use_browser: bool) -> anyhow::Result<()> {
    let url = validate_set_url(url)?;
    let scraper = Scraper::new(&settings.extract)?;
    let sink = JsonFileSink::with_list_field(&settings.output.path, &settings.output.list_field);

    let mut provider: Box<dyn PageProvider> = if use_browser {
        Box::new(BrowserProvider::new(
            settings.browser.clone(),
            settings.provider.clone(),
        ))
    } else {
        Box::new(HttpProvider::new(settings.provider.clone()))
    };

    println!(
        "{} Scraping {} via {}",
        style("→").cyan(),
        url,
        provider.name()
    );

    match scraper.scrape(provider.as_mut(), url.as_str(), &sink).await {
        Ok(cards) => {
            println!(
                "{} Saved {} cards to {}",
                style("✓").green(),
                cards.len(),
                sink.path().display()
            );
            Ok(())
        }
        Err(e @ ScrapeError::Fetch(FetchError::CaptchaDetected { .. })) if !use_browser => {
            eprintln!(
                "{} The site served a captcha. Try --browser, or solve it in your \
                 browser and use the `tab` command.",
                style("!").yellow()
            );
            Err(e).with_context(|| format!("Failed to scrape {}", url))
        }
        Err(e) => Err(e).with_context(|| format!("Failed to scrape {}", url)),
    }
}

/// Save the cards of the set open in an attached browser.
pub async fn cmd_tab(settings: &Settings) -> anyhow::Result<()> {
    let scraper = Scraper::new(&settings.extract)?;
    let sink = JsonFileSink::with_list_field(&settings.output.path, &settings.output.list_field);

    let mut provider = BrowserProvider::new(settings.browser.clone(), settings.provider.clone());
    let page = provider.fetch_active_tab().await;
    provider.close().await;
    let page = page.context("Failed to read the open tab")?;

    println!("{} Reading {}", style("→").cyan(), page.final_url);
    let cards = scraper
        .process(&page, &sink)
        .with_context(|| format!("Failed to extract cards from {}", page.final_url))?;

    println!(
        "{} Saved {} cards to {}",
        style("✓").green(),
        cards.len(),
        sink.path().display()
    );
    Ok(())
}

/// Only absolute http(s) URLs can be fetched.
fn validate_set_url(raw: &str) -> anyhow::Result<url::Url> {
    let url = url::Url::parse(raw).with_context(|| format!("Invalid URL: {}", raw))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => anyhow::bail!("Unsupported URL scheme '{}': {}", other, raw),
    }
}
