//! Text export import.

use std::path::Path;

use anyhow::Context;
use console::style;

use flashscrape::import::import_file;
use flashscrape::{CardSink, JsonFileSink, Settings};

/// Convert a text export to the JSON card format.
pub fn cmd_import(settings: &Settings, text_file: &Path) -> anyhow::Result<()> {
    let cards = import_file(text_file, &settings.export)
        .with_context(|| format!("Failed to import {}", text_file.display()))?;

    let sink = JsonFileSink::with_list_field(&settings.output.path, &settings.output.list_field);
    sink.write(&cards)?;

    println!(
        "{} Imported {} cards to {}",
        style("✓").green(),
        cards.len(),
        sink.path().display()
    );
    Ok(())
}

/// Turn `\n`, `\r` and `\t` typed on the command line into the characters.
pub fn unescape_delimiter(raw: &str) -> String {
    raw.replace("\\n", "\n")
        .replace("\\r", "\r")
        .replace("\\t", "\t")
}
