//! Plain-text set export import.
//!
//! A set can be exported as text with a custom separator between term and
//! definition and another between rows, e.g. `France<ans>Paris\nJapan<ans>Tokyo`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{Card, CardSet};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Malformed row {line}: '{content}' (expected term{delimiter}definition)")]
    MalformedRow {
        line: usize,
        content: String,
        delimiter: String,
    },
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Delimiters of a text export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFormat {
    #[serde(default = "default_pair_delimiter")]
    pub pair_delimiter: String,
    #[serde(default = "default_row_delimiter")]
    pub row_delimiter: String,
}

fn default_pair_delimiter() -> String {
    "<ans>".to_string()
}

fn default_row_delimiter() -> String {
    "\n".to_string()
}

impl Default for ExportFormat {
    fn default() -> Self {
        Self {
            pair_delimiter: default_pair_delimiter(),
            row_delimiter: default_row_delimiter(),
        }
    }
}

/// Parse export text into cards.
///
/// Blank rows are skipped. Any other row must split into a non-empty term
/// and definition; the first delimiter splits, later ones stay in the
/// definition.
pub fn parse_export(text: &str, format: &ExportFormat) -> Result<CardSet, ImportError> {
    let mut cards = Vec::new();

    for (index, row) in text.split(format.row_delimiter.as_str()).enumerate() {
        if row.trim().is_empty() {
            continue;
        }

        let card = row
            .split_once(format.pair_delimiter.as_str())
            .and_then(|(term, definition)| Card::new(term, definition))
            .ok_or_else(|| ImportError::MalformedRow {
                line: index + 1,
                content: row.trim().to_string(),
                delimiter: format.pair_delimiter.clone(),
            })?;
        cards.push(card);
    }

    debug!("Parsed {} cards from export text", cards.len());
    Ok(cards.into_iter().collect())
}

/// Read and parse an export file.
pub fn import_file(path: &Path, format: &ExportFormat) -> Result<CardSet, ImportError> {
    let text = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_export(&text, format)
}
