//! Card set persistence.
//!
//! Output is a single JSON document `{ "cards": [ {term, definition}, ... ] }`,
//! UTF-8 with non-ASCII left unescaped and two-space indentation.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::models::{Card, CardSet, RawCard};

/// Field name holding the card list in written files.
pub const DEFAULT_LIST_FIELD: &str = "cards";

/// Field names older exports used for the card list; accepted when reading.
const LEGACY_LIST_FIELDS: &[&str] = &["flashcards", "terms"];

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize cards: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to parse {}: {source}", .path.display())]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} has no card list (expected one of: {expected})", .path.display())]
    MissingCardList { path: PathBuf, expected: String },
}

/// Destination for extracted card sets.
pub trait CardSink {
    fn write(&self, cards: &CardSet) -> Result<(), PersistenceError>;
}

/// Writes card sets to a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
    list_field: String,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_list_field(path, DEFAULT_LIST_FIELD)
    }

    pub fn with_list_field(path: impl Into<PathBuf>, list_field: &str) -> Self {
        Self {
            path: path.into(),
            list_field: list_field.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Serialize a card set as the output document.
pub fn to_json(cards: &CardSet, list_field: &str) -> Result<String, PersistenceError> {
    #[derive(Serialize)]
    struct Entry<'a> {
        term: &'a str,
        definition: &'a str,
    }

    let entries: Vec<Entry<'_>> = cards
        .iter()
        .map(|c| Entry {
            term: c.term(),
            definition: c.definition(),
        })
        .collect();

    let mut document = serde_json::Map::new();
    document.insert(list_field.to_string(), serde_json::to_value(entries)?);
    Ok(serde_json::to_string_pretty(&serde_json::Value::Object(
        document,
    ))?)
}

impl CardSink for JsonFileSink {
    /// Write through a temp file in the destination directory, then rename
    /// it into place. A failed write leaves any previous file untouched.
    fn write(&self, cards: &CardSet) -> Result<(), PersistenceError> {
        let json = to_json(cards, &self.list_field)?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.write_all(b"\n"))
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        info!("Saved {} cards to {}", cards.len(), self.path.display());
        Ok(())
    }
}

/// Read a card file back.
///
/// Accepts the current `cards` field as well as the `flashcards` and
/// `terms` names used by older exports.
pub fn read_cards(path: &Path) -> Result<CardSet, PersistenceError> {
    let content = std::fs::read_to_string(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| PersistenceError::Deserialize {
            path: path.to_path_buf(),
            source,
        })?;

    let list = std::iter::once(DEFAULT_LIST_FIELD)
        .chain(LEGACY_LIST_FIELDS.iter().copied())
        .find_map(|field| value.get(field))
        .ok_or_else(|| PersistenceError::MissingCardList {
            path: path.to_path_buf(),
            expected: std::iter::once(DEFAULT_LIST_FIELD)
                .chain(LEGACY_LIST_FIELDS.iter().copied())
                .collect::<Vec<_>>()
                .join(", "),
        })?;

    // Blank entries are skipped rather than failing the whole file.
    let cards: Vec<RawCard> =
        serde_json::from_value(list.clone()).map_err(|source| PersistenceError::Deserialize {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(cards
        .into_iter()
        .filter_map(|c| Card::new(&c.term, &c.definition))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> CardSet {
        [("Bonjour", "Hello"), ("Merci", "Thanks"), ("Bonjour", "Hello")]
            .iter()
            .filter_map(|(t, d)| Card::new(t, d))
            .collect()
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cards.json");
        let cards = sample();

        JsonFileSink::new(&path).write(&cards).unwrap();
        assert_eq!(read_cards(&path).unwrap(), cards);
    }

    #[test]
    fn test_output_shape_and_unescaped_unicode() {
        let cards: CardSet = [("日本語", "Japanese"), ("naïve", "naive")]
            .iter()
            .filter_map(|(t, d)| Card::new(t, d))
            .collect();
        let json = to_json(&cards, DEFAULT_LIST_FIELD).unwrap();

        assert!(json.contains("日本語"));
        assert!(json.contains("naïve"));
        assert!(!json.contains("\\u"));
        assert!(json.starts_with("{\n  \"cards\": [\n"));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["cards"][0]["term"], "日本語");
        assert_eq!(value["cards"][1]["definition"], "naive");
    }

    #[test]
    fn test_empty_set_writes_empty_list() {
        let json = to_json(&CardSet::empty(), DEFAULT_LIST_FIELD).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["cards"], serde_json::json!([]));
    }

    #[test]
    fn test_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cards.json");
        std::fs::write(&path, "stale").unwrap();

        JsonFileSink::new(&path).write(&sample()).unwrap();
        assert_eq!(read_cards(&path).unwrap().len(), 3);
    }

    #[test]
    fn test_missing_directory_fails_without_leaving_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("cards.json");

        let result = JsonFileSink::new(&path).write(&sample());
        assert!(matches!(result, Err(PersistenceError::Io { .. })));
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_read_accepts_legacy_field_names() {
        let dir = TempDir::new().unwrap();
        for field in ["flashcards", "terms"] {
            let path = dir.path().join(format!("{}.json", field));
            std::fs::write(
                &path,
                format!(r#"{{"{}": [{{"term": " a ", "definition": "b"}}]}}"#, field),
            )
            .unwrap();
            let cards = read_cards(&path).unwrap();
            assert_eq!(cards.len(), 1);
            assert_eq!(cards.cards()[0].term(), "a");
        }
    }

    #[test]
    fn test_read_skips_blank_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cards.json");
        std::fs::write(
            &path,
            r#"{"cards": [{"term": "a", "definition": " "}, {"term": "b", "definition": "2"}]}"#,
        )
        .unwrap();
        let cards = read_cards(&path).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards.cards()[0].term(), "b");
    }

    #[test]
    fn test_read_without_list_field() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("other.json");
        std::fs::write(&path, r#"{"items": []}"#).unwrap();
        assert!(matches!(
            read_cards(&path),
            Err(PersistenceError::MissingCardList { .. })
        ));
    }

    #[test]
    fn test_custom_list_field() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cards.json");
        JsonFileSink::with_list_field(&path, "flashcards")
            .write(&sample())
            .unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"flashcards\""));
    }
}
