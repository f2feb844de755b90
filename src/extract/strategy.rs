//! Marker strategies for locating cards in a set page.
//!
//! The target site has shipped several markups over the years. Each one is a
//! [`MarkerStrategy`] variant; supporting a new markup means adding a strategy
//! to the configured list rather than another scraper.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::text::element_text;
use super::ExtractError;
use crate::models::{Card, CardSet};

/// How to find term/definition pairs in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerStrategy {
    /// One container holding a flat list of leaves that alternate
    /// term, definition, term, definition...
    AlternatingLeaves { container: String, leaf: String },

    /// One block per card, each holding a term node and a definition node.
    PairedBlocks {
        block: String,
        term: String,
        definition: String,
    },

    /// Set data embedded as JSON in a `<script>` tag. `marker` picks the
    /// script; `map_key` names the card map inside it and defaults to
    /// `marker`.
    EmbeddedJson {
        marker: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        map_key: Option<String>,
        #[serde(default = "default_term_field")]
        term_field: String,
        #[serde(default = "default_definition_field")]
        definition_field: String,
    },
}

fn default_term_field() -> String {
    "word".to_string()
}

fn default_definition_field() -> String {
    "definition".to_string()
}

impl MarkerStrategy {
    /// Current set-page markup.
    pub fn terms_list() -> Self {
        Self::AlternatingLeaves {
            container: "section[data-testid='terms-list']".to_string(),
            leaf: "span.TermText".to_string(),
        }
    }

    /// Server-rendered page data map.
    pub fn terms_map() -> Self {
        Self::EmbeddedJson {
            marker: "termIdToTermsMap".to_string(),
            map_key: None,
            term_field: default_term_field(),
            definition_field: default_definition_field(),
        }
    }

    /// Older per-card block markup.
    pub fn legacy_blocks() -> Self {
        Self::PairedBlocks {
            block: "div.SetPageTerm-content, div.SetPageTerms-term, div.TermText".to_string(),
            term: "div.SetPageTerm-wordText, div.TermText-word".to_string(),
            definition: "div.SetPageTerm-definitionText, div.TermText-definition".to_string(),
        }
    }

    /// Default priority order: current markup first, then historical ones.
    pub fn defaults() -> Vec<Self> {
        vec![Self::terms_list(), Self::terms_map(), Self::legacy_blocks()]
    }

    /// Short description for logs and errors.
    pub fn label(&self) -> String {
        match self {
            Self::AlternatingLeaves { container, .. } => format!("alternating_leaves({})", container),
            Self::PairedBlocks { block, .. } => format!("paired_blocks({})", block),
            Self::EmbeddedJson { marker, .. } => format!("embedded_json({})", marker),
        }
    }

    /// Parse the selectors this strategy needs.
    pub fn compile(&self) -> Result<CompiledStrategy, ExtractError> {
        let kind = match self {
            Self::AlternatingLeaves { container, leaf } => CompiledKind::AlternatingLeaves {
                container: parse_selector(container)?,
                leaf: parse_selector(leaf)?,
            },
            Self::PairedBlocks {
                block,
                term,
                definition,
            } => CompiledKind::PairedBlocks {
                block: parse_selector(block)?,
                term: parse_selector(term)?,
                definition: parse_selector(definition)?,
            },
            Self::EmbeddedJson {
                marker,
                map_key,
                term_field,
                definition_field,
            } => CompiledKind::EmbeddedJson {
                script: parse_selector("script")?,
                marker: marker.clone(),
                map_key: map_key.clone().unwrap_or_else(|| marker.clone()),
                term_field: term_field.clone(),
                definition_field: definition_field.clone(),
            },
        };
        Ok(CompiledStrategy {
            label: self.label(),
            kind,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// A strategy with its selectors parsed, ready to run against documents.
#[derive(Debug, Clone)]
pub struct CompiledStrategy {
    label: String,
    kind: CompiledKind,
}

#[derive(Debug, Clone)]
enum CompiledKind {
    AlternatingLeaves {
        container: Selector,
        leaf: Selector,
    },
    PairedBlocks {
        block: Selector,
        term: Selector,
        definition: Selector,
    },
    EmbeddedJson {
        script: Selector,
        marker: String,
        map_key: String,
        term_field: String,
        definition_field: String,
    },
}

impl CompiledStrategy {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run this strategy alone.
    ///
    /// Fails with `ContainerNotFound` when the strategy's anchor is absent.
    /// A present anchor with nothing usable under it is an empty set.
    pub fn run(&self, document: &Html) -> Result<CardSet, ExtractError> {
        let cards = match &self.kind {
            CompiledKind::AlternatingLeaves { container, leaf } => {
                alternating_leaves(document, container, leaf)
            }
            CompiledKind::PairedBlocks {
                block,
                term,
                definition,
            } => paired_blocks(document, block, term, definition),
            CompiledKind::EmbeddedJson {
                script,
                marker,
                map_key,
                term_field,
                definition_field,
            } => embedded_json(
                document,
                script,
                marker,
                map_key,
                term_field,
                definition_field,
            ),
        };
        cards.ok_or_else(|| ExtractError::ContainerNotFound {
            strategy: self.label.clone(),
        })
    }
}

/// Pair a flat list of leaf texts: even index is a term, the next odd index
/// its definition.
///
/// A pair with a blank side is skipped, and so is a trailing unpaired leaf.
/// One malformed pair never stops the walk.
pub fn pair_alternating<S: AsRef<str>>(texts: &[S]) -> CardSet {
    texts
        .chunks(2)
        .filter_map(|pair| match pair {
            [term, definition] => Card::new(term.as_ref(), definition.as_ref()),
            _ => None,
        })
        .collect()
}

fn alternating_leaves(document: &Html, container: &Selector, leaf: &Selector) -> Option<CardSet> {
    let container = document.select(container).next()?;
    let texts: Vec<String> = container.select(leaf).map(element_text).collect();
    debug!("Found {} leaf elements in container", texts.len());
    Some(pair_alternating(&texts))
}

fn paired_blocks(
    document: &Html,
    block: &Selector,
    term: &Selector,
    definition: &Selector,
) -> Option<CardSet> {
    let blocks: Vec<ElementRef<'_>> = document.select(block).collect();
    if blocks.is_empty() {
        return None;
    }
    debug!("Found {} card blocks", blocks.len());

    let cards = blocks
        .into_iter()
        .filter_map(|b| {
            let t = b.select(term).next()?;
            let d = b.select(definition).next()?;
            Card::new(&element_text(t), &element_text(d))
        })
        .collect();
    Some(cards)
}

fn embedded_json(
    document: &Html,
    script: &Selector,
    marker: &str,
    map_key: &str,
    term_field: &str,
    definition_field: &str,
) -> Option<CardSet> {
    let quoted_marker = format!("\"{}\"", marker);

    for element in document.select(script) {
        let body: String = element.text().collect();
        if !body.contains(&quoted_marker) {
            continue;
        }

        let (Some(start), Some(end)) = (body.find('{'), body.rfind('}')) else {
            continue;
        };
        if end < start {
            continue;
        }

        let data: serde_json::Value = match serde_json::from_str(&body[start..=end]) {
            Ok(data) => data,
            Err(e) => {
                debug!("Script mentions {} but is not valid JSON: {}", marker, e);
                continue;
            }
        };

        if let Some(map) = find_key(&data, map_key).and_then(|v| v.as_object()) {
            return Some(cards_from_terms_map(map, term_field, definition_field));
        }
    }

    None
}

/// Depth-first search for the first object member named `key`.
fn find_key<'a>(value: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map
            .get(key)
            .or_else(|| map.values().find_map(|v| find_key(v, key))),
        serde_json::Value::Array(items) => items.iter().find_map(|v| find_key(v, key)),
        _ => None,
    }
}

fn cards_from_terms_map(
    map: &serde_json::Map<String, serde_json::Value>,
    term_field: &str,
    definition_field: &str,
) -> CardSet {
    // The `rank` field, when present, is set order. Unranked entries keep
    // their order in the page source (the map preserves insertion order).
    let mut entries: Vec<(i64, Card)> = map
        .values()
        .filter_map(|entry| {
            let term = entry.get(term_field)?.as_str()?;
            let definition = entry.get(definition_field)?.as_str()?;
            let card = Card::new(term, definition)?;
            let rank = entry
                .get("rank")
                .and_then(|r| r.as_i64())
                .unwrap_or(i64::MAX);
            Some((rank, card))
        })
        .collect();

    // Stable, so ties stay in map order
    entries.sort_by_key(|(rank, _)| *rank);
    entries.into_iter().map(|(_, card)| card).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(set: &CardSet) -> Vec<(&str, &str)> {
        set.iter()
            .map(|c| (c.term(), c.definition()))
            .collect()
    }

    #[test]
    fn test_pair_alternating_well_formed() {
        let set = pair_alternating(&["a", "1", "b", "2", "c", "3"]);
        assert_eq!(terms(&set), vec![("a", "1"), ("b", "2"), ("c", "3")]);
    }

    #[test]
    fn test_pair_alternating_odd_count_drops_last() {
        let set = pair_alternating(&["a", "1", "b", "2", "orphan"]);
        assert_eq!(terms(&set), vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_pair_alternating_skips_blank_pairs() {
        let set = pair_alternating(&["Bonjour", "Hello", "", "Goodbye", "Merci", "Thanks"]);
        assert_eq!(terms(&set), vec![("Bonjour", "Hello"), ("Merci", "Thanks")]);

        let set = pair_alternating(&["a", "  ", "b", "2"]);
        assert_eq!(terms(&set), vec![("b", "2")]);
    }

    #[test]
    fn test_pair_alternating_empty() {
        let empty: [&str; 0] = [];
        assert!(pair_alternating(&empty).is_empty());
        assert!(pair_alternating(&["lonely"]).is_empty());
    }

    #[test]
    fn test_compile_rejects_bad_selector() {
        let strategy = MarkerStrategy::AlternatingLeaves {
            container: "section[".to_string(),
            leaf: "span".to_string(),
        };
        match strategy.compile() {
            Err(ExtractError::InvalidSelector { selector, .. }) => assert_eq!(selector, "section["),
            other => panic!("expected InvalidSelector, got {:?}", other),
        }
    }

    #[test]
    fn test_paired_blocks_skips_incomplete_block() {
        let html = Html::parse_document(
            r#"<div class="SetPageTerm-content">
                 <div class="SetPageTerm-wordText">cat</div>
                 <div class="SetPageTerm-definitionText">chat</div>
               </div>
               <div class="SetPageTerm-content">
                 <div class="SetPageTerm-wordText">dog</div>
               </div>
               <div class="SetPageTerm-content">
                 <div class="SetPageTerm-wordText">bird</div>
                 <div class="SetPageTerm-definitionText">oiseau</div>
               </div>"#,
        );
        let set = MarkerStrategy::legacy_blocks()
            .compile()
            .unwrap()
            .run(&html)
            .unwrap();
        assert_eq!(terms(&set), vec![("cat", "chat"), ("bird", "oiseau")]);
    }

    #[test]
    fn test_embedded_json_orders_by_rank() {
        let html = Html::parse_document(
            r#"<html><head><script>window.__DATA__ = {"setPage":{"termIdToTermsMap":{
                "900":{"word":"second","definition":"deux","rank":1},
                "100":{"word":"first","definition":"un","rank":0},
                "500":{"word":"","definition":"rien","rank":2}
            }}};</script></head><body></body></html>"#,
        );
        let set = MarkerStrategy::terms_map()
            .compile()
            .unwrap()
            .run(&html)
            .unwrap();
        assert_eq!(terms(&set), vec![("first", "un"), ("second", "deux")]);
    }

    #[test]
    fn test_embedded_json_unranked_keeps_source_order() {
        let html = Html::parse_document(
            r#"<script>var d = {"termIdToTermsMap":{
                "30":{"word":"first","definition":"1"},
                "10":{"word":"second","definition":"2"},
                "b":{"word":"third","definition":"3"},
                "a":{"word":"fourth","definition":"4"}
            }};</script>"#,
        );
        let set = MarkerStrategy::terms_map()
            .compile()
            .unwrap()
            .run(&html)
            .unwrap();
        let words: Vec<&str> = set.iter().map(|c| c.term()).collect();
        assert_eq!(words, vec!["first", "second", "third", "fourth"]);
    }

    #[test]
    fn test_embedded_json_ranked_before_unranked() {
        let html = Html::parse_document(
            r#"<script>var d = {"termIdToTermsMap":{
                "1":{"word":"loose","definition":"x"},
                "2":{"word":"ranked","definition":"y","rank":5}
            }};</script>"#,
        );
        let set = MarkerStrategy::terms_map()
            .compile()
            .unwrap()
            .run(&html)
            .unwrap();
        assert_eq!(terms(&set), vec![("ranked", "y"), ("loose", "x")]);
    }

    #[test]
    fn test_embedded_json_separate_map_key() {
        let html = Html::parse_document(
            r#"<script>window.__NEXT_DATA__ = {"props":{"cards":{
                "7":{"front":"Hund","back":"dog"}
            }}};</script>"#,
        );
        let strategy = MarkerStrategy::EmbeddedJson {
            marker: "props".to_string(),
            map_key: Some("cards".to_string()),
            term_field: "front".to_string(),
            definition_field: "back".to_string(),
        };
        let set = strategy.compile().unwrap().run(&html).unwrap();
        assert_eq!(terms(&set), vec![("Hund", "dog")]);
    }

    #[test]
    fn test_embedded_json_without_marker_is_missing_container() {
        let html = Html::parse_document("<script>var x = {\"a\": 1};</script>");
        let result = MarkerStrategy::terms_map().compile().unwrap().run(&html);
        assert!(matches!(result, Err(ExtractError::ContainerNotFound { .. })));
    }

    #[test]
    fn test_strategy_roundtrips_through_toml() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            strategies: Vec<MarkerStrategy>,
        }
        let toml_str = r#"
            [[strategies]]
            kind = "alternating_leaves"
            container = "ul.cards"
            leaf = "li"

            [[strategies]]
            kind = "embedded_json"
            marker = "cardMap"
        "#;
        let parsed: Wrapper = toml::from_str(toml_str).unwrap();
        assert_eq!(
            parsed.strategies[0],
            MarkerStrategy::AlternatingLeaves {
                container: "ul.cards".to_string(),
                leaf: "li".to_string(),
            }
        );
        assert_eq!(
            parsed.strategies[1],
            MarkerStrategy::EmbeddedJson {
                marker: "cardMap".to_string(),
                map_key: None,
                term_field: "word".to_string(),
                definition_field: "definition".to_string(),
            }
        );
    }
}
