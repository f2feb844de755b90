//! Flashcard model types.

use serde::{Deserialize, Serialize};

/// A single term/definition pair.
///
/// Both fields are trimmed and non-empty. Construct through [`Card::new`],
/// which refuses to build a card with a blank side; deserializing goes
/// through the same check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCard")]
pub struct Card {
    term: String,
    definition: String,
}

/// A card as it appears on disk, before validation.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCard {
    pub term: String,
    pub definition: String,
}

impl TryFrom<RawCard> for Card {
    type Error = String;

    fn try_from(raw: RawCard) -> Result<Self, Self::Error> {
        Card::new(&raw.term, &raw.definition)
            .ok_or_else(|| format!("card has a blank side: {:?} / {:?}", raw.term, raw.definition))
    }
}

impl Card {
    /// Build a card from raw text, trimming both sides.
    /// Returns `None` if either side is empty after trimming.
    pub fn new(term: &str, definition: &str) -> Option<Self> {
        let term = term.trim();
        let definition = definition.trim();
        if term.is_empty() || definition.is_empty() {
            return None;
        }
        Some(Self {
            term: term.to_string(),
            definition: definition.to_string(),
        })
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }
}

/// Ordered result of one extraction run.
///
/// Order is document order of discovery. Duplicates are kept; a set may
/// legitimately repeat an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardSet {
    cards: Vec<Card>,
}

impl CardSet {
    /// An empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Card> {
        self.cards.iter()
    }
}

impl FromIterator<Card> for CardSet {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        Self {
            cards: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CardSet {
    type Item = Card;
    type IntoIter = std::vec::IntoIter<Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.into_iter()
    }
}

impl<'a> IntoIterator for &'a CardSet {
    type Item = &'a Card;
    type IntoIter = std::slice::Iter<'a, Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}
