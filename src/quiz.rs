//! Self-test over a saved card set.
//!
//! Cards are shuffled and asked one at a time. An answer counts when, after
//! trimming and lowercasing, either it or the expected side contains the
//! other. Missed cards are asked again in review rounds until a round ends
//! clean.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{Card, CardSet};

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("Card set is empty, nothing to quiz")]
    Empty,
}

/// Which side of a card the player has to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSide {
    /// Show the term, answer with the definition.
    #[default]
    Definition,
    /// Show the definition, answer with the term.
    Term,
}

/// Quiz settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizConfig {
    #[serde(default)]
    pub answer_side: AnswerSide,

    /// Ask missed cards again once a round is over.
    #[serde(default = "default_review_missed")]
    pub review_missed: bool,
}

fn default_review_missed() -> bool {
    true
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            answer_side: AnswerSide::default(),
            review_missed: default_review_missed(),
        }
    }
}

/// Result of one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was typed; the same card stays up.
    Blank,
    Correct,
    Incorrect { expected: String },
}

/// First-round tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
}

impl Score {
    /// Rounded percentage of first-round cards answered correctly.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.correct as f64 / self.total as f64) * 100.0).round() as u32
    }
}

/// Whether `given` is an acceptable answer for `expected`.
pub fn answer_matches(expected: &str, given: &str) -> bool {
    let given = given.trim().to_lowercase();
    if given.is_empty() {
        return false;
    }
    let expected = expected.trim().to_lowercase();
    expected.contains(&given) || given.contains(&expected)
}

/// A quiz in progress.
#[derive(Debug, Clone)]
pub struct Quiz {
    config: QuizConfig,
    round: Vec<Card>,
    index: usize,
    missed: Vec<Card>,
    round_number: u32,
    score: Score,
}

impl Quiz {
    /// Start a quiz over `cards` in shuffled order.
    pub fn new(cards: CardSet, config: QuizConfig) -> Result<Self, QuizError> {
        Self::with_seed(cards, config, clock_seed())
    }

    /// Start a quiz with a fixed shuffle seed.
    pub fn with_seed(cards: CardSet, config: QuizConfig, seed: u64) -> Result<Self, QuizError> {
        if cards.is_empty() {
            return Err(QuizError::Empty);
        }
        let mut round: Vec<Card> = cards.into_iter().collect();
        shuffle(&mut round, seed);

        Ok(Self {
            config,
            score: Score {
                correct: 0,
                total: round.len(),
            },
            round,
            index: 0,
            missed: Vec::new(),
            round_number: 1,
        })
    }

    /// The card being asked, or `None` once the quiz is over.
    pub fn current(&self) -> Option<&Card> {
        self.round.get(self.index)
    }

    /// Text shown for the current card.
    pub fn prompt(&self) -> Option<&str> {
        let card = self.current()?;
        Some(match self.config.answer_side {
            AnswerSide::Definition => card.term(),
            AnswerSide::Term => card.definition(),
        })
    }

    fn expected(&self) -> Option<&str> {
        let card = self.current()?;
        Some(match self.config.answer_side {
            AnswerSide::Definition => card.definition(),
            AnswerSide::Term => card.term(),
        })
    }

    /// 1 for the first pass, then one more per review round.
    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    /// Cards left in the current round, including the current one.
    pub fn remaining(&self) -> usize {
        self.round.len().saturating_sub(self.index)
    }

    pub fn is_finished(&self) -> bool {
        self.current().is_none()
    }

    pub fn score(&self) -> Score {
        self.score
    }

    /// Check an answer for the current card and move on.
    pub fn answer(&mut self, given: &str) -> Outcome {
        let Some(expected) = self.expected().map(str::to_string) else {
            return Outcome::Blank;
        };
        if given.trim().is_empty() {
            return Outcome::Blank;
        }

        let outcome = if answer_matches(&expected, given) {
            if self.round_number == 1 {
                self.score.correct += 1;
            }
            Outcome::Correct
        } else {
            Outcome::Incorrect { expected }
        };

        if let (Outcome::Incorrect { .. }, Some(card)) = (&outcome, self.current()) {
            self.missed.push(card.clone());
        }
        self.index += 1;

        if self.index >= self.round.len() {
            self.next_round();
        }
        outcome
    }

    fn next_round(&mut self) {
        if !self.config.review_missed || self.missed.is_empty() {
            self.round.clear();
            self.index = 0;
            return;
        }
        self.round = std::mem::take(&mut self.missed);
        self.index = 0;
        self.round_number += 1;
        debug!(
            "Starting review round {} with {} cards",
            self.round_number,
            self.round.len()
        );
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Fisher-Yates driven by xorshift64.
fn shuffle<T>(items: &mut [T], seed: u64) {
    let mut state = seed | 1;
    for i in (1..items.len()).rev() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let j = (state % (i as u64 + 1)) as usize;
        items.swap(i, j);
    }
}
