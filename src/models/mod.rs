//! Data models for flashscrape.

mod card;

pub use card::{Card, CardSet};
pub(crate) use card::RawCard;
