//! Card intake: stable identifiers and deterministic per-card jitter.

use std::collections::HashSet;

use thiserror::Error;

/// Stable identifier of a card within one engine instance.
pub type CardId = u32;

/// A renderable payload paired with its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct CardItem<T> {
    pub id: CardId,
    pub content: T,
}

impl<T> CardItem<T> {
    pub fn new(id: CardId, content: T) -> Self {
        Self { id, content }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeckError {
    #[error("card id {0} appears more than once")]
    DuplicateId(CardId),
}

/// Build a deck from bare contents.
///
/// The list is reversed and numbered `n - index`, so the first supplied
/// item ends up last in the deck (the front card) with id 1, and the last
/// supplied item sits at the back with id `n`.
pub fn intake<T>(contents: impl IntoIterator<Item = T>) -> Vec<CardItem<T>> {
    let mut reversed: Vec<T> = contents.into_iter().collect();
    reversed.reverse();
    let n = reversed.len() as CardId;
    reversed
        .into_iter()
        .enumerate()
        .map(|(index, content)| CardItem::new(n - index as CardId, content))
        .collect()
}

/// Build a deck from caller-assigned ids, with the same front-first reversal
/// as [`intake`].
pub fn intake_with_ids<T>(
    pairs: impl IntoIterator<Item = (CardId, T)>,
) -> Result<Vec<CardItem<T>>, DeckError> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for (id, content) in pairs {
        if !seen.insert(id) {
            return Err(DeckError::DuplicateId(id));
        }
        items.push(CardItem::new(id, content));
    }
    items.reverse();
    Ok(items)
}

/// Pseudo-random tilt in `[-5, 5)` degrees derived only from `id`.
///
/// The same card always gets the same tilt, across renders and re-layouts.
pub fn stable_random_rotate(id: CardId) -> f64 {
    let hashed = (u64::from(id) * 9301 + 49297) % 1000;
    hashed as f64 / 1000.0 * 10.0 - 5.0
}
