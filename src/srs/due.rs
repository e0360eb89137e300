//! Due-set selection over a caller-supplied card snapshot.
//!
//! Pure and lock-free: eligibility and ordering are computed from exactly
//! the cards passed in. Staleness of the snapshot is the caller's problem.

use chrono::{DateTime, Utc};

use crate::domain::Card;

/// The cards eligible for review right now, in presentation order
#[derive(Debug, Clone, PartialEq)]
pub struct DueSet {
  /// Eligible cards: overdue first (oldest `next_review_at` leading, ties by
  /// id), then never-scheduled cards by id
  pub cards: Vec<Card>,
  /// Eligible cards that were never scheduled
  pub new_count: usize,
  /// Eligible cards whose scheduled time has passed
  pub due_count: usize,
}

impl DueSet {
  /// The card to present next, if any
  pub fn next(&self) -> Option<&Card> {
    self.cards.first()
  }
}

/// Select the cards eligible for review at `now`.
///
/// A card is eligible iff it is not soft-deleted and either was never
/// scheduled or its `next_review_at` has passed. Soft-deleted cards are
/// excluded unconditionally and counted in neither bucket.
pub fn due_cards(cards: &[Card], now: DateTime<Utc>) -> DueSet {
  let mut scheduled: Vec<&Card> = Vec::new();
  let mut unscheduled: Vec<&Card> = Vec::new();

  for card in cards {
    if card.is_deleted() {
      continue;
    }
    match card.next_review_at {
      None => unscheduled.push(card),
      Some(at) if at <= now => scheduled.push(card),
      Some(_) => {}
    }
  }

  scheduled.sort_by_key(|card| (card.next_review_at, card.id));
  unscheduled.sort_by_key(|card| card.id);

  let due_count = scheduled.len();
  let new_count = unscheduled.len();
  let cards = scheduled
    .into_iter()
    .chain(unscheduled)
    .cloned()
    .collect();

  DueSet {
    cards,
    new_count,
    due_count,
  }
}
