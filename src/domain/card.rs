use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a card's memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardState {
  New,
  Learning,
  Review,
  Relearning,
}

impl CardState {
  pub fn from_str(s: &str) -> Self {
    match s {
      "Learning" => Self::Learning,
      "Review" => Self::Review,
      "Relearning" => Self::Relearning,
      _ => Self::New,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::New => "New",
      Self::Learning => "Learning",
      Self::Review => "Review",
      Self::Relearning => "Relearning",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
  pub id: i64,
  /// Owner of the review queue this card belongs to (authorized upstream)
  pub owner_id: i64,
  pub prompt: String,
  pub answer: String,
  pub state: CardState,

  // Memory state (None only while state == New)
  pub stability: Option<f64>,
  pub difficulty: Option<f64>,

  /// Completed reviews, any outcome
  pub reps: i64,
  /// Incorrect answers while in Review state
  pub lapses: i64,

  pub last_review_at: Option<DateTime<Utc>>,
  /// None means due immediately (never scheduled)
  pub next_review_at: Option<DateTime<Utc>>,
  /// Interval chosen at the last scheduling decision, in fractional days
  pub scheduled_days: f64,
  /// Position in the intra-day step ladder while learning/relearning
  pub learning_step: i64,

  /// Soft-delete marker. Scheduling fields are untouched while set.
  pub deleted_at: Option<DateTime<Utc>>,
}

impl Card {
  pub fn new(owner_id: i64, prompt: String, answer: String) -> Self {
    Self {
      id: 0,
      owner_id,
      prompt,
      answer,
      state: CardState::New,
      stability: None,
      difficulty: None,
      reps: 0,
      lapses: 0,
      last_review_at: None,
      next_review_at: None,
      scheduled_days: 0.0,
      learning_step: 0,
      deleted_at: None,
    }
  }

  pub fn is_deleted(&self) -> bool {
    self.deleted_at.is_some()
  }

  /// Hide the card from scheduling. A pure visibility toggle: no scheduling
  /// field changes.
  pub fn soft_delete(&mut self, at: DateTime<Utc>) {
    if self.deleted_at.is_none() {
      self.deleted_at = Some(at);
    }
  }

  /// Make the card visible to scheduling again, exactly as it was.
  pub fn restore(&mut self) {
    self.deleted_at = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn make_reviewed_card() -> Card {
    let mut card = Card::new(7, "capital of France?".to_string(), "Paris".to_string());
    card.id = 42;
    card.state = CardState::Review;
    card.stability = Some(12.5);
    card.difficulty = Some(4.2);
    card.reps = 9;
    card.lapses = 1;
    card.last_review_at = Some(Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap());
    card.next_review_at = Some(Utc.with_ymd_and_hms(2025, 3, 14, 8, 30, 0).unwrap());
    card.scheduled_days = 13.0;
    card
  }

  #[test]
  fn test_card_state_roundtrip() {
    let states = [
      CardState::New,
      CardState::Learning,
      CardState::Review,
      CardState::Relearning,
    ];

    for state in states {
      assert_eq!(CardState::from_str(state.as_str()), state);
    }
  }

  #[test]
  fn test_card_state_from_str_default() {
    // Unknown strings default to New
    assert_eq!(CardState::from_str("unknown"), CardState::New);
    assert_eq!(CardState::from_str(""), CardState::New);
    assert_eq!(CardState::from_str("review"), CardState::New); // case sensitive
  }

  #[test]
  fn test_card_new_defaults() {
    let card = Card::new(3, "2 + 2?".to_string(), "4".to_string());

    assert_eq!(card.id, 0);
    assert_eq!(card.owner_id, 3);
    assert_eq!(card.state, CardState::New);
    assert!(card.stability.is_none());
    assert!(card.difficulty.is_none());
    assert_eq!(card.reps, 0);
    assert_eq!(card.lapses, 0);
    assert!(card.last_review_at.is_none());
    assert!(card.next_review_at.is_none());
    assert_eq!(card.scheduled_days, 0.0);
    assert_eq!(card.learning_step, 0);
    assert!(!card.is_deleted());
  }

  #[test]
  fn test_soft_delete_restore_roundtrip() {
    let card = make_reviewed_card();
    let mut toggled = card.clone();

    toggled.soft_delete(Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap());
    assert!(toggled.is_deleted());

    toggled.restore();
    assert_eq!(toggled, card);
  }

  #[test]
  fn test_soft_delete_keeps_first_timestamp() {
    let mut card = make_reviewed_card();
    let first = Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2025, 3, 6, 12, 0, 0).unwrap();

    card.soft_delete(first);
    card.soft_delete(second);

    assert_eq!(card.deleted_at, Some(first));
  }

  #[test]
  fn test_soft_delete_leaves_scheduling_fields() {
    let card = make_reviewed_card();
    let mut deleted = card.clone();
    deleted.soft_delete(Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap());

    assert_eq!(deleted.state, card.state);
    assert_eq!(deleted.stability, card.stability);
    assert_eq!(deleted.difficulty, card.difficulty);
    assert_eq!(deleted.reps, card.reps);
    assert_eq!(deleted.lapses, card.lapses);
    assert_eq!(deleted.next_review_at, card.next_review_at);
    assert_eq!(deleted.scheduled_days, card.scheduled_days);
  }

  #[test]
  fn test_card_serde_roundtrip_is_lossless() {
    let card = make_reviewed_card();
    let json = serde_json::to_string(&card).unwrap();
    let parsed: Card = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, card);
  }
}
