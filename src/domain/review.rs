use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::CardState;

/// How a review went. A tagged variant rather than a bare bool so graded
/// outcomes can be added without changing updater or interval signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recall {
  Correct,
  Incorrect,
}

impl Recall {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "correct" => Some(Self::Correct),
      "incorrect" => Some(Self::Incorrect),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Correct => "correct",
      Self::Incorrect => "incorrect",
    }
  }

  pub fn is_correct(&self) -> bool {
    matches!(self, Self::Correct)
  }
}

/// Input to one scheduling step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutcome {
  pub recall: Recall,
  pub answered_at: DateTime<Utc>,
}

impl ReviewOutcome {
  pub fn correct(answered_at: DateTime<Utc>) -> Self {
    Self {
      recall: Recall::Correct,
      answered_at,
    }
  }

  pub fn incorrect(answered_at: DateTime<Utc>) -> Self {
    Self {
      recall: Recall::Incorrect,
      answered_at,
    }
  }

  pub fn is_correct(&self) -> bool {
    self.recall.is_correct()
  }
}

/// One persisted interaction log entry per completed review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewLog {
  pub id: i64,
  pub card_id: i64,
  pub recall: Recall,
  pub reviewed_at: DateTime<Utc>,
  /// Interval chosen by this review, fractional days
  pub scheduled_days: f64,
  /// State the card ended the review in
  pub state: CardState,
}

impl ReviewLog {
  pub fn new(
    card_id: i64,
    recall: Recall,
    reviewed_at: DateTime<Utc>,
    scheduled_days: f64,
    state: CardState,
  ) -> Self {
    Self {
      id: 0,
      card_id,
      recall,
      reviewed_at,
      scheduled_days,
      state,
    }
  }
}
