//! Stability/difficulty update after a review.
//!
//! Pure: current memory state, the retrievability measured at review time
//! and the outcome go in; the next memory state comes out, always inside the
//! documented bounds.

use crate::config::{
  DIFFICULTY_DEFAULT, DIFFICULTY_MAX, DIFFICULTY_MIN, SchedulerConfig, STABILITY_CEILING,
  STABILITY_FLOOR,
};
use crate::domain::Recall;

/// The two-component memory state of a reviewed card
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryState {
  /// Half-life of the memory, days
  pub stability: f64,
  /// Intrinsic hardness, 1 (easy) to 10 (hard)
  pub difficulty: f64,
}

impl MemoryState {
  /// Force both components into their documented ranges. Non-finite values
  /// (corrupt storage) collapse to the floor/default.
  pub fn clamped(self) -> Self {
    Self {
      stability: clamp_stability(self.stability),
      difficulty: clamp_difficulty(self.difficulty),
    }
  }
}

fn clamp_stability(stability: f64) -> f64 {
  if stability.is_finite() {
    stability.clamp(STABILITY_FLOOR, STABILITY_CEILING)
  } else {
    STABILITY_FLOOR
  }
}

fn clamp_difficulty(difficulty: f64) -> f64 {
  if difficulty.is_finite() {
    difficulty.clamp(DIFFICULTY_MIN, DIFFICULTY_MAX)
  } else {
    DIFFICULTY_DEFAULT
  }
}

/// Compute the next memory state.
///
/// Correct answers ease difficulty and grow stability; the growth is larger
/// the closer the card was to being forgotten and smaller the harder the
/// card is. Incorrect answers harden difficulty and cut stability by a
/// constant factor: a reduction, never a reset, and never below the floor.
pub fn update_memory(
  current: MemoryState,
  retrievability: f64,
  recall: Recall,
  config: &SchedulerConfig,
) -> MemoryState {
  let MemoryState {
    stability,
    difficulty,
  } = current.clamped();
  let retrievability = if retrievability.is_finite() {
    retrievability.clamp(0.0, 1.0)
  } else {
    1.0
  };

  let next = match recall {
    Recall::Correct => {
      // Ease runs 1.0 (easiest card) down to 0.1 (hardest)
      let ease = (DIFFICULTY_MAX + 1.0 - difficulty) / DIFFICULTY_MAX;
      let gain =
        config.stability_growth * ease * (1.0 + config.recall_bonus * (1.0 - retrievability));
      MemoryState {
        stability: stability * (1.0 + gain),
        difficulty: difficulty - config.difficulty_reward,
      }
    }
    Recall::Incorrect => MemoryState {
      stability: stability * config.lapse_factor,
      difficulty: difficulty + config.difficulty_penalty,
    },
  };

  next.clamped()
}
