//! Review scheduling orchestrator.
//!
//! Combines the forgetting curve, the memory updater and the lifecycle state
//! machine into the two public operations: `initialize_card` and
//! `review_card`. Hybrid scheduling, as in Anki-style systems:
//!
//! For cards below graduation (`Learning`/`Relearning`):
//!   - fixed intra-day steps (1min, 10min, 1hr, 4hr by default)
//!   - failure resets to step 0, success advances one step
//!   - a successful review graduates to `Review` once the stability formula
//!     yields an interval past the graduation threshold
//!
//! For graduated cards (`Review`):
//!   - the memory-state formulas choose the interval
//!   - failure moves the card to `Relearning` and the step ladder
//!
//! Every operation is a pure function of its inputs; the wall clock is never
//! read here.

use chrono::{DateTime, Duration, Utc};

use crate::config::{DIFFICULTY_DEFAULT, INITIAL_STABILITY, MINUTES_PER_DAY, SchedulerConfig};
use crate::domain::{Card, CardState, Recall, ReviewOutcome};
use crate::srs::{forgetting, memory, memory::MemoryState};

/// Configuration-bound scheduler. Construct one per deployment and pass it
/// to callers explicitly.
#[derive(Debug, Clone)]
pub struct Scheduler {
  config: SchedulerConfig,
}

impl Scheduler {
  pub fn new(config: SchedulerConfig) -> Self {
    Self {
      config: config.sanitized(),
    }
  }

  pub fn config(&self) -> &SchedulerConfig {
    &self.config
  }

  /// A brand-new card: counters at zero, no memory state, due immediately.
  pub fn initialize_card(&self, owner_id: i64, prompt: String, answer: String) -> Card {
    Card::new(owner_id, prompt, answer)
  }

  /// Apply one review. Pure: the updated card is returned, the input is
  /// untouched, and all time arithmetic is anchored on `outcome.answered_at`.
  ///
  /// Reviewing a soft-deleted card is a caller bug: callers must filter
  /// deleted cards before scheduling.
  pub fn review_card(&self, card: &Card, outcome: &ReviewOutcome) -> Card {
    debug_assert!(
      !card.is_deleted(),
      "review_card called on soft-deleted card {}",
      card.id
    );
    if card.is_deleted() {
      tracing::warn!(card_id = card.id, "reviewing a soft-deleted card");
    }

    let mut next = card.clone();
    next.reps = card.reps + 1;
    next.last_review_at = Some(outcome.answered_at);

    if card.state == CardState::New {
      self.review_new(&mut next, outcome);
    } else {
      self.review_seen(card, &mut next, outcome);
    }
    next
  }

  /// Estimated recall probability at `now`, for diagnostics and "next
  /// review" displays. `None` for cards that were never reviewed.
  pub fn retrievability_at(&self, card: &Card, now: DateTime<Utc>) -> Option<f64> {
    let stability = card.stability?;
    let last_review = card.last_review_at?;
    Some(forgetting::retrievability(
      stability,
      elapsed_days(last_review, now),
    ))
  }

  /// First review: seed memory state and enter the learning ladder.
  /// No retrievability or updater math on this edge.
  fn review_new(&self, next: &mut Card, outcome: &ReviewOutcome) {
    next.state = CardState::Learning;
    next.stability = Some(INITIAL_STABILITY);
    next.difficulty = Some(DIFFICULTY_DEFAULT);
    let step = if outcome.is_correct() { 1 } else { 0 };
    self.schedule_learning_step(next, step, outcome.answered_at);
  }

  fn review_seen(&self, card: &Card, next: &mut Card, outcome: &ReviewOutcome) {
    let current = self.stored_memory(card);
    let elapsed = card
      .last_review_at
      .map(|last| elapsed_days(last, outcome.answered_at))
      .unwrap_or(0.0);
    let recall_probability = forgetting::retrievability(current.stability, elapsed);
    let updated = memory::update_memory(current, recall_probability, outcome.recall, &self.config);
    next.stability = Some(updated.stability);
    next.difficulty = Some(updated.difficulty);

    match (card.state, outcome.recall) {
      (CardState::Learning | CardState::Relearning, Recall::Correct) => {
        let candidate = forgetting::next_interval(updated.stability, self.config.target_retention);
        if candidate >= self.config.graduation_threshold_days {
          next.state = CardState::Review;
          next.learning_step = 0;
          self.apply_interval(next, candidate, outcome.answered_at);
        } else {
          self.schedule_learning_step(next, card.learning_step as usize + 1, outcome.answered_at);
        }
      }
      (CardState::Learning, Recall::Incorrect) => {
        self.schedule_learning_step(next, 0, outcome.answered_at);
      }
      (CardState::Review, Recall::Correct) => {
        let days = forgetting::next_interval(updated.stability, self.config.target_retention)
          .max(self.config.min_review_interval_days);
        self.apply_interval(next, days, outcome.answered_at);
      }
      (CardState::Review, Recall::Incorrect) => {
        next.state = CardState::Relearning;
        next.lapses = card.lapses + 1;
        self.schedule_learning_step(next, 0, outcome.answered_at);
      }
      (CardState::Relearning, Recall::Incorrect) => {
        // The lapse was counted on the Review -> Relearning edge
        self.schedule_learning_step(next, 0, outcome.answered_at);
      }
      (CardState::New, _) => unreachable!("new cards are handled by review_new"),
    }
  }

  /// Schedule a fixed intra-day step; the ladder saturates at its last step.
  fn schedule_learning_step(&self, next: &mut Card, step: usize, answered_at: DateTime<Utc>) {
    let steps = &self.config.learning_steps_minutes;
    let step = step.min(steps.len() - 1);
    next.learning_step = step as i64;
    self.apply_interval(next, steps[step] as f64 / MINUTES_PER_DAY, answered_at);
  }

  fn apply_interval(&self, next: &mut Card, days: f64, answered_at: DateTime<Utc>) {
    let days = days.clamp(0.0, self.config.max_interval_days);
    next.scheduled_days = days;
    next.next_review_at = Some(answered_at + Duration::seconds((days * 86_400.0).round() as i64));
  }

  /// Memory state as stored, defended against upstream corruption: missing
  /// or out-of-range values are replaced/clamped with a warning rather than
  /// trusted.
  fn stored_memory(&self, card: &Card) -> MemoryState {
    let raw = match (card.stability, card.difficulty) {
      (Some(stability), Some(difficulty)) => MemoryState {
        stability,
        difficulty,
      },
      _ => {
        tracing::warn!(
          card_id = card.id,
          "card past New is missing memory state, reseeding defaults"
        );
        MemoryState {
          stability: INITIAL_STABILITY,
          difficulty: DIFFICULTY_DEFAULT,
        }
      }
    };

    let clamped = raw.clamped();
    if clamped != raw {
      tracing::warn!(
        card_id = card.id,
        stability = raw.stability,
        difficulty = raw.difficulty,
        "stored memory state out of range, clamped"
      );
    }
    clamped
  }
}

fn elapsed_days(last_review: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
  ((now - last_review).num_seconds() as f64 / 86_400.0).max(0.0)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn scheduler() -> Scheduler {
    Scheduler::new(SchedulerConfig::default())
  }

  fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap()
  }

  fn new_card() -> Card {
    Card::new(1, "What is the capital of Japan?".to_string(), "Tokyo".to_string())
  }

  /// A graduated card with a given stability, reviewed `ago` days before
  /// `now`.
  fn review_state_card(stability: f64, ago: f64, now: DateTime<Utc>) -> Card {
    let mut card = new_card();
    card.id = 10;
    card.state = CardState::Review;
    card.stability = Some(stability);
    card.difficulty = Some(5.0);
    card.reps = 6;
    card.last_review_at = Some(now - Duration::seconds((ago * 86_400.0) as i64));
    card.next_review_at = Some(now);
    card.scheduled_days = ago;
    card
  }

  #[test]
  fn test_first_review_correct_enters_learning() {
    let now = start();
    let card = scheduler().review_card(&new_card(), &ReviewOutcome::correct(now));

    assert_eq!(card.state, CardState::Learning);
    assert_eq!(card.reps, 1);
    assert_eq!(card.lapses, 0);
    assert_eq!(card.last_review_at, Some(now));
    assert!(card.next_review_at.unwrap() > now);
    assert_eq!(card.stability, Some(INITIAL_STABILITY));
    assert_eq!(card.difficulty, Some(DIFFICULTY_DEFAULT));
    // Correct first answer skips straight to the second step (10 minutes)
    assert_eq!(card.learning_step, 1);
    assert_eq!(card.next_review_at, Some(now + Duration::minutes(10)));
  }

  #[test]
  fn test_first_review_incorrect_also_enters_learning() {
    let now = start();
    let card = scheduler().review_card(&new_card(), &ReviewOutcome::incorrect(now));

    // New -> Learning is unconditional; failure just starts at step 0
    assert_eq!(card.state, CardState::Learning);
    assert_eq!(card.reps, 1);
    assert_eq!(card.lapses, 0);
    assert_eq!(card.learning_step, 0);
    assert_eq!(card.next_review_at, Some(now + Duration::minutes(1)));
  }

  #[test]
  fn test_failed_learning_review_resets_ladder() {
    let scheduler = scheduler();
    let now = start();
    let mut card = scheduler.review_card(&new_card(), &ReviewOutcome::correct(now));
    assert_eq!(card.learning_step, 1);

    let later = card.next_review_at.unwrap();
    card = scheduler.review_card(&card, &ReviewOutcome::incorrect(later));

    assert_eq!(card.state, CardState::Learning);
    assert_eq!(card.learning_step, 0);
    assert_eq!(card.lapses, 0); // lapses only count from Review state
    assert_eq!(card.next_review_at, Some(later + Duration::minutes(1)));
  }

  #[test]
  fn test_always_correct_card_graduates_on_fourth_review() {
    let scheduler = scheduler();
    let mut card = new_card();
    let mut now = start();

    for _ in 0..3 {
      card = scheduler.review_card(&card, &ReviewOutcome::correct(now));
      assert_eq!(card.state, CardState::Learning);
      now = card.next_review_at.unwrap();
    }

    card = scheduler.review_card(&card, &ReviewOutcome::correct(now));
    assert_eq!(card.state, CardState::Review);
    assert_eq!(card.reps, 4);
    assert_eq!(card.learning_step, 0);
    // Graduation requires clearing the threshold
    assert!(card.scheduled_days >= 1.0);
    assert!(card.next_review_at.unwrap() >= now + Duration::days(1));
  }

  #[test]
  fn test_review_correct_grows_interval() {
    let now = start();
    let card = review_state_card(10.0, 1.5, now);
    let updated = scheduler().review_card(&card, &ReviewOutcome::correct(now));

    assert_eq!(updated.state, CardState::Review);
    assert!(updated.stability.unwrap() > 10.0);
    assert!(updated.scheduled_days > card.scheduled_days);
    assert_eq!(updated.reps, card.reps + 1);
  }

  #[test]
  fn test_mature_card_lapse() {
    let now = start();
    let card = review_state_card(10.0, 1.5, now);
    let updated = scheduler().review_card(&card, &ReviewOutcome::incorrect(now));

    assert_eq!(updated.state, CardState::Relearning);
    assert_eq!(updated.lapses, card.lapses + 1);
    assert!(updated.stability.unwrap() < 10.0);
    assert!(updated.stability.unwrap() > 0.0);
    assert_eq!(updated.learning_step, 0);
    assert_eq!(updated.next_review_at, Some(now + Duration::minutes(1)));
  }

  #[test]
  fn test_relearning_failure_does_not_count_second_lapse() {
    let scheduler = scheduler();
    let now = start();
    let card = review_state_card(10.0, 1.5, now);

    let lapsed = scheduler.review_card(&card, &ReviewOutcome::incorrect(now));
    assert_eq!(lapsed.lapses, 1);

    let again = lapsed.next_review_at.unwrap();
    let failed_again = scheduler.review_card(&lapsed, &ReviewOutcome::incorrect(again));

    assert_eq!(failed_again.state, CardState::Relearning);
    assert_eq!(failed_again.lapses, 1);
    assert_eq!(failed_again.reps, lapsed.reps + 1);
  }

  #[test]
  fn test_relearning_recovers_to_review() {
    let scheduler = scheduler();
    let now = start();
    let card = review_state_card(10.0, 1.5, now);

    let mut lapsed = scheduler.review_card(&card, &ReviewOutcome::incorrect(now));
    let mut at = lapsed.next_review_at.unwrap();

    // Keep answering correctly until the interval clears the threshold
    for _ in 0..10 {
      lapsed = scheduler.review_card(&lapsed, &ReviewOutcome::correct(at));
      if lapsed.state == CardState::Review {
        break;
      }
      at = lapsed.next_review_at.unwrap();
    }

    assert_eq!(lapsed.state, CardState::Review);
    assert!(lapsed.scheduled_days >= 1.0);
    assert_eq!(lapsed.lapses, 1);
  }

  #[test]
  fn test_state_machine_closure() {
    let scheduler = scheduler();
    let now = start();
    let defined = [
      CardState::New,
      CardState::Learning,
      CardState::Review,
      CardState::Relearning,
    ];

    for state in defined {
      for outcome in [ReviewOutcome::correct(now), ReviewOutcome::incorrect(now)] {
        let mut card = review_state_card(5.0, 1.0, now);
        card.state = state;
        if state == CardState::New {
          card.stability = None;
          card.difficulty = None;
        }
        let updated = scheduler.review_card(&card, &outcome);
        assert!(defined.contains(&updated.state));
        assert!(updated.stability.is_some());
        assert!(updated.next_review_at.is_some());
      }
    }
  }

  #[test]
  fn test_interval_is_capped() {
    let config = SchedulerConfig {
      max_interval_days: 30.0,
      ..Default::default()
    };
    let scheduler = Scheduler::new(config);
    let now = start();
    let card = review_state_card(1_000.0, 100.0, now);

    let updated = scheduler.review_card(&card, &ReviewOutcome::correct(now));
    assert!(updated.scheduled_days <= 30.0);
  }

  #[test]
  fn test_review_interval_floor() {
    // A freshly-lapsed-and-recovered stability can be tiny; Review intervals
    // still get at least the configured fraction of a day
    let now = start();
    let mut card = review_state_card(0.1, 0.01, now);
    card.difficulty = Some(10.0);

    let updated = scheduler().review_card(&card, &ReviewOutcome::correct(now));
    assert!(updated.scheduled_days >= 0.5);
  }

  #[test]
  fn test_clock_skew_counts_as_zero_elapsed() {
    let now = start();
    // last_review_at in the future relative to the answer
    let card = review_state_card(10.0, -2.0, now);
    let updated = scheduler().review_card(&card, &ReviewOutcome::correct(now));

    assert!(updated.stability.unwrap() > 10.0);
    assert!(updated.scheduled_days > 0.0);
  }

  #[test]
  fn test_corrupt_memory_state_is_clamped() {
    let now = start();
    let mut card = review_state_card(10.0, 1.0, now);
    card.stability = Some(-5.0);
    card.difficulty = Some(40.0);

    let updated = scheduler().review_card(&card, &ReviewOutcome::correct(now));
    let stability = updated.stability.unwrap();
    let difficulty = updated.difficulty.unwrap();
    assert!(stability.is_finite() && stability > 0.0);
    assert!((1.0..=10.0).contains(&difficulty));
  }

  #[test]
  fn test_retrievability_at() {
    let scheduler = scheduler();
    let now = start();

    // Never-reviewed card has no curve to read
    assert_eq!(scheduler.retrievability_at(&new_card(), now), None);

    // Reviewed exactly one half-life ago
    let card = review_state_card(7.0, 7.0, now);
    let r = scheduler.retrievability_at(&card, now).unwrap();
    assert!((r - 0.5).abs() < 1e-6);
  }

  #[test]
  #[should_panic(expected = "soft-deleted")]
  fn test_reviewing_deleted_card_asserts_in_debug() {
    let now = start();
    let mut card = review_state_card(10.0, 1.0, now);
    card.soft_delete(now);
    let _ = scheduler().review_card(&card, &ReviewOutcome::correct(now));
  }

  #[test]
  fn test_initialize_card() {
    let card = scheduler().initialize_card(9, "prompt".to_string(), "answer".to_string());
    assert_eq!(card.owner_id, 9);
    assert_eq!(card.state, CardState::New);
    assert!(card.next_review_at.is_none());
  }
}
