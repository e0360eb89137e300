//! Application configuration constants.
//!
//! This module centralizes the scheduling constants and the tunable
//! calibration surface so they are never hardcoded throughout the codebase.

use serde::Deserialize;
use std::path::PathBuf;

// ==================== Database Configuration ====================

/// Configuration file structure for config.toml
#[derive(Debug, Deserialize)]
struct AppConfig {
    database: Option<DatabaseConfig>,
    scheduler: Option<SchedulerConfig>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

/// Load database path with priority: config.toml > .env > default
pub fn load_database_path() -> PathBuf {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Priority 1: config.toml
    if let Some(config) = read_config_file() {
        if let Some(db) = config.database {
            if let Some(path) = db.path {
                tracing::info!("Using database from config.toml: {}", path);
                return PathBuf::from(path);
            }
        }
    }

    // Priority 2: .env DATABASE_PATH
    if let Ok(path) = std::env::var("DATABASE_PATH") {
        tracing::info!("Using database from DATABASE_PATH env: {}", path);
        return PathBuf::from(path);
    }

    // Default
    let default = PathBuf::from("data/quizdeck.db");
    tracing::info!("Using default database path: {}", default.display());
    default
}

fn read_config_file() -> Option<AppConfig> {
    let contents = std::fs::read_to_string("config.toml").ok()?;
    match toml::from_str::<AppConfig>(&contents) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Ignoring malformed config.toml: {}", e);
            None
        }
    }
}

// ==================== Memory-State Bounds ====================

/// Lower bound for stability (days). Keeps the forgetting-curve division
/// well away from blow-up and guarantees a lapsed card stays schedulable.
pub const STABILITY_FLOOR: f64 = 0.1;

/// Upper bound for stability (days). 100 years, matching the conventional
/// maximum-interval cap.
pub const STABILITY_CEILING: f64 = 36_500.0;

/// Stability seeded when a card leaves the New state.
pub const INITIAL_STABILITY: f64 = 1.0;

/// Difficulty scale bounds.
pub const DIFFICULTY_MIN: f64 = 1.0;
pub const DIFFICULTY_MAX: f64 = 10.0;

/// Difficulty seeded when a card leaves the New state.
pub const DIFFICULTY_DEFAULT: f64 = 5.0;

/// Target retention must stay inside this window for the interval formula
/// to produce usable numbers.
pub const RETENTION_MIN: f64 = 0.5;
pub const RETENTION_MAX: f64 = 0.995;

pub const MINUTES_PER_DAY: f64 = 1_440.0;

// ==================== Learning Steps ====================

/// Intra-day learning steps in minutes: 1min → 10min → 1hr → 4hr.
/// Cards climb these until the stability formula clears the graduation
/// threshold.
pub const LEARNING_STEPS_MINUTES: [i64; 4] = [1, 10, 60, 240];

// ==================== Scheduler Configuration ====================

/// Tunable scheduling constants. The defaults are the documented
/// calibration; deployments override them via the `[scheduler]` table in
/// config.toml.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Retention probability the next interval aims for.
    pub target_retention: f64,
    /// Interval (days) a learning/relearning card must reach to graduate.
    pub graduation_threshold_days: f64,
    /// Floor (days) for intervals of cards in Review state.
    pub min_review_interval_days: f64,
    /// Hard cap (days) on any scheduled interval.
    pub max_interval_days: f64,
    /// Intra-day retry ladder, minutes.
    pub learning_steps_minutes: Vec<i64>,
    /// Base stability growth per successful review.
    pub stability_growth: f64,
    /// Extra growth for recalling a nearly-forgotten card.
    pub recall_bonus: f64,
    /// Multiplicative stability cut on a failed review. Must stay in (0, 1).
    pub lapse_factor: f64,
    /// Difficulty decrease per correct answer.
    pub difficulty_reward: f64,
    /// Difficulty increase per incorrect answer.
    pub difficulty_penalty: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            target_retention: 0.9,
            graduation_threshold_days: 1.0,
            min_review_interval_days: 0.5,
            max_interval_days: STABILITY_CEILING,
            learning_steps_minutes: LEARNING_STEPS_MINUTES.to_vec(),
            stability_growth: 1.5,
            recall_bonus: 1.0,
            lapse_factor: 0.5,
            difficulty_reward: 0.3,
            difficulty_penalty: 1.0,
        }
    }
}

impl SchedulerConfig {
    /// Clamp every tunable into its documented range, warning about any
    /// value that had to be corrected.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if !(RETENTION_MIN..=RETENTION_MAX).contains(&self.target_retention) {
            tracing::warn!(
                "target_retention {} outside [{}, {}], using default {}",
                self.target_retention,
                RETENTION_MIN,
                RETENTION_MAX,
                defaults.target_retention
            );
            self.target_retention = defaults.target_retention;
        }

        if !self.graduation_threshold_days.is_finite() || self.graduation_threshold_days <= 0.0 {
            tracing::warn!(
                "graduation_threshold_days {} invalid, using default {}",
                self.graduation_threshold_days,
                defaults.graduation_threshold_days
            );
            self.graduation_threshold_days = defaults.graduation_threshold_days;
        }

        if !self.min_review_interval_days.is_finite() || self.min_review_interval_days <= 0.0 {
            self.min_review_interval_days = defaults.min_review_interval_days;
        }

        if !self.max_interval_days.is_finite()
            || self.max_interval_days < self.min_review_interval_days
        {
            self.max_interval_days = defaults.max_interval_days;
        }

        if self.learning_steps_minutes.is_empty()
            || self.learning_steps_minutes.iter().any(|&m| m <= 0)
        {
            tracing::warn!("learning_steps_minutes invalid, using defaults");
            self.learning_steps_minutes = defaults.learning_steps_minutes;
        }

        if !self.stability_growth.is_finite() || self.stability_growth <= 0.0 {
            self.stability_growth = defaults.stability_growth;
        }

        if !self.recall_bonus.is_finite() || self.recall_bonus < 0.0 {
            self.recall_bonus = defaults.recall_bonus;
        }

        if !(0.0..1.0).contains(&self.lapse_factor) || self.lapse_factor == 0.0 {
            tracing::warn!(
                "lapse_factor {} outside (0, 1), using default {}",
                self.lapse_factor,
                defaults.lapse_factor
            );
            self.lapse_factor = defaults.lapse_factor;
        }

        if !self.difficulty_reward.is_finite() || self.difficulty_reward < 0.0 {
            self.difficulty_reward = defaults.difficulty_reward;
        }

        if !self.difficulty_penalty.is_finite() || self.difficulty_penalty < 0.0 {
            self.difficulty_penalty = defaults.difficulty_penalty;
        }

        self
    }
}

/// Load scheduler configuration with priority: config.toml > .env > default
pub fn load_scheduler_config() -> SchedulerConfig {
    let _ = dotenvy::dotenv();

    let mut config = read_config_file()
        .and_then(|c| c.scheduler)
        .unwrap_or_default();

    // .env TARGET_RETENTION overrides the file for quick experiments
    if let Ok(raw) = std::env::var("TARGET_RETENTION") {
        match raw.parse::<f64>() {
            Ok(retention) => {
                tracing::info!("Using target retention from TARGET_RETENTION env: {}", retention);
                config.target_retention = retention;
            }
            Err(_) => tracing::warn!("Ignoring unparseable TARGET_RETENTION: {}", raw),
        }
    }

    config.sanitized()
}
