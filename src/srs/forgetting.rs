//! The exponential forgetting curve and its inverse.
//!
//! `retrievability` halves every `stability` days; `next_interval` picks the
//! elapsed time at which retrievability would decay to the target retention.
//! Both clamp their inputs so no caller can produce a division blow-up or a
//! negative interval.

use std::f64::consts::LN_2;

use crate::config::{RETENTION_MAX, RETENTION_MIN, STABILITY_FLOOR};

/// Probability of successful recall after `elapsed_days`, for a memory with
/// the given stability (days). Always in (0, 1]; exactly 1 at zero elapsed
/// time. Negative elapsed time (clock skew, out-of-order writes) counts as
/// zero.
pub fn retrievability(stability: f64, elapsed_days: f64) -> f64 {
  let stability = stability.max(STABILITY_FLOOR);
  let elapsed = elapsed_days.max(0.0);
  (-(elapsed / stability) * LN_2).exp()
}

/// Days until retrievability decays to `target_retention`. The algebraic
/// inverse of [`retrievability`]: `stability * log2(1 / retention)`.
pub fn next_interval(stability: f64, target_retention: f64) -> f64 {
  let stability = stability.max(STABILITY_FLOOR);
  let retention = target_retention.clamp(RETENTION_MIN, RETENTION_MAX);
  stability * (1.0 / retention).log2()
}
