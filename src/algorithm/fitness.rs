//! Candidate fitness: color proximity, lightness compatibility and usage fairness

use crate::color::Lab;
use crate::io::configuration::{DEFAULT_REUSE_KEEP, DEFAULT_USAGE_PENALTY};
use crate::io::error::{Result, invalid_parameter};

/// Parameters of the usage fairness model
///
/// Fairness acts twice: `usage_penalty` is added to a candidate's score for
/// every prior use, and during selection a candidate survives a random draw
/// with probability `reuse_keep` per prior use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FairnessPolicy {
    /// Score added per prior use
    pub usage_penalty: f64,
    /// Per-use survival probability in the reuse draw, in (0, 1]
    pub reuse_keep: f64,
}

impl Default for FairnessPolicy {
    fn default() -> Self {
        Self {
            usage_penalty: DEFAULT_USAGE_PENALTY,
            reuse_keep: DEFAULT_REUSE_KEEP,
        }
    }
}

impl FairnessPolicy {
    /// Plain color matching: no penalty, never reject
    pub const fn disabled() -> Self {
        Self {
            usage_penalty: 0.0,
            reuse_keep: 1.0,
        }
    }

    /// Check that every parameter is usable
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a negative penalty or a keep probability
    /// outside (0, 1]
    pub fn validate(&self) -> Result<()> {
        if !self.usage_penalty.is_finite() || self.usage_penalty < 0.0 {
            return Err(invalid_parameter(
                "usage_penalty",
                &self.usage_penalty,
                &"must be a non-negative number",
            ));
        }
        if !(self.reuse_keep > 0.0 && self.reuse_keep <= 1.0) {
            return Err(invalid_parameter(
                "reuse_keep",
                &self.reuse_keep,
                &"must be in (0, 1]",
            ));
        }
        Ok(())
    }
}

/// Whether a candidate is dark enough for the region
///
/// Padding can only brighten a tile, so darker candidates always qualify while
/// brighter ones qualify up to `tolerance`.
pub fn qualifies(candidate: Lab, region: Lab, tolerance: f64) -> bool {
    candidate.l - region.l <= tolerance
}

/// Fairness-adjusted score; lower is better
pub fn fitness(distance: f64, usage_count: u32, policy: &FairnessPolicy) -> f64 {
    policy
        .usage_penalty
        .mul_add(f64::from(usage_count), distance)
}

/// Fraction of the region given over to padding to brighten a darker candidate
///
/// Grows linearly with the lightness gap (`gain` per 100 L*), capped at `max`.
pub fn padding_fraction(candidate: Lab, region: Lab, gain: f64, max: f64) -> f64 {
    let gap = region.l - candidate.l;
    if gap <= 0.0 {
        return 0.0;
    }
    (gap / 100.0 * gain).min(max).max(0.0)
}
