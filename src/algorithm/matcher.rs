//! Region-to-image matching
//!
//! Regions are matched one at a time against a mutable pool index: each match
//! queries the index, scores the candidates against the current usage counts
//! and increments the winner's count before the next region is considered.
//! The exclusive borrow of the index makes that sequence atomic per region.

use crate::algorithm::fitness::{FairnessPolicy, fitness, padding_fraction, qualifies};
use crate::io::configuration::{
    DEFAULT_LIGHTNESS_TOLERANCE, DEFAULT_MAX_PADDING, DEFAULT_PADDING_GAIN, DEFAULT_SEED,
};
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::math::probability::reuse_rejection_probability;
use crate::pool::{Candidate, DistanceMetric, PoolImage, PoolIndex};
use crate::spatial::{Partition, Region};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::collections::HashSet;
use std::path::PathBuf;

/// Matching parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchConfig {
    /// How much brighter than its region a candidate may be (L* units)
    pub lightness_tolerance: f64,
    /// Usage fairness model
    pub fairness: FairnessPolicy,
    /// Padding fraction per 100 L* of lightness gap
    pub padding_gain: f64,
    /// Largest padding fraction, in [0, 1)
    pub max_padding: f64,
    /// Randomise each tile's position within its padding margin
    pub jitter: bool,
    /// Seed for the default random source
    pub seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            lightness_tolerance: DEFAULT_LIGHTNESS_TOLERANCE,
            fairness: FairnessPolicy::default(),
            padding_gain: DEFAULT_PADDING_GAIN,
            max_padding: DEFAULT_MAX_PADDING,
            jitter: true,
            seed: DEFAULT_SEED,
        }
    }
}

impl MatchConfig {
    /// Check that every parameter is usable
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a negative tolerance or gain, a maximum
    /// padding outside [0, 1) or an invalid fairness policy
    pub fn validate(&self) -> Result<()> {
        if !self.lightness_tolerance.is_finite() || self.lightness_tolerance < 0.0 {
            return Err(invalid_parameter(
                "lightness_tolerance",
                &self.lightness_tolerance,
                &"must be a non-negative number",
            ));
        }
        if !self.padding_gain.is_finite() || self.padding_gain < 0.0 {
            return Err(invalid_parameter(
                "padding_gain",
                &self.padding_gain,
                &"must be a non-negative number",
            ));
        }
        if !(0.0..1.0).contains(&self.max_padding) {
            return Err(invalid_parameter(
                "max_padding",
                &self.max_padding,
                &"must be in [0, 1)",
            ));
        }
        self.fairness.validate()
    }
}

/// Where the scaled tile sits inside its region
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Horizontal offset from the region's left edge
    pub offset_x: u32,
    /// Vertical offset from the region's top edge
    pub offset_y: u32,
    /// Scaled tile width
    pub width: u32,
    /// Scaled tile height
    pub height: u32,
}

impl Placement {
    /// A tile covering the whole region
    pub const fn full(region: &Region) -> Self {
        Self {
            offset_x: 0,
            offset_y: 0,
            width: region.width,
            height: region.height,
        }
    }
}

/// The pool image chosen for a region and how to place it
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    /// The matched region
    pub region: Region,
    /// Id of the chosen pool image
    pub image_id: i64,
    /// Path of the chosen pool image
    pub path: PathBuf,
    /// Tile position and size inside the region
    pub placement: Placement,
    /// Fraction of the region given over to padding
    pub padding: f64,
}

#[derive(Clone, Copy)]
struct Scored<'a> {
    candidate: Candidate<'a>,
    score: f64,
}

impl Scored<'_> {
    const fn image(&self) -> &PoolImage {
        self.candidate.image
    }
}

/// Greedy, fairness-aware region matcher
///
/// The random source drives the reuse draw and the padding jitter; inject a
/// seeded one with [`TileMatcher::with_rng`] for reproducible runs.
pub struct TileMatcher<R = StdRng> {
    config: MatchConfig,
    rng: R,
}

impl TileMatcher<StdRng> {
    /// Create a matcher seeded from `config.seed`
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the configuration is invalid
    pub fn new(config: MatchConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(config.seed))
    }
}

impl<R: Rng> TileMatcher<R> {
    /// Create a matcher drawing from `rng`
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the configuration is invalid
    pub fn with_rng(config: MatchConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, rng })
    }

    /// Active configuration
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Choose a pool image for `region` and record its use
    ///
    /// Candidates brighter than the region by more than the tolerance are
    /// skipped unless no candidate qualifies, in which case color proximity
    /// alone decides. A region is never left unmatched.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The pool is empty
    /// - The usage count cannot be written to the store
    pub fn match_region(&mut self, region: &Region, index: &mut PoolIndex) -> Result<MatchResult> {
        let (image_id, path, lightness) = {
            let chosen = self.choose(region, index)?;
            let top = chosen.candidate.color;
            tracing::debug!(
                x = region.x,
                y = region.y,
                image = %chosen.image().path.display(),
                distance = chosen.candidate.distance,
                score = chosen.score,
                uses = chosen.image().usage_count,
                "matched region"
            );
            (chosen.image().id, chosen.image().path.clone(), top.lab)
        };

        index.increment_usage(image_id)?;

        let padding = padding_fraction(
            lightness,
            region.lab(),
            self.config.padding_gain,
            self.config.max_padding,
        );
        let placement = self.place(region, padding);

        Ok(MatchResult {
            region: *region,
            image_id,
            path,
            placement,
            padding,
        })
    }

    /// Match every region of `partition` in placement order
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The pool is empty
    /// - Any usage count cannot be written to the store
    pub fn match_all(
        &mut self,
        partition: &Partition,
        index: &mut PoolIndex,
    ) -> Result<Vec<MatchResult>> {
        if index.is_empty() {
            return Err(MosaicError::EmptyPool);
        }

        let mut results = Vec::with_capacity(partition.len());
        for region in partition.regions() {
            results.push(self.match_region(region, index)?);
        }

        let distinct: HashSet<i64> = results.iter().map(|m| m.image_id).collect();
        let padded = results.iter().filter(|m| m.padding > 0.0).count();
        tracing::info!(
            regions = results.len(),
            distinct_images = distinct.len(),
            padded,
            "matched all regions"
        );

        Ok(results)
    }

    fn choose<'a>(&mut self, region: &Region, index: &'a PoolIndex) -> Result<Scored<'a>> {
        let candidates = index.query_nearest(region.lab(), DistanceMetric::Chroma);
        if candidates.is_empty() {
            return Err(MosaicError::EmptyPool);
        }

        let policy = self.config.fairness;
        let score = |candidate: &Candidate<'a>| Scored {
            candidate: *candidate,
            score: fitness(candidate.distance, candidate.image.usage_count, &policy),
        };

        let tolerance = self.config.lightness_tolerance;
        let mut ranked: Vec<Scored<'a>> = candidates
            .iter()
            .filter(|candidate| qualifies(candidate.color.lab, region.lab(), tolerance))
            .map(score)
            .collect();

        if ranked.is_empty() {
            tracing::debug!(
                x = region.x,
                y = region.y,
                lightness = region.lab().l,
                "no candidate within lightness tolerance, matching on color alone"
            );
            ranked = candidates.iter().map(score).collect();
        }

        ranked.sort_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then(a.image().usage_count.cmp(&b.image().usage_count))
                .then(a.image().id.cmp(&b.image().id))
        });

        let keep = policy.reuse_keep;
        let accepted = ranked
            .iter()
            .find(|scored| !self.rejects(scored.image().usage_count, keep))
            .or_else(|| ranked.first())
            .copied();

        accepted.ok_or(MosaicError::EmptyPool)
    }

    fn rejects(&mut self, uses: u32, keep: f64) -> bool {
        let probability = reuse_rejection_probability(uses, keep);
        probability > 0.0 && self.rng.random::<f64>() < probability
    }

    fn place(&mut self, region: &Region, padding: f64) -> Placement {
        if padding <= 0.0 {
            return Placement::full(region);
        }

        let scale = 1.0 - padding;
        let width = ((f64::from(region.width) * scale).round() as u32).clamp(1, region.width.max(1));
        let height =
            ((f64::from(region.height) * scale).round() as u32).clamp(1, region.height.max(1));
        let margin_x = region.width.saturating_sub(width);
        let margin_y = region.height.saturating_sub(height);

        let (offset_x, offset_y) = if self.config.jitter {
            (
                self.rng.random_range(0..=margin_x),
                self.rng.random_range(0..=margin_y),
            )
        } else {
            (margin_x / 2, margin_y / 2)
        };

        Placement {
            offset_x,
            offset_y,
            width,
            height,
        }
    }
}
