//! Salient color extraction
//!
//! Pixels of a downsampled copy of the image are clustered with k-means in RGB.
//! Seeding is deterministic (farthest point), so the same image always yields
//! the same colors. Centroids are ranked by the number of pixels they own.

use crate::color::lab::Lab;
use crate::io::configuration::{
    DEFAULT_CLUSTERS, DEFAULT_REGION_CLUSTERS, DEFAULT_THUMBNAIL_SIZE, KMEANS_CONVERGENCE,
    KMEANS_MAX_ITERATIONS,
};
use crate::io::error::{Result, computation_error, invalid_parameter, invalid_source};
use crate::io::image::bound_long_edge;
use image::RgbImage;

type Vector = [f64; 3];

/// One dominant color of an image
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SalientColor {
    /// Cluster centroid in sRGB
    pub rgb: [u8; 3],
    /// Cluster centroid in CIE L*a*b*
    pub lab: Lab,
    /// Number of downsampled pixels assigned to the cluster
    pub population: usize,
}

impl SalientColor {
    /// Build a color from a perceptual triple, with no pixel population
    pub fn from_lab(lab: Lab) -> Self {
        Self {
            rgb: lab.to_rgb(),
            lab,
            population: 0,
        }
    }
}

/// Parameters for salient color extraction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Number of colors returned
    pub clusters: usize,
    /// Long-edge bound the image is downsampled to before clustering
    pub thumbnail_size: u32,
    /// Upper bound on k-means iterations
    pub max_iterations: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            clusters: DEFAULT_CLUSTERS,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            max_iterations: KMEANS_MAX_ITERATIONS,
        }
    }
}

impl ExtractionConfig {
    /// Settings used to derive the representative color of a target region
    pub const fn for_regions() -> Self {
        Self {
            clusters: DEFAULT_REGION_CLUSTERS,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            max_iterations: KMEANS_MAX_ITERATIONS,
        }
    }

    /// Check that every parameter is usable
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the cluster count or thumbnail size is zero
    pub fn validate(&self) -> Result<()> {
        if self.clusters == 0 {
            return Err(invalid_parameter(
                "clusters",
                &self.clusters,
                &"at least one cluster is required",
            ));
        }
        if self.thumbnail_size == 0 {
            return Err(invalid_parameter(
                "thumbnail_size",
                &self.thumbnail_size,
                &"must be positive",
            ));
        }
        Ok(())
    }
}

/// Extract the image's dominant colors, most abundant first
///
/// Always returns exactly `config.clusters` colors: when the image has fewer
/// distinct colors than requested, the lowest-ranked color is repeated.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration is invalid
/// - The image has zero width or height
pub fn salient_colors(image: &RgbImage, config: &ExtractionConfig) -> Result<Vec<SalientColor>> {
    config.validate()?;
    if image.width() == 0 || image.height() == 0 {
        return Err(invalid_source(&"cannot extract colors from an empty image"));
    }

    let thumbnail = bound_long_edge(image, config.thumbnail_size);
    let pixels: Vec<Vector> = thumbnail
        .pixels()
        .map(|pixel| pixel.0.map(f64::from))
        .collect();

    let centroids = kmeans(&pixels, config.clusters, config.max_iterations);
    let counts = populations(&pixels, &centroids);

    // Empty clusters are dropped; stable sort keeps seed order among equal counts
    let mut ranked: Vec<(Vector, usize)> = centroids
        .into_iter()
        .zip(counts)
        .filter(|&(_, count)| count > 0)
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let mut colors: Vec<SalientColor> = ranked
        .into_iter()
        .map(|(centroid, population)| {
            let rgb = centroid.map(channel_to_u8);
            SalientColor {
                rgb,
                lab: Lab::from_rgb(rgb),
                population,
            }
        })
        .collect();

    let Some(&lowest) = colors.last() else {
        return Err(computation_error(
            "salient colors",
            &"clustering produced no populated centroid",
        ));
    };
    colors.resize(config.clusters, lowest);

    Ok(colors)
}

/// The single most abundant color of an image
///
/// # Errors
///
/// Propagates any error from [`salient_colors`]
pub fn dominant_color(image: &RgbImage, config: &ExtractionConfig) -> Result<SalientColor> {
    let colors = salient_colors(image, config)?;
    colors
        .first()
        .copied()
        .ok_or_else(|| computation_error("dominant color", &"no colors extracted"))
}

fn kmeans(pixels: &[Vector], k: usize, max_iterations: usize) -> Vec<Vector> {
    let mut centroids = farthest_point_seeds(pixels, k);

    for _ in 0..max_iterations {
        let mut sums = vec![[0.0; 3]; centroids.len()];
        let mut counts = vec![0usize; centroids.len()];

        for pixel in pixels {
            let nearest = nearest_centroid(pixel, &centroids);
            if let (Some(sum), Some(count)) = (sums.get_mut(nearest), counts.get_mut(nearest)) {
                for (total, value) in sum.iter_mut().zip(pixel) {
                    *total += value;
                }
                *count += 1;
            }
        }

        let mut largest_shift = 0.0_f64;
        for ((centroid, sum), &count) in centroids.iter_mut().zip(&sums).zip(&counts) {
            if count == 0 {
                continue;
            }
            let updated = sum.map(|total| total / count as f64);
            largest_shift = largest_shift.max(squared_distance(centroid, &updated));
            *centroid = updated;
        }

        if largest_shift < KMEANS_CONVERGENCE {
            break;
        }
    }

    centroids
}

// Stops early once every pixel coincides with a seed, so uniform images get one centroid
fn farthest_point_seeds(pixels: &[Vector], k: usize) -> Vec<Vector> {
    let Some(&first) = pixels.get(pixels.len() / 2) else {
        return Vec::new();
    };
    let mut seeds = vec![first];
    let mut nearest_seed_distance: Vec<f64> = pixels
        .iter()
        .map(|pixel| squared_distance(pixel, &first))
        .collect();

    while seeds.len() < k {
        let farthest = nearest_seed_distance
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(index, &distance)| (index, distance));

        let Some((index, distance)) = farthest else {
            break;
        };
        if distance <= 0.0 {
            break;
        }
        let Some(&seed) = pixels.get(index) else {
            break;
        };

        seeds.push(seed);
        for (current, pixel) in nearest_seed_distance.iter_mut().zip(pixels) {
            *current = current.min(squared_distance(pixel, &seed));
        }
    }

    seeds
}

fn populations(pixels: &[Vector], centroids: &[Vector]) -> Vec<usize> {
    let mut counts = vec![0usize; centroids.len()];
    for pixel in pixels {
        if let Some(count) = counts.get_mut(nearest_centroid(pixel, centroids)) {
            *count += 1;
        }
    }
    counts
}

fn nearest_centroid(pixel: &Vector, centroids: &[Vector]) -> usize {
    centroids
        .iter()
        .enumerate()
        .min_by(|a, b| {
            squared_distance(pixel, a.1).total_cmp(&squared_distance(pixel, b.1))
        })
        .map_or(0, |(index, _)| index)
}

fn squared_distance(x: &Vector, y: &Vector) -> f64 {
    x.iter().zip(y).map(|(a, b)| (a - b).powi(2)).sum()
}

fn channel_to_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
