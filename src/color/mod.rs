//! Perceptual colors and salient color extraction

/// CIE L*a*b* colors, conversions and perceptual distances
pub mod lab;
/// Dominant color extraction by k-means clustering
pub mod salient;

pub use lab::{Lab, ab_distance, hex, lab_distance};
pub use salient::{ExtractionConfig, SalientColor, dominant_color, salient_colors};
