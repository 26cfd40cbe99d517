//! Mosaic composition from matched regions

use crate::algorithm::matcher::MatchResult;
use crate::io::configuration::DEFAULT_PADDING_COLOR;
use crate::io::error::{Result, computation_error, invalid_parameter};
use crate::io::image::{bound_long_edge, bound_short_edge, load_rgb, render_tile};
use crate::spatial::Partition;
use image::{Rgb, RgbImage, imageops};
use ndarray::Array2;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Supplier of decoded tile images by path
pub trait TileSource {
    /// Decoded RGB image stored at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be produced
    fn load(&mut self, path: &Path) -> Result<&RgbImage>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Downsample {
    #[default]
    Full,
    LongEdge(u32),
    ShortEdge(u32),
}

/// Tile source that decodes from disk and keeps every decoded tile
#[derive(Debug, Default)]
pub struct DiskTileSource {
    cache: HashMap<PathBuf, RgbImage>,
    downsample: Downsample,
}

impl DiskTileSource {
    /// Decode tiles at full resolution
    pub fn new() -> Self {
        Self::default()
    }

    /// Downsample decoded tiles so their long edge is at most `max_edge`
    pub fn with_max_edge(max_edge: u32) -> Self {
        Self {
            cache: HashMap::new(),
            downsample: Downsample::LongEdge(max_edge),
        }
    }

    /// Downsample decoded tiles to the smallest size that still covers an
    /// `edge` x `edge` region
    pub fn covering(edge: u32) -> Self {
        Self {
            cache: HashMap::new(),
            downsample: Downsample::ShortEdge(edge),
        }
    }

    /// Number of distinct tiles decoded so far
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl TileSource for DiskTileSource {
    fn load(&mut self, path: &Path) -> Result<&RgbImage> {
        if !self.cache.contains_key(path) {
            let decoded = load_rgb(path)?;
            let decoded = match self.downsample {
                Downsample::Full => decoded,
                Downsample::LongEdge(bound) => bound_long_edge(&decoded, bound),
                Downsample::ShortEdge(bound) => bound_short_edge(&decoded, bound),
            };
            self.cache.insert(path.to_path_buf(), decoded);
        }
        self.cache
            .get(path)
            .ok_or_else(|| computation_error("tile cache", &path.display()))
    }
}

/// Output styling
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssemblyConfig {
    /// Color of the margin around padded tiles
    pub padding_color: [u8; 3],
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            padding_color: DEFAULT_PADDING_COLOR,
        }
    }
}

/// Compose the mosaic for `partition` from its match results
///
/// Each region is filled with the padding color and its tile, scaled to the
/// placement, is pasted over it. Later tiles overwrite earlier ones. A tile
/// that cannot be loaded is reported and its region is filled with the
/// region's own color.
///
/// # Errors
///
/// Returns `InvalidParameter` if a match result lies outside the partition's
/// canvas
pub fn assemble<S: TileSource>(
    partition: &Partition,
    matches: &[MatchResult],
    tiles: &mut S,
    config: &AssemblyConfig,
) -> Result<RgbImage> {
    let (width, height) = partition.canvas_size();
    let mut canvas = RgbImage::new(width, height);
    let mut unavailable = 0usize;

    for matched in matches {
        let region = &matched.region;
        if region.x.saturating_add(region.width) > width
            || region.y.saturating_add(region.height) > height
        {
            return Err(invalid_parameter(
                "region",
                &format!(
                    "{}x{}+{}+{}",
                    region.width, region.height, region.x, region.y
                ),
                &format!("lies outside the {width}x{height} canvas"),
            ));
        }

        let rendered = match tiles.load(&matched.path) {
            Ok(tile) => render_tile(
                tile,
                region.size(),
                &matched.placement,
                config.padding_color,
            ),
            Err(error) => {
                tracing::warn!(
                    path = %matched.path.display(),
                    %error,
                    "cannot load tile, filling its region with the region color"
                );
                unavailable += 1;
                RgbImage::from_pixel(region.width, region.height, Rgb(region.color.rgb))
            }
        };
        imageops::replace(
            &mut canvas,
            &rendered,
            i64::from(region.x),
            i64::from(region.y),
        );
    }

    tracing::info!(
        width,
        height,
        tiles = matches.len(),
        unavailable,
        "assembled mosaic"
    );
    Ok(canvas)
}

/// Longest region edge in `partition`, the size tiles must be able to cover
pub fn tile_edge_bound(partition: &Partition) -> u32 {
    partition
        .regions()
        .map(|region| region.width.max(region.height))
        .max()
        .unwrap_or(0)
}

/// Reassemble a grid of equally sized tiles indexed by (row, col)
///
/// # Errors
///
/// Returns `InvalidParameter` if the tile size is zero or a tile has a
/// different size
pub fn assemble_grid(tiles: &Array2<RgbImage>, tile_size: (u32, u32)) -> Result<RgbImage> {
    let (tile_width, tile_height) = tile_size;
    if tile_width == 0 || tile_height == 0 {
        return Err(invalid_parameter(
            "tile_size",
            &format!("{tile_width}x{tile_height}"),
            &"width and height must be positive",
        ));
    }

    let (rows, cols) = tiles.dim();
    let mut canvas = RgbImage::new(cols as u32 * tile_width, rows as u32 * tile_height);

    for ((row, col), tile) in tiles.indexed_iter() {
        if tile.dimensions() != tile_size {
            return Err(invalid_parameter(
                "tile",
                &format!("{}x{} at ({row}, {col})", tile.width(), tile.height()),
                &format!("expected {tile_width}x{tile_height}"),
            ));
        }
        imageops::replace(
            &mut canvas,
            tile,
            i64::from(col as u32 * tile_width),
            i64::from(row as u32 * tile_height),
        );
    }

    Ok(canvas)
}
