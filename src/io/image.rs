//! Raster decoding, export and tile rendering

use crate::algorithm::matcher::Placement;
use crate::io::error::{MosaicError, Result};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use std::path::Path;

/// Decode an image file into 8-bit RGB
///
/// # Errors
///
/// Returns `ImageLoad` if the file cannot be opened or decoded
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|source| MosaicError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })
}

/// Save an image, creating the parent directory if needed
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory cannot be created
/// - The image cannot be encoded or written to the specified path
pub fn save_rgb(image: &RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| MosaicError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    image.save(path).map_err(|e| MosaicError::ImageExport {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Downsample so the long edge is at most `bound`, preserving aspect ratio
///
/// Images already within the bound are returned unchanged.
pub fn bound_long_edge(image: &RgbImage, bound: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let long_edge = width.max(height);
    if long_edge <= bound || bound == 0 {
        return image.clone();
    }

    let scale = f64::from(bound) / f64::from(long_edge);
    let new_width = ((f64::from(width) * scale).round() as u32).max(1);
    let new_height = ((f64::from(height) * scale).round() as u32).max(1);
    imageops::resize(image, new_width, new_height, FilterType::Triangle)
}

/// Downsample so the short edge is at most `bound`, preserving aspect ratio
///
/// The result still covers a `bound` x `bound` area. Images already within
/// the bound, and a zero bound, leave the image unchanged.
pub fn bound_short_edge(image: &RgbImage, bound: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let short_edge = width.min(height);
    if short_edge <= bound || bound == 0 {
        return image.clone();
    }

    let scale = f64::from(bound) / f64::from(short_edge);
    let new_width = ((f64::from(width) * scale).round() as u32).max(bound);
    let new_height = ((f64::from(height) * scale).round() as u32).max(bound);
    imageops::resize(image, new_width, new_height, FilterType::Triangle)
}

/// Scale an image to exactly `width` x `height`, center-cropping to keep its aspect ratio
pub fn fit_cover(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (source_width, source_height) = image.dimensions();
    if source_width == 0 || source_height == 0 || width == 0 || height == 0 {
        return RgbImage::new(width, height);
    }

    let source_aspect = f64::from(source_width) / f64::from(source_height);
    let target_aspect = f64::from(width) / f64::from(height);

    let (crop_width, crop_height) = if source_aspect > target_aspect {
        let cropped = (f64::from(source_height) * target_aspect).round() as u32;
        (cropped.clamp(1, source_width), source_height)
    } else {
        let cropped = (f64::from(source_width) / target_aspect).round() as u32;
        (source_width, cropped.clamp(1, source_height))
    };

    let x = (source_width - crop_width) / 2;
    let y = (source_height - crop_height) / 2;
    let cropped = imageops::crop_imm(image, x, y, crop_width, crop_height).to_image();

    if cropped.dimensions() == (width, height) {
        cropped
    } else {
        imageops::resize(&cropped, width, height, FilterType::Lanczos3)
    }
}

/// Render one region: the scaled tile on a padding-colored background
pub fn render_tile(
    tile: &RgbImage,
    region_size: (u32, u32),
    placement: &Placement,
    padding_color: [u8; 3],
) -> RgbImage {
    let (width, height) = region_size;
    let mut canvas = RgbImage::from_pixel(width, height, Rgb(padding_color));
    let scaled = fit_cover(tile, placement.width, placement.height);
    imageops::replace(
        &mut canvas,
        &scaled,
        i64::from(placement.offset_x),
        i64::from(placement.offset_y),
    );
    canvas
}
