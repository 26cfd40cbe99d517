/// Mosaic composition and tile sources
pub mod assembly;
/// Command-line interface
pub mod cli;
/// Constants and defaults
pub mod configuration;
/// Error types
pub mod error;
/// Raster decoding, export and tile rendering
pub mod image;
/// Progress display
pub mod progress;
