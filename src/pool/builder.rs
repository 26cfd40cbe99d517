//! Pool construction
//!
//! Decoding and color extraction run on the rayon pool; registration stays on
//! the calling thread because the index owns a single SQLite connection.

use crate::color::{ExtractionConfig, SalientColor, salient_colors};
use crate::io::error::{MosaicError, Result};
use crate::io::configuration::STORE_SIDE_FILE_SUFFIXES;
use crate::io::image::load_rgb;
use crate::io::progress::ProgressManager;
use crate::pool::index::{PoolIndex, Registration};
use rayon::prelude::*;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Parameters for building a pool from a directory
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolBuildConfig {
    /// Salient color extraction applied to every candidate
    pub extraction: ExtractionConfig,
    /// Display a progress bar while analysing files
    pub show_progress: bool,
}

/// Per-file outcomes of a pool build
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Newly catalogued images
    pub registered: usize,
    /// Paths that were already catalogued
    pub duplicates: usize,
    /// Files that could not be decoded or catalogued
    pub skipped: usize,
}

/// A decoded candidate ready for registration
#[derive(Clone, Debug)]
pub struct AnalyzedImage {
    /// Source file
    pub path: PathBuf,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Ranked salient colors
    pub colors: Vec<SalientColor>,
}

/// Decode one candidate file and extract its salient colors
///
/// # Errors
///
/// Returns an error if the file cannot be decoded or has zero area
pub fn analyze_file(path: &Path, extraction: &ExtractionConfig) -> Result<AnalyzedImage> {
    let image = load_rgb(path)?;
    let colors = salient_colors(&image, extraction)?;
    Ok(AnalyzedImage {
        path: path.to_path_buf(),
        width: image.width(),
        height: image.height(),
        colors,
    })
}

/// Enumerate regular files below `directory`, sorted by name within each directory
///
/// The store file named by `store` and its SQLite side files (`-journal`,
/// `-wal`, `-shm`) are left out. Unreadable entries are reported and skipped.
///
/// # Errors
///
/// Returns `FileSystem` if `directory` is not a readable directory
pub fn collect_candidates(directory: &Path, store: Option<&Path>) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(MosaicError::FileSystem {
            path: directory.to_path_buf(),
            operation: "read pool directory",
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let store_name = store
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned());

    let mut files = Vec::new();
    for entry in WalkDir::new(directory).follow_links(true).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                let is_store = store_name
                    .as_deref()
                    .is_some_and(|store_name| is_store_file(entry.file_name(), store_name));
                if !is_store {
                    files.push(entry.into_path());
                }
            }
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(%error, "skipping unreadable directory entry");
            }
        }
    }

    Ok(files)
}

fn is_store_file(file_name: &OsStr, store_name: &str) -> bool {
    let Some(file_name) = file_name.to_str() else {
        return false;
    };
    file_name.strip_prefix(store_name).is_some_and(|rest| {
        rest.is_empty() || STORE_SIDE_FILE_SUFFIXES.contains(&rest)
    })
}

impl PoolIndex {
    /// Analyse every file below `directory` and register the decodable ones
    ///
    /// Files that cannot be decoded or whose path is not valid UTF-8 are
    /// reported and skipped; already known paths are reported as duplicates. Neither aborts the build.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The extraction configuration is invalid
    /// - `directory` cannot be read
    /// - The store rejects a registration
    pub fn build(&mut self, directory: &Path, config: &PoolBuildConfig) -> Result<BuildReport> {
        config.extraction.validate()?;
        let files = collect_candidates(directory, Some(self.path()))?;

        let progress = config
            .show_progress
            .then(|| ProgressManager::new(files.len(), "Indexing"));

        let analyzed: Vec<(&PathBuf, Result<AnalyzedImage>)> = files
            .par_iter()
            .map(|path| {
                let outcome = analyze_file(path, &config.extraction);
                if let Some(ref pm) = progress {
                    pm.advance();
                }
                (path, outcome)
            })
            .collect();

        let mut report = BuildReport::default();
        for (path, outcome) in analyzed {
            match outcome {
                Ok(image) if image.path.to_str().is_none() => {
                    tracing::warn!(
                        path = %image.path.display(),
                        "path is not valid UTF-8, skipping it"
                    );
                    report.skipped += 1;
                }
                Ok(image) => {
                    match self.register(&image.path, image.width, image.height, &image.colors)? {
                        Registration::Inserted(_) => report.registered += 1,
                        Registration::Duplicate => report.duplicates += 1,
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        %error,
                        "cannot open as an image, skipping it"
                    );
                    report.skipped += 1;
                }
            }
        }

        if let Some(ref pm) = progress {
            pm.finish("Pool indexed");
        }
        tracing::info!(
            registered = report.registered,
            duplicates = report.duplicates,
            skipped = report.skipped,
            pool_size = self.len(),
            "pool build finished"
        );

        Ok(report)
    }
}
