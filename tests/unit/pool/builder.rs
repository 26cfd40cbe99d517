//! Tests for building a pool from a directory tree

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use photomosaic::MosaicError;
    use photomosaic::color::ExtractionConfig;
    use photomosaic::pool::builder::{analyze_file, collect_candidates};
    use photomosaic::pool::{BuildReport, PoolBuildConfig, PoolIndex};
    use std::fs;
    use std::path::Path;

    fn write_png(path: &Path, color: [u8; 3]) {
        RgbImage::from_pixel(12, 8, Rgb(color))
            .save(path)
            .unwrap_or_else(|e| panic!("cannot write {}: {e}", path.display()));
    }

    fn quiet_config() -> PoolBuildConfig {
        PoolBuildConfig {
            extraction: ExtractionConfig::default(),
            show_progress: false,
        }
    }

    // Tests that decodable files are registered and others skipped
    // Verified by propagating decode errors instead of skipping
    #[test]
    fn test_build_registers_and_skips() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        write_png(&dir.path().join("red.png"), [220, 20, 20]);
        fs::create_dir(dir.path().join("nested")).unwrap_or_else(|e| panic!("{e}"));
        write_png(&dir.path().join("nested").join("blue.png"), [20, 20, 220]);
        fs::write(dir.path().join("notes.txt"), "not an image").unwrap_or_else(|e| panic!("{e}"));

        let mut pool = PoolIndex::open(dir.path().join("imagepool.db"))
            .unwrap_or_else(|e| panic!("{e}"));
        let report = pool
            .build(dir.path(), &quiet_config())
            .unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(
            report,
            BuildReport {
                registered: 2,
                duplicates: 0,
                skipped: 1,
            }
        );
        assert_eq!(pool.len(), 2);
        assert!(pool.images().iter().all(|image| image.colors.len() == 4));
        assert_eq!(
            pool.images().first().map(|image| image.colors.first().map(|c| c.rgb)),
            Some(Some([20, 20, 220]))
        );
    }

    // Tests that rebuilding the same directory only reports duplicates
    // Verified by counting duplicates as registrations
    #[test]
    fn test_rebuild_reports_duplicates() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        write_png(&dir.path().join("a.png"), [1, 2, 3]);
        write_png(&dir.path().join("b.png"), [200, 100, 50]);

        let mut pool = PoolIndex::open_in_memory().unwrap_or_else(|e| panic!("{e}"));
        let first = pool.build(dir.path(), &quiet_config()).unwrap_or_else(|e| panic!("{e}"));
        let second = pool.build(dir.path(), &quiet_config()).unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(first.registered, 2);
        assert_eq!(second.registered, 0);
        assert_eq!(second.duplicates, 2);
        assert_eq!(pool.record_count().ok(), Some(2));
    }

    // Tests that enumeration is sorted and leaves out exactly the store and its side files
    // Verified by removing the store-name filter
    #[test]
    fn test_collect_candidates_excludes_store() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        for name in [
            "c.png",
            "a.png",
            "imagepool.db",
            "imagepool.db-journal",
            "imagepool.db-wal",
            "imagepool.db_cover.png",
        ] {
            fs::write(dir.path().join(name), b"x").unwrap_or_else(|e| panic!("{e}"));
        }

        let store = dir.path().join("imagepool.db");
        let files = collect_candidates(dir.path(), Some(&store)).unwrap_or_else(|e| panic!("{e}"));
        let names: Vec<String> = files
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.png", "c.png", "imagepool.db_cover.png"]);

        let everything = collect_candidates(dir.path(), None).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(everything.len(), 6);
    }

    // Tests that a missing pool directory is fatal
    // Verified by returning an empty list for missing directories
    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let missing = dir.path().join("absent");

        assert!(matches!(
            collect_candidates(&missing, None),
            Err(MosaicError::FileSystem { .. })
        ));

        let mut pool = PoolIndex::open_in_memory().unwrap_or_else(|e| panic!("{e}"));
        assert!(pool.build(&missing, &quiet_config()).is_err());
    }

    // Tests that analysis records dimensions and ranked colors of one file
    // Verified by swapping width and height
    #[test]
    fn test_analyze_file() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("green.png");
        write_png(&path, [30, 180, 60]);

        let analyzed =
            analyze_file(&path, &ExtractionConfig::default()).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!((analyzed.width, analyzed.height), (12, 8));
        assert_eq!(analyzed.colors.len(), 4);
        assert_eq!(analyzed.colors.first().map(|c| c.rgb), Some([30, 180, 60]));

        let text = dir.path().join("plain.txt");
        fs::write(&text, "hello").unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            analyze_file(&text, &ExtractionConfig::default()),
            Err(MosaicError::ImageLoad { .. })
        ));
    }
}
