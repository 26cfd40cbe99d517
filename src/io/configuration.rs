//! Engine constants and runtime configuration defaults

// Salient color extraction
/// Number of salient colors stored per pool image
pub const DEFAULT_CLUSTERS: usize = 4;
/// Long-edge bound (pixels) images are downsampled to before clustering
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 100;
/// Number of clusters used when deriving a target region's color
pub const DEFAULT_REGION_CLUSTERS: usize = 3;
/// Upper bound on Lloyd iterations per k-means run
pub const KMEANS_MAX_ITERATIONS: usize = 20;
// Squared RGB distance under which a centroid counts as settled
/// Convergence tolerance for k-means centroid movement
pub const KMEANS_CONVERGENCE: f64 = 0.25;

// Matching
/// How much brighter than its region a candidate may be (L* units)
pub const DEFAULT_LIGHTNESS_TOLERANCE: f64 = 10.0;
/// Additive score penalty per prior use of a candidate
pub const DEFAULT_USAGE_PENALTY: f64 = 2.0;
/// Probability per prior use that a candidate survives the reuse draw
pub const DEFAULT_REUSE_KEEP: f64 = 0.5;
/// Padding fraction per 100 L* of lightness gap
pub const DEFAULT_PADDING_GAIN: f64 = 1.5;
// Keeps padded tiles recognisable
/// Largest fraction of a region that may be given over to padding
pub const DEFAULT_MAX_PADDING: f64 = 0.4;
/// Fixed seed for reproducible matching
pub const DEFAULT_SEED: u64 = 42;

// Adaptive partitioning
/// Chroma distance under which neighbouring cells are merged
pub const DEFAULT_MERGE_THRESHOLD: f64 = 6.0;
/// Maximum number of cells a merged region may span along either axis
pub const DEFAULT_MAX_SPAN: usize = 4;

// Assembly and output
/// Padding color drawn around lightened tiles
pub const DEFAULT_PADDING_COLOR: [u8; 3] = [255, 255, 255];
/// Suffix added to rendered mosaic filenames
pub const OUTPUT_SUFFIX: &str = "_mosaic";
/// File name of the pool store created inside the pool directory
pub const POOL_DB_NAME: &str = "imagepool.db";
/// Suffixes SQLite appends to the store name for its side files
pub const STORE_SIDE_FILE_SUFFIXES: [&str; 3] = ["-journal", "-wal", "-shm"];
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;
