//! Command-line interface for building image pools and rendering mosaics

use crate::algorithm::fitness::FairnessPolicy;
use crate::algorithm::matcher::{MatchConfig, TileMatcher};
use crate::color::{ExtractionConfig, hex, salient_colors};
use crate::io::assembly::{AssemblyConfig, DiskTileSource, assemble, tile_edge_bound};
use crate::io::configuration::{
    DEFAULT_CLUSTERS, DEFAULT_LIGHTNESS_TOLERANCE, DEFAULT_MAX_PADDING, DEFAULT_MERGE_THRESHOLD,
    DEFAULT_PADDING_GAIN, DEFAULT_REUSE_KEEP, DEFAULT_SEED, DEFAULT_THUMBNAIL_SIZE,
    DEFAULT_USAGE_PENALTY, OUTPUT_SUFFIX, POOL_DB_NAME,
};
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::io::image::{load_rgb, save_rgb};
use crate::pool::{PoolBuildConfig, PoolIndex};
use crate::spatial::{
    AdaptiveConfig, MergeCriterion, Partition, partition_adaptive, partition_uniform,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

/// Width and height parsed from `WxH` (or a single number for squares)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl TileSize {
    /// As a (width, height) pair
    pub const fn pair(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl FromStr for TileSize {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|e| format!("invalid dimension '{part}': {e}"))
        };
        let (width, height) = match s.split_once(['x', 'X']) {
            Some((w, h)) => (parse(w)?, parse(h)?),
            None => {
                let side = parse(s)?;
                (side, side)
            }
        };
        if width == 0 || height == 0 {
            return Err(format!("'{s}' has a zero dimension"));
        }
        Ok(Self { width, height })
    }
}

impl std::fmt::Display for TileSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Parser, Debug)]
#[command(name = "photomosaic")]
#[command(
    author,
    version,
    about = "Build photomosaics from a pool of candidate images"
)]
/// Command-line arguments for the mosaic tool
pub struct Cli {
    /// Operation to perform
    #[command(subcommand)]
    pub command: Command,

    /// Suppress progress output and informational logs
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Subcommands of the mosaic tool
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Catalogue every image under a directory
    Build {
        /// Directory of candidate images
        #[arg(value_name = "DIR")]
        directory: PathBuf,

        /// Pool store (defaults to imagepool.db inside DIR)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Salient colors stored per image
        #[arg(short, long, default_value_t = DEFAULT_CLUSTERS)]
        clusters: usize,

        /// Long-edge bound images are downsampled to before clustering
        #[arg(long, default_value_t = DEFAULT_THUMBNAIL_SIZE)]
        size: u32,
    },

    /// Set every usage counter in a pool to zero
    Reset {
        /// Pool store
        #[arg(value_name = "DB")]
        db: PathBuf,
    },

    /// Print the images and colors of a pool
    Dump {
        /// Pool store
        #[arg(value_name = "DB")]
        db: PathBuf,
    },

    /// Print the salient colors of one image
    Colors {
        /// Image to analyse
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Number of colors
        #[arg(short, long, default_value_t = DEFAULT_CLUSTERS)]
        clusters: usize,
    },

    /// Render a mosaic of a target image from a pool
    Render(RenderArgs),
}

/// Arguments of the `render` subcommand
#[derive(clap::Args, Debug)]
// Independent on/off switches of one command
#[allow(clippy::struct_excessive_bools)]
pub struct RenderArgs {
    /// Target image
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Pool store
    #[arg(long)]
    pub db: PathBuf,

    /// Region size for the uniform grid, or cell size with --adaptive
    #[arg(short, long, default_value = "32x32")]
    pub tile: TileSize,

    /// Merge flat neighbourhoods into larger regions
    #[arg(short, long)]
    pub adaptive: bool,

    /// Merge threshold for --adaptive
    #[arg(long, default_value_t = DEFAULT_MERGE_THRESHOLD)]
    pub threshold: f64,

    /// Merge on internal color variation instead of chroma distance
    #[arg(long, requires = "adaptive")]
    pub variation: bool,

    /// Random seed for reproducible output
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// How much brighter than its region a tile may be (L* units)
    #[arg(long, default_value_t = DEFAULT_LIGHTNESS_TOLERANCE)]
    pub tolerance: f64,

    /// Score penalty per prior use of an image
    #[arg(long, default_value_t = DEFAULT_USAGE_PENALTY)]
    pub penalty: f64,

    /// Per-use probability that a reused image survives the reuse draw
    #[arg(long, default_value_t = DEFAULT_REUSE_KEEP)]
    pub keep: f64,

    /// Center padded tiles instead of placing them randomly
    #[arg(long)]
    pub no_jitter: bool,

    /// Continue from the pool's current usage counters
    #[arg(long)]
    pub keep_usage: bool,

    /// Output path (defaults to <TARGET>_mosaic.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RenderArgs {
    /// Matching parameters selected by these arguments
    pub const fn match_config(&self) -> MatchConfig {
        MatchConfig {
            lightness_tolerance: self.tolerance,
            fairness: FairnessPolicy {
                usage_penalty: self.penalty,
                reuse_keep: self.keep,
            },
            padding_gain: DEFAULT_PADDING_GAIN,
            max_padding: DEFAULT_MAX_PADDING,
            jitter: !self.no_jitter,
            seed: self.seed,
        }
    }

    /// Where the mosaic is written
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| output_path_for(&self.target))
    }
}

/// Default mosaic path next to `target`: `<stem>_mosaic.<ext>`
pub fn output_path_for(target: &Path) -> PathBuf {
    let stem = target.file_stem().unwrap_or_default();
    let extension = target
        .extension()
        .filter(|ext| !ext.is_empty())
        .map_or_else(|| "png".into(), |ext| ext.to_string_lossy());
    let output_name = format!("{}{OUTPUT_SUFFIX}.{extension}", stem.to_string_lossy());

    match target.parent() {
        Some(parent) => parent.join(output_name),
        None => PathBuf::from(output_name),
    }
}

/// Executes a parsed command line
pub struct CommandRunner {
    cli: Cli,
}

impl CommandRunner {
    /// Create a runner for the given arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the selected subcommand
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the subcommand
    pub fn run(&self) -> Result<()> {
        match &self.cli.command {
            Command::Build {
                directory,
                db,
                clusters,
                size,
            } => self.build(directory, db.as_deref(), *clusters, *size),
            Command::Reset { db } => Self::reset(db),
            Command::Dump { db } => Self::dump(db),
            Command::Colors { image, clusters } => Self::colors(image, *clusters),
            Command::Render(args) => Self::render(args),
        }
    }

    fn build(&self, directory: &Path, db: Option<&Path>, clusters: usize, size: u32) -> Result<()> {
        if !directory.is_dir() {
            return Err(invalid_parameter(
                "directory",
                &directory.display(),
                &"must be an existing directory",
            ));
        }
        let db_path = db.map_or_else(|| directory.join(POOL_DB_NAME), Path::to_path_buf);
        let mut index = PoolIndex::open(&db_path)?;

        let config = PoolBuildConfig {
            extraction: ExtractionConfig {
                clusters,
                thumbnail_size: size,
                ..ExtractionConfig::default()
            },
            show_progress: !self.cli.quiet,
        };
        index.build(directory, &config)?;
        Ok(())
    }

    fn reset(db: &Path) -> Result<()> {
        let mut index = open_existing(db)?;
        index.reset_usage()?;
        tracing::info!(images = index.len(), "reset usage counters");
        Ok(())
    }

    // Allow print for the requested listing
    #[allow(clippy::print_stdout)]
    fn dump(db: &Path) -> Result<()> {
        let index = open_existing(db)?;
        print!("{}", index.dump());
        Ok(())
    }

    // Allow print for the requested listing
    #[allow(clippy::print_stdout)]
    fn colors(image: &Path, clusters: usize) -> Result<()> {
        let decoded = load_rgb(image)?;
        let config = ExtractionConfig {
            clusters,
            ..ExtractionConfig::default()
        };
        for (rank, color) in salient_colors(&decoded, &config)?.iter().enumerate() {
            println!(
                "{} {} {} ({} px)",
                rank + 1,
                hex(color.rgb),
                color.lab,
                color.population
            );
        }
        Ok(())
    }

    fn render(args: &RenderArgs) -> Result<()> {
        let start_time = Instant::now();
        let mut index = open_existing(&args.db)?;
        if index.is_empty() {
            return Err(MosaicError::EmptyPool);
        }
        if !args.keep_usage {
            index.reset_usage()?;
        }

        let target = load_rgb(&args.target)?;
        let partition = Self::partition(&target, args)?;

        let mut matcher = TileMatcher::new(args.match_config())?;
        let matches = matcher.match_all(&partition, &mut index)?;

        let mut tiles = DiskTileSource::covering(tile_edge_bound(&partition));
        let mosaic = assemble(&partition, &matches, &mut tiles, &AssemblyConfig::default())?;

        let output_path = args.output_path();
        save_rgb(&mosaic, &output_path)?;
        tracing::info!(
            output = %output_path.display(),
            regions = partition.len(),
            elapsed_ms = start_time.elapsed().as_millis(),
            "rendered mosaic"
        );
        Ok(())
    }

    fn partition(target: &image::RgbImage, args: &RenderArgs) -> Result<Partition> {
        if args.adaptive {
            let mut config = AdaptiveConfig::with_cell_size(args.tile.pair());
            config.criterion = if args.variation {
                MergeCriterion::Variation {
                    threshold: args.threshold,
                }
            } else {
                MergeCriterion::Chroma {
                    threshold: args.threshold,
                }
            };
            partition_adaptive(target, &config)
        } else {
            partition_uniform(target, args.tile.pair(), &ExtractionConfig::for_regions())
        }
    }
}

fn open_existing(db: &Path) -> Result<PoolIndex> {
    if !db.is_file() {
        return Err(invalid_parameter(
            "db",
            &db.display(),
            &"pool store does not exist; run `build` first",
        ));
    }
    PoolIndex::open(db)
}
