//! Persisted catalogue of pool images and their salient colors
//!
//! SQLite holds two record sets, `Images` and `Colors`. The index keeps an
//! in-memory mirror of both so nearest-color queries never touch the database;
//! every mutation is written through to the store before the mirror changes.

use crate::color::{Lab, SalientColor, ab_distance, hex, lab_distance};
use crate::io::error::{MosaicError, Result, invalid_parameter};
use rusqlite::{Connection, params};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS Images (
        id       INTEGER PRIMARY KEY,
        usages   INTEGER NOT NULL DEFAULT 0,
        w        INTEGER NOT NULL,
        h        INTEGER NOT NULL,
        filename TEXT NOT NULL UNIQUE
    );
    CREATE TABLE IF NOT EXISTS Colors (
        id       INTEGER PRIMARY KEY,
        image_id INTEGER NOT NULL REFERENCES Images(id),
        rank     INTEGER NOT NULL,
        L        REAL NOT NULL,
        a        REAL NOT NULL,
        b        REAL NOT NULL,
        red      INTEGER NOT NULL,
        green    INTEGER NOT NULL,
        blue     INTEGER NOT NULL,
        UNIQUE (image_id, rank)
    );
    CREATE INDEX IF NOT EXISTS idx_colors_image_id ON Colors(image_id);
";

/// One ranked salient color of a pool image
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorSample {
    /// 1-based abundance rank
    pub rank: u32,
    /// Perceptual form
    pub lab: Lab,
    /// sRGB form
    pub rgb: [u8; 3],
}

/// A catalogued candidate image
#[derive(Clone, Debug, PartialEq)]
pub struct PoolImage {
    /// Store row id, increasing in insertion order
    pub id: i64,
    /// Unique file path
    pub path: PathBuf,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Number of matches that selected this image since the last reset
    pub usage_count: u32,
    /// Salient colors ordered by rank
    pub colors: Vec<ColorSample>,
}

impl PoolImage {
    /// The most abundant color
    pub fn top_color(&self) -> Option<&ColorSample> {
        self.colors.first()
    }
}

/// Outcome of registering an image path
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    /// A new record was created with this id
    Inserted(i64),
    /// The path was already catalogued; nothing changed
    Duplicate,
}

/// How query colors are compared against pool colors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DistanceMetric {
    /// a*b* plane only; lightness is corrected later by padding
    #[default]
    Chroma,
    /// Full CIE76 distance
    Full,
}

impl DistanceMetric {
    /// Distance between two colors under this metric
    pub fn distance(self, x: Lab, y: Lab) -> f64 {
        match self {
            Self::Chroma => ab_distance(x, y),
            Self::Full => lab_distance(x, y),
        }
    }
}

/// A pool image ranked against a query color
#[derive(Clone, Copy, Debug)]
pub struct Candidate<'a> {
    /// The catalogued image
    pub image: &'a PoolImage,
    /// Its rank-1 color
    pub color: ColorSample,
    /// Distance between the query and `color`
    pub distance: f64,
}

/// The durable image pool
pub struct PoolIndex {
    conn: Connection,
    db_path: PathBuf,
    catalogue: Vec<PoolImage>,
}

impl PoolIndex {
    /// Open (creating if absent) the pool store at `path`
    ///
    /// # Errors
    ///
    /// Returns `Store` if the database cannot be opened, the schema cannot be
    /// created or existing records cannot be read
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let conn = Connection::open(&db_path).map_err(store_error(&db_path, "open"))?;
        Self::from_connection(conn, db_path)
    }

    /// Open a private in-memory store
    ///
    /// # Errors
    ///
    /// Returns `Store` if SQLite cannot create the database
    pub fn open_in_memory() -> Result<Self> {
        let db_path = PathBuf::from(":memory:");
        let conn = Connection::open_in_memory().map_err(store_error(&db_path, "open"))?;
        Self::from_connection(conn, db_path)
    }

    fn from_connection(conn: Connection, db_path: PathBuf) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(store_error(&db_path, "create schema"))?;
        let catalogue = load_catalogue(&conn).map_err(store_error(&db_path, "load catalogue"))?;
        tracing::debug!(
            path = %db_path.display(),
            images = catalogue.len(),
            "opened image pool"
        );
        Ok(Self {
            conn,
            db_path,
            catalogue,
        })
    }

    /// Location of the store
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Catalogued images in insertion order
    pub fn images(&self) -> &[PoolImage] {
        &self.catalogue
    }

    /// Number of catalogued images
    pub fn len(&self) -> usize {
        self.catalogue.len()
    }

    /// Whether the pool has no images
    pub fn is_empty(&self) -> bool {
        self.catalogue.is_empty()
    }

    /// Look up an image by id
    pub fn get(&self, id: i64) -> Option<&PoolImage> {
        self.position(id).and_then(|index| self.catalogue.get(index))
    }

    /// Look up an image by path
    pub fn find(&self, path: &Path) -> Option<&PoolImage> {
        self.catalogue.iter().find(|image| image.path == path)
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.catalogue.binary_search_by_key(&id, |image| image.id).ok()
    }

    /// Register an image and its ranked salient colors
    ///
    /// Registering a path that is already catalogued is a reported no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `colors` is empty
    /// - `path` is not valid UTF-8
    /// - The store rejects the insert for any reason other than a duplicate path
    pub fn register(
        &mut self,
        path: &Path,
        width: u32,
        height: u32,
        colors: &[SalientColor],
    ) -> Result<Registration> {
        if colors.is_empty() {
            return Err(invalid_parameter(
                "colors",
                &path.display(),
                &"an image needs at least one salient color",
            ));
        }

        let Some(filename) = path.to_str() else {
            return Err(invalid_parameter(
                "path",
                &path.display(),
                &"pool paths must be valid UTF-8",
            ));
        };
        let samples = rank_colors(colors);

        let tx = self
            .conn
            .transaction()
            .map_err(store_error(&self.db_path, "begin registration"))?;

        let inserted = tx
            .execute(
                "INSERT OR IGNORE INTO Images (usages, w, h, filename) VALUES (0, ?1, ?2, ?3)",
                params![width, height, filename],
            )
            .map_err(store_error(&self.db_path, "insert image"))?;

        if inserted == 0 {
            tracing::warn!(path = %path.display(), "image is already in the pool, skipping it");
            return Ok(Registration::Duplicate);
        }

        let id = tx.last_insert_rowid();
        for sample in &samples {
            let [red, green, blue] = sample.rgb;
            tx.execute(
                "INSERT INTO Colors (image_id, rank, L, a, b, red, green, blue)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    id,
                    sample.rank,
                    sample.lab.l,
                    sample.lab.a,
                    sample.lab.b,
                    red,
                    green,
                    blue
                ],
            )
            .map_err(store_error(&self.db_path, "insert colors"))?;
        }
        tx.commit()
            .map_err(store_error(&self.db_path, "commit registration"))?;

        self.catalogue.push(PoolImage {
            id,
            path: path.to_path_buf(),
            width,
            height,
            usage_count: 0,
            colors: samples,
        });

        Ok(Registration::Inserted(id))
    }

    /// Set every image's usage count to zero
    ///
    /// # Errors
    ///
    /// Returns `Store` if the update fails
    pub fn reset_usage(&mut self) -> Result<()> {
        self.conn
            .execute("UPDATE Images SET usages = 0", [])
            .map_err(store_error(&self.db_path, "reset usage"))?;
        for image in &mut self.catalogue {
            image.usage_count = 0;
        }
        Ok(())
    }

    /// Record one more selection of image `id`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No image has this id
    /// - The store update fails
    pub fn increment_usage(&mut self, id: i64) -> Result<u32> {
        let position = self.position(id).ok_or(MosaicError::UnknownImage { id })?;

        let updated = self
            .conn
            .execute(
                "UPDATE Images SET usages = usages + 1 WHERE id = ?1",
                params![id],
            )
            .map_err(store_error(&self.db_path, "increment usage"))?;
        if updated == 0 {
            return Err(MosaicError::UnknownImage { id });
        }

        let image = self
            .catalogue
            .get_mut(position)
            .ok_or(MosaicError::UnknownImage { id })?;
        image.usage_count = image.usage_count.saturating_add(1);
        Ok(image.usage_count)
    }

    /// All pool images ordered by ascending distance from `color` to their rank-1 color
    ///
    /// Equal distances keep insertion order.
    pub fn query_nearest(&self, color: Lab, metric: DistanceMetric) -> Vec<Candidate<'_>> {
        let mut candidates: Vec<Candidate<'_>> = self
            .catalogue
            .iter()
            .filter_map(|image| {
                image.top_color().map(|&top| Candidate {
                    image,
                    color: top,
                    distance: metric.distance(color, top.lab),
                })
            })
            .collect();
        candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        candidates
    }

    /// Number of `Images` records in the store
    ///
    /// # Errors
    ///
    /// Returns `Store` if the count query fails
    pub fn record_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM Images", [], |row| row.get(0))
            .map_err(store_error(&self.db_path, "count images"))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Human-readable listing of both record sets
    pub fn dump(&self) -> String {
        let images = self.catalogue.iter().map(|image| {
            format!(
                "  #{} {} {}x{} used {}",
                image.id,
                image.path.display(),
                image.width,
                image.height,
                image.usage_count
            )
        });
        let colors = self.catalogue.iter().flat_map(|image| {
            image.colors.iter().map(move |sample| {
                format!(
                    "  #{} rank {} {} {}",
                    image.id,
                    sample.rank,
                    hex(sample.rgb),
                    sample.lab
                )
            })
        });

        std::iter::once(format!("Images ({}):", self.catalogue.len()))
            .chain(images)
            .chain(std::iter::once("Colors:".to_owned()))
            .chain(colors)
            .map(|line| line + "\n")
            .collect()
    }
}

impl std::fmt::Debug for PoolIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolIndex")
            .field("db_path", &self.db_path)
            .field("images", &self.catalogue.len())
            .finish()
    }
}

/// Assign contiguous 1-based ranks in the given (abundance) order
pub fn rank_colors(colors: &[SalientColor]) -> Vec<ColorSample> {
    colors
        .iter()
        .zip(1u32..)
        .map(|(color, rank)| ColorSample {
            rank,
            lab: color.lab,
            rgb: color.rgb,
        })
        .collect()
}

fn load_catalogue(conn: &Connection) -> rusqlite::Result<Vec<PoolImage>> {
    let mut images_stmt =
        conn.prepare("SELECT id, filename, w, h, usages FROM Images ORDER BY id")?;
    let mut catalogue = images_stmt
        .query_map([], |row| {
            Ok(PoolImage {
                id: row.get(0)?,
                path: PathBuf::from(row.get::<_, String>(1)?),
                width: row.get(2)?,
                height: row.get(3)?,
                usage_count: row.get(4)?,
                colors: Vec::new(),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let positions: HashMap<i64, usize> = catalogue
        .iter()
        .enumerate()
        .map(|(position, image)| (image.id, position))
        .collect();

    let mut colors_stmt = conn.prepare(
        "SELECT image_id, rank, L, a, b, red, green, blue FROM Colors ORDER BY image_id, rank",
    )?;
    let rows = colors_stmt.query_map([], |row| {
        let image_id: i64 = row.get(0)?;
        let sample = ColorSample {
            rank: row.get(1)?,
            lab: Lab::new(row.get(2)?, row.get(3)?, row.get(4)?),
            rgb: [row.get(5)?, row.get(6)?, row.get(7)?],
        };
        Ok((image_id, sample))
    })?;

    for row in rows {
        let (image_id, sample) = row?;
        if let Some(image) = positions
            .get(&image_id)
            .and_then(|&position| catalogue.get_mut(position))
        {
            image.colors.push(sample);
        }
    }

    Ok(catalogue)
}

fn store_error(
    path: &Path,
    operation: &'static str,
) -> impl FnOnce(rusqlite::Error) -> MosaicError {
    let path = path.to_path_buf();
    move |source| MosaicError::Store {
        path,
        operation,
        source,
    }
}
