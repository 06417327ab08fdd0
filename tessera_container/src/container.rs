//! An MBTiles file as a random-access tile container.
//!
//! Callers address tiles in XYZ row order; the container flips rows to the TMS order of the
//! file exactly once per read and once per write. The physical layout is detected once when
//! the container is opened (see [`SchemaKind`]).
//!
//! Writes go either straight to the schema or, when [`ContainerConfig::tile_write_buffer`] is
//! set, to a background writer that batches them into transactions. Every successful write
//! grows the session's bounds; [`MBTilesContainer::dispose`] merges them with the extent found
//! at open time and persists `bounds`, `minzoom` and `maxzoom`. A container that receives no
//! tiles leaves its metadata untouched.
//!
//! ## Usage
//! ```rust,no_run
//! use tessera_container::*;
//! use tessera_core::TileCoord;
//! use anyhow::Result;
//! use std::path::Path;
//!
//! fn main() -> Result<()> {
//!     let config = ContainerConfig::default();
//!     let path = Path::new("/absolute/path/to/world.mbtiles");
//!
//!     let container = MBTilesContainer::create(None, path, None, &config)?;
//!     container.set_tile(&TileCoord::new(1, 0, 1)?, b"tile", None)?;
//!     container.dispose()?;
//!
//!     let container = MBTilesContainer::open(path, None, true, &config).expect("readable tileset");
//!     assert!(container.get_tile_data(&TileCoord::new(1, 0, 1)?, None).is_some());
//!     Ok(())
//! }
//! ```

use crate::{
	ContainerConfig, ContainerError, SchemaKind, TileContainer, TilesetInfo,
	bounds::BoundsAccumulator,
	compat::is_compatible,
	metadata::{StoredExtent, derive_content, read_metadata, set_metadata, translate_content_hint},
	writer::TileWriter,
};
use anyhow::{Result, anyhow, ensure};
use parking_lot::Mutex;
use r2d2::Pool;
use r2d2_sqlite::{
	SqliteConnectionManager,
	rusqlite::{OpenFlags, OptionalExtension, params},
};
use std::{
	fs::{self, File},
	io::Read,
	path::{Path, PathBuf},
};
use tessera_core::{Blob, Envelope, Metadata, MetadataValue, TileCoord, TileMatrix, ZoomLevel, web_mercator};
use tessera_derive::context;
use tessera_image::{DynamicImage, decode_tile, encode_tile};

const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";
const QUERY_TILE: &str = "SELECT tile_data FROM tiles WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3 LIMIT 1";

/// State that changes while tiles are written.
struct Session {
	/// Seeded with the extent recorded in the file when it was opened.
	bounds: BoundsAccumulator,
	/// Metadata as read at open (or written at create), with derived values.
	metadata: Metadata,
	/// Only freshly created containers accept initialization metadata, and only until the first tile.
	accepts_initial_metadata: bool,
}

/// A read-only or writable MBTiles container.
pub struct MBTilesContainer {
	name: String,
	path: PathBuf,
	zoom_levels: Vec<ZoomLevel>,
	read_only: bool,
	pool: Pool<SqliteConnectionManager>,
	schema: SchemaKind,
	session: Mutex<Session>,
	writer: Option<TileWriter>,
	disposed: bool,
}

impl MBTilesContainer {
	/// Create a fresh container at `path`, replacing any file that is already there.
	///
	/// The name defaults to the name of `spec` and then to the file name. Metadata attached to
	/// the tile matrix ([`TileMatrix::tiles_metadata`]) initializes the `metadata` table.
	///
	/// # Errors
	/// [`ContainerError::UnsupportedSrid`] or [`ContainerError::IncompatibleSpec`] if `spec`
	/// cannot be stored, or any I/O and SQLite error.
	#[context("creating MBTiles container at '{}'", path.display())]
	pub fn create(
		name: Option<&str>,
		path: &Path,
		spec: Option<&dyn TileMatrix>,
		config: &ContainerConfig,
	) -> Result<MBTilesContainer> {
		log::debug!("create {path:?}");
		if let Some(spec) = spec {
			ensure!(
				web_mercator::normalize_srid(spec.srid()).is_some(),
				ContainerError::UnsupportedSrid(spec.srid())
			);
		}
		ensure!(is_compatible(spec), ContainerError::IncompatibleSpec);

		if path.exists() {
			fs::remove_file(path)?;
		}

		let pool = connect(path, false, config)?;
		let (schema, metadata) = {
			let conn = pool.get()?;
			let initial = spec.and_then(|s| s.tiles_metadata());
			config.default_schema.create_tables(&conn, initial)?;
			if config.default_schema != SchemaKind::Flat {
				SchemaKind::Flat.create_tables(&conn, initial)?;
			}
			let schema = SchemaKind::detect(&conn)?;
			let mut metadata = read_metadata(&conn)?;
			derive_content(&mut metadata);
			(schema, metadata)
		};

		let name = name
			.map(str::to_string)
			.or_else(|| spec.map(|s| s.name().to_string()))
			.unwrap_or_else(|| file_name(path));

		MBTilesContainer::new(
			name,
			path,
			web_mercator::LEVEL_COUNT,
			false,
			pool,
			schema,
			Session {
				bounds: BoundsAccumulator::default(),
				metadata,
				accepts_initial_metadata: true,
			},
			config,
		)
	}

	/// Open an existing container. Returns `None` if the file is missing, is not an MBTiles
	/// database or does not fit `spec`; the reason is logged.
	pub fn open(
		path: &Path,
		spec: Option<&dyn TileMatrix>,
		read_only: bool,
		config: &ContainerConfig,
	) -> Option<MBTilesContainer> {
		match MBTilesContainer::try_open(path, spec, read_only, config) {
			Ok(container) => Some(container),
			Err(err) => {
				log::warn!("{err:#}");
				None
			}
		}
	}

	/// Like [`MBTilesContainer::open`], but reports why the file cannot be opened.
	///
	/// # Errors
	/// Fails if the file does not exist, is not an MBTiles database, has an unsupported SRID
	/// or does not fit `spec`.
	#[context("opening MBTiles container at '{}'", path.display())]
	pub fn try_open(
		path: &Path,
		spec: Option<&dyn TileMatrix>,
		read_only: bool,
		config: &ContainerConfig,
	) -> Result<MBTilesContainer> {
		log::debug!("open {path:?} (read-only: {read_only})");
		ensure!(path.is_file(), "file {path:?} does not exist");
		ensure!(is_sqlite_file(path)?, "file {path:?} is not a SQLite database");

		let pool = connect(path, read_only, config)?;
		let (info, schema, session) = {
			let conn = pool.get()?;
			let info = TilesetInfo::probe(&conn)?.ok_or_else(|| anyhow!("no MBTiles tileset found"))?;
			if let Some(spec) = spec {
				ensure!(
					web_mercator::normalize_srid(spec.srid()) == Some(info.srid),
					ContainerError::UnsupportedSrid(spec.srid())
				);
				ensure!(is_compatible(Some(spec)), ContainerError::IncompatibleSpec);
			}

			let schema = SchemaKind::detect(&conn)?;
			let mut metadata = read_metadata(&conn)?;
			derive_content(&mut metadata);
			let initial = StoredExtent::load(&conn, &metadata)?;
			let session = Session {
				bounds: BoundsAccumulator::from_extent(initial),
				metadata,
				accepts_initial_metadata: false,
			};
			(info, schema, session)
		};

		let level_count = if read_only {
			info.max_level.map_or(0, |level| usize::from(level) + 1)
		} else {
			web_mercator::LEVEL_COUNT
		};
		let name = info.name.clone().unwrap_or_else(|| file_name(path));

		MBTilesContainer::new(name, path, level_count, read_only, pool, schema, session, config)
	}

	#[allow(clippy::too_many_arguments)]
	fn new(
		name: String,
		path: &Path,
		level_count: usize,
		read_only: bool,
		pool: Pool<SqliteConnectionManager>,
		schema: SchemaKind,
		session: Session,
		config: &ContainerConfig,
	) -> Result<MBTilesContainer> {
		let writer = if !read_only && config.is_buffered() {
			Some(TileWriter::spawn(pool.clone(), schema, config.tile_write_buffer)?)
		} else {
			None
		};
		log::debug!(
			"opened '{name}' with schema '{}', {level_count} levels",
			schema.name()
		);

		Ok(MBTilesContainer {
			name,
			path: path.to_path_buf(),
			zoom_levels: web_mercator::zoom_levels(level_count),
			read_only,
			pool,
			schema,
			session: Mutex::new(session),
			writer,
			disposed: false,
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn schema(&self) -> SchemaKind {
		self.schema
	}

	/// Read one tile. `Ok(None)` if the tile does not exist.
	#[context("reading tile {coord:?}")]
	pub fn read_tile_data(&self, coord: &TileCoord) -> Result<Option<Blob>> {
		let stored = coord.flipped_y();
		let conn = self.pool.get()?;
		let data = conn
			.prepare_cached(QUERY_TILE)?
			.query_row(params![stored.level, stored.x, stored.y], |row| row.get::<_, Vec<u8>>(0))
			.optional()?;
		Ok(data.map(Blob::from))
	}

	/// Write metadata while the container is still being initialized: after [`create`](Self::create)
	/// and before the first tile. A `content` hint without `format` is translated into a format.
	///
	/// # Errors
	/// [`ContainerError::InitializationClosed`] at any other time.
	#[context("setting initial metadata")]
	pub fn set_initial_metadata(&self, values: &Metadata) -> Result<()> {
		let mut session = self.session.lock();
		ensure!(session.accepts_initial_metadata, ContainerError::InitializationClosed);

		let mut values = values.clone();
		translate_content_hint(&mut values);
		let conn = self.pool.get()?;
		for (name, value) in &values {
			set_metadata(&conn, name, value)?;
		}
		session.metadata = read_metadata(&conn)?;
		derive_content(&mut session.metadata);
		Ok(())
	}

	/// Flush buffered writes, persist the bounds of this session and close the file.
	///
	/// # Errors
	/// Returns the first error of the background writer or any error while updating metadata.
	pub fn dispose(mut self) -> Result<()> {
		self.finish()
	}

	#[context("disposing MBTiles container '{}'", self.name)]
	fn finish(&mut self) -> Result<()> {
		if self.disposed {
			return Ok(());
		}
		self.disposed = true;
		log::debug!("dispose {:?}", self.path);

		let flushed = match self.writer.take() {
			Some(writer) => writer.shutdown(),
			None => Ok(()),
		};

		let conn = self.pool.get()?;
		SchemaKind::release_statements(&conn);
		if !self.read_only {
			let session = self.session.lock();
			if let Some(extent) = session.bounds.finalize() {
				persist_extent(&conn, &extent)?;
			}
		}
		flushed
	}
}

impl Drop for MBTilesContainer {
	fn drop(&mut self) {
		if let Err(err) = self.finish() {
			log::error!("{err:#}");
		}
	}
}

impl TileMatrix for MBTilesContainer {
	fn name(&self) -> &str {
		&self.name
	}

	fn srid(&self) -> i32 {
		web_mercator::SRID
	}

	fn zoom_levels(&self) -> &[ZoomLevel] {
		&self.zoom_levels
	}

	fn origin(&self) -> (f64, f64) {
		web_mercator::origin()
	}

	fn bounds(&self) -> Envelope {
		web_mercator::bounds()
	}
}

impl TileContainer for MBTilesContainer {
	fn is_read_only(&self) -> bool {
		self.read_only
	}

	fn get_tile_data(&self, coord: &TileCoord, error: Option<&mut Option<anyhow::Error>>) -> Option<Blob> {
		match self.read_tile_data(coord) {
			Ok(data) => data,
			Err(err) => {
				if let Some(error) = error {
					*error = Some(err);
				}
				None
			}
		}
	}

	fn get_tile(&self, coord: &TileCoord, error: Option<&mut Option<anyhow::Error>>) -> Option<DynamicImage> {
		let mut captured = None;
		let image = match self.get_tile_data(coord, Some(&mut captured)).map(|blob| decode_tile(&blob)) {
			Some(Ok(image)) => Some(image),
			Some(Err(err)) => {
				captured = Some(err);
				None
			}
			None => None,
		};
		if let (Some(error), Some(err)) = (error, captured) {
			*error = Some(err);
		}
		image
	}

	fn set_tile(&self, coord: &TileCoord, data: &[u8], _expiration: Option<i64>) -> Result<()> {
		if self.read_only {
			return Err(ContainerError::ReadOnly.into());
		}
		self.session.lock().accepts_initial_metadata = false;

		let stored = coord.flipped_y();
		match &self.writer {
			Some(writer) => writer.submit(stored, Blob::from(data))?,
			None => {
				let conn = self.pool.get()?;
				self.schema.set_tile(&conn, &stored, data)?;
			}
		}

		self.session.lock().bounds.add(coord);
		Ok(())
	}

	fn set_tile_image(&self, coord: &TileCoord, image: &DynamicImage, expiration: Option<i64>) -> Result<()> {
		if self.read_only {
			return Err(ContainerError::ReadOnly.into());
		}
		let blob = encode_tile(image).map_err(|err| ContainerError::TileEncode(format!("{err:#}")))?;
		self.set_tile(coord, blob.as_slice(), expiration)
	}

	fn metadata(&self) -> Metadata {
		self.session.lock().metadata.clone()
	}

	fn dispose(self: Box<Self>) -> Result<()> {
		MBTilesContainer::dispose(*self)
	}
}

fn connect(path: &Path, read_only: bool, config: &ContainerConfig) -> Result<Pool<SqliteConnectionManager>> {
	let mut manager = SqliteConnectionManager::file(path);
	if read_only {
		manager = manager
			.with_flags(OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI);
	}
	let pool = Pool::builder()
		.max_size(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connection_timeout(config.connection_timeout)
		.build(manager)?;
	Ok(pool)
}

fn is_sqlite_file(path: &Path) -> Result<bool> {
	let mut header = [0u8; 16];
	let mut file = File::open(path)?;
	Ok(file.read_exact(&mut header).is_ok() && &header == SQLITE_HEADER)
}

pub(crate) fn file_name(path: &Path) -> String {
	path
		.file_name()
		.map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy())
		.into_owned()
}

fn persist_extent(conn: &r2d2_sqlite::rusqlite::Connection, extent: &StoredExtent) -> Result<()> {
	if let Some(bbox) = extent.bbox {
		set_metadata(conn, "bounds", &MetadataValue::from(bbox.as_string_list()))?;
	}
	if let Some(zoom) = extent.min_zoom {
		set_metadata(conn, "minzoom", &MetadataValue::from(zoom.to_string()))?;
	}
	if let Some(zoom) = extent.max_zoom {
		set_metadata(conn, "maxzoom", &MetadataValue::from(zoom.to_string()))?;
	}
	log::debug!("persisted extent {extent:?}");
	Ok(())
}
