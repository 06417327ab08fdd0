//! Tile pyramid geometry.
//!
//! [`TileMatrix`] is what consumers ask a tile container for: the SRID, the upper-left origin
//! of level 0, the native bounds and the list of zoom levels. [`TileMatrixSpec`] is the plain
//! value implementation used to request a layout from a container provider.

use crate::{Envelope, Metadata, ZoomLevel};
use anyhow::{Result, ensure};

/// Geometry of a tile pyramid.
pub trait TileMatrix {
	fn name(&self) -> &str;

	fn srid(&self) -> i32;

	/// The zoom levels in ascending order.
	fn zoom_levels(&self) -> &[ZoomLevel];

	/// Upper-left corner of the grid in native coordinates.
	fn origin(&self) -> (f64, f64);

	fn bounds(&self) -> Envelope;

	/// Metadata that should be written when a container is created from this matrix.
	fn tiles_metadata(&self) -> Option<&Metadata> {
		None
	}

	fn zoom_level(&self, level: u8) -> Option<&ZoomLevel> {
		self.zoom_levels().iter().find(|z| z.level == level)
	}
}

/// An immutable tile pyramid description.
#[derive(Clone, Debug, PartialEq)]
pub struct TileMatrixSpec {
	name: String,
	srid: i32,
	origin: (f64, f64),
	bounds: Envelope,
	zoom_levels: Vec<ZoomLevel>,
	metadata: Option<Metadata>,
}

impl TileMatrixSpec {
	/// Create a `TileMatrixSpec` from explicit zoom levels.
	///
	/// # Errors
	/// Fails if the levels do not form a quadtree: consecutive level numbers,
	/// identical tile dimensions and pixel sizes halving from one level to the next.
	pub fn new(name: &str, srid: i32, origin: (f64, f64), bounds: Envelope, zoom_levels: Vec<ZoomLevel>) -> Result<Self> {
		for pair in zoom_levels.windows(2) {
			let (a, b) = (&pair[0], &pair[1]);
			ensure!(
				u16::from(b.level) == u16::from(a.level) + 1,
				"zoom level {} does not follow level {}",
				b.level,
				a.level
			);
			ensure!(
				a.tile_width == b.tile_width && a.tile_height == b.tile_height,
				"tile size changes between level {} and {}",
				a.level,
				b.level
			);
			ensure!(
				is_half(a.pixel_size_x, b.pixel_size_x) && is_half(a.pixel_size_y, b.pixel_size_y),
				"pixel size of level {} is not half of level {}",
				b.level,
				a.level
			);
		}
		Ok(TileMatrixSpec::from_levels(name, srid, origin, bounds, zoom_levels))
	}

	/// Levels that are known to form a quadtree.
	pub(crate) fn from_levels(
		name: &str,
		srid: i32,
		origin: (f64, f64),
		bounds: Envelope,
		zoom_levels: Vec<ZoomLevel>,
	) -> Self {
		TileMatrixSpec {
			name: name.to_string(),
			srid,
			origin,
			bounds,
			zoom_levels,
			metadata: None,
		}
	}

	/// Build `count` quadtree levels starting at `first`.
	pub fn quadtree(
		name: &str,
		srid: i32,
		origin: (f64, f64),
		bounds: Envelope,
		first: ZoomLevel,
		count: usize,
	) -> Result<Self> {
		ensure!(
			usize::from(first.level) + count < 256,
			"{count} levels starting at {} exceed the level range",
			first.level
		);
		let levels = std::iter::successors(Some(first), |level| Some(level.next()))
			.take(count)
			.collect();
		TileMatrixSpec::new(name, srid, origin, bounds, levels)
	}

	#[must_use]
	pub fn with_metadata(mut self, metadata: Metadata) -> Self {
		self.metadata = Some(metadata);
		self
	}

	#[must_use]
	pub fn with_origin(mut self, origin: (f64, f64)) -> Self {
		self.origin = origin;
		self
	}

	#[must_use]
	pub fn with_srid(mut self, srid: i32) -> Self {
		self.srid = srid;
		self
	}
}

fn is_half(coarse: f64, fine: f64) -> bool {
	((coarse / 2.0 - fine) / fine).abs() < 1e-9
}

impl TileMatrix for TileMatrixSpec {
	fn name(&self) -> &str {
		&self.name
	}

	fn srid(&self) -> i32 {
		self.srid
	}

	fn zoom_levels(&self) -> &[ZoomLevel] {
		&self.zoom_levels
	}

	fn origin(&self) -> (f64, f64) {
		self.origin
	}

	fn bounds(&self) -> Envelope {
		self.bounds
	}

	fn tiles_metadata(&self) -> Option<&Metadata> {
		self.metadata.as_ref()
	}
}
