//! Tile coordinates in a Web Mercator quadtree.
//!
//! Callers address tiles in XYZ order, where row 0 is the northernmost row. MBTiles files
//! store rows in TMS order, where row 0 is the southernmost one. [`TileCoord::flip_y`] converts
//! between the two and is its own inverse:
//!
//! ```
//! use tessera_core::TileCoord;
//!
//! let coord = TileCoord::new(3, 5, 2).unwrap();
//! let stored = coord.flipped_y();
//! assert_eq!(stored.y, 5); // 2^3 - 1 - 2
//! assert_eq!(stored.flipped_y(), coord);
//! ```

use crate::GeoBBox;
use anyhow::{Result, ensure};
use std::{
	f64::consts::PI,
	fmt::{self, Debug},
};

/// Deepest zoom level whose rows and columns still fit into `u32`.
pub const MAX_LEVEL: u8 = 31;

#[derive(Eq, PartialEq, Clone, Hash, Copy)]
pub struct TileCoord {
	pub level: u8,
	pub x: u32,
	pub y: u32,
}

impl TileCoord {
	/// Create a new `TileCoord`.
	///
	/// # Errors
	/// Returns an error if `level` > 31 or `x`/`y` are outside `0..2^level`.
	pub fn new(level: u8, x: u32, y: u32) -> Result<TileCoord> {
		ensure!(level <= MAX_LEVEL, "level ({level}) must be <= {MAX_LEVEL}");
		let max = TileCoord::grid_size(level);
		ensure!(u64::from(x) < max, "x ({x}) out of bounds for level {level}");
		ensure!(u64::from(y) < max, "y ({y}) out of bounds for level {level}");
		Ok(TileCoord { level, x, y })
	}

	/// Number of columns (and rows) of the quadtree at `level`.
	#[must_use]
	pub fn grid_size(level: u8) -> u64 {
		1u64 << level
	}

	/// Returns `2^level - 1`, the largest valid row or column.
	#[must_use]
	pub fn max_value(&self) -> u32 {
		((1u64 << self.level) - 1) as u32
	}

	/// Flip the row between XYZ and TMS numbering: `y = 2^level - 1 - y`.
	pub fn flip_y(&mut self) {
		self.y = self.max_value() - self.y;
	}

	#[must_use]
	pub fn flipped_y(mut self) -> TileCoord {
		self.flip_y();
		self
	}

	/// Longitude and latitude in degrees of the north-west corner of grid cell (`x`, `y`) at `level`.
	///
	/// `x` and `y` may equal `2^level` to address the far edges of the grid.
	#[must_use]
	pub fn coord_to_geo(level: u8, x: u64, y: u64) -> [f64; 2] {
		let zoom = 2.0f64.powi(i32::from(level));
		[
			(x as f64 / zoom - 0.5) * 360.0,
			((PI * (1.0 - 2.0 * y as f64 / zoom)).exp().atan() / PI - 0.25) * 360.0,
		]
	}

	#[must_use]
	pub fn as_geo(&self) -> [f64; 2] {
		TileCoord::coord_to_geo(self.level, u64::from(self.x), u64::from(self.y))
	}

	/// The geographic footprint of this XYZ tile.
	#[must_use]
	pub fn to_geo_bbox(&self) -> GeoBBox {
		let [west, north] = self.as_geo();
		let [east, south] = TileCoord::coord_to_geo(self.level, u64::from(self.x) + 1, u64::from(self.y) + 1);
		GeoBBox {
			x_min: west,
			y_min: south,
			x_max: east,
			y_max: north,
		}
	}
}

impl Debug for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TileCoord({}, [{}, {}])", self.level, self.x, self.y)
	}
}
