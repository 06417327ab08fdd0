//! The Web Mercator (EPSG:3857) tile grid used by MBTiles.
//!
//! Level 0 is a single 256×256 tile covering `±EXTENT` meters on both axes. The grid has
//! [`LEVEL_COUNT`] levels; the deepest one still addresses rows and columns within `u32`.

use crate::{Envelope, MAX_LEVEL, TileMatrixSpec, ZoomLevel};

pub const SRID: i32 = 3857;

/// The unofficial "Google" code that predates EPSG:3857.
pub const SRID_LEGACY: i32 = 900_913;

/// Half the circumference of the WGS84 ellipsoid at the equator, in meters.
pub const EXTENT: f64 = 20_037_508.342_789_244;

pub const TILE_SIZE: u32 = 256;

pub const LEVEL_COUNT: usize = MAX_LEVEL as usize + 1;

/// Maps both Web Mercator codes to 3857 and everything else to `None`.
#[must_use]
pub fn normalize_srid(srid: i32) -> Option<i32> {
	match srid {
		SRID | SRID_LEGACY => Some(SRID),
		_ => None,
	}
}

#[must_use]
pub fn bounds() -> Envelope {
	Envelope::new(-EXTENT, -EXTENT, EXTENT, EXTENT)
}

#[must_use]
pub fn origin() -> (f64, f64) {
	bounds().upper_left()
}

#[must_use]
pub fn level0() -> ZoomLevel {
	ZoomLevel::new(0, 2.0 * EXTENT / f64::from(TILE_SIZE), TILE_SIZE)
}

/// The native zoom levels `0..count`, `count` clamped to [`LEVEL_COUNT`].
#[must_use]
pub fn zoom_levels(count: usize) -> Vec<ZoomLevel> {
	std::iter::successors(Some(level0()), |level| {
		(usize::from(level.level) + 1 < LEVEL_COUNT).then(|| level.next())
	})
	.take(count.min(LEVEL_COUNT))
	.collect()
}

/// A `TileMatrixSpec` of the native grid with the first `count` levels.
#[must_use]
pub fn tile_matrix(name: &str, count: usize) -> TileMatrixSpec {
	TileMatrixSpec::from_levels(name, SRID, origin(), bounds(), zoom_levels(count))
}
