use std::fmt;

/// One level of a tile pyramid.
///
/// `resolution` is informative (nominal ground resolution). Compatibility checks
/// rely on the pixel sizes and tile dimensions only.
#[derive(Clone, Copy, PartialEq)]
pub struct ZoomLevel {
	pub level: u8,
	pub resolution: f64,
	pub pixel_size_x: f64,
	pub pixel_size_y: f64,
	pub tile_width: u32,
	pub tile_height: u32,
}

impl ZoomLevel {
	#[must_use]
	pub fn new(level: u8, pixel_size: f64, tile_size: u32) -> ZoomLevel {
		ZoomLevel {
			level,
			resolution: pixel_size,
			pixel_size_x: pixel_size,
			pixel_size_y: pixel_size,
			tile_width: tile_size,
			tile_height: tile_size,
		}
	}

	/// The next finer level of a quadtree: same tile dimensions, half the pixel size.
	#[must_use]
	pub fn next(&self) -> ZoomLevel {
		ZoomLevel {
			level: self.level + 1,
			resolution: self.resolution / 2.0,
			pixel_size_x: self.pixel_size_x / 2.0,
			pixel_size_y: self.pixel_size_y / 2.0,
			tile_width: self.tile_width,
			tile_height: self.tile_height,
		}
	}

	/// Width of one tile in native units.
	#[must_use]
	pub fn tile_span_x(&self) -> f64 {
		self.pixel_size_x * f64::from(self.tile_width)
	}

	/// Height of one tile in native units.
	#[must_use]
	pub fn tile_span_y(&self) -> f64 {
		self.pixel_size_y * f64::from(self.tile_height)
	}
}

impl fmt::Debug for ZoomLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"ZoomLevel({}, {}x{} px, {}x{})",
			self.level, self.tile_width, self.tile_height, self.pixel_size_x, self.pixel_size_y
		)
	}
}
