use crate::TileCoord;
use anyhow::{Result, ensure};
use std::fmt;

/// Inclusive rectangle of tile columns and rows at one zoom level.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TileBBox {
	pub level: u8,
	pub x_min: u32,
	pub y_min: u32,
	pub x_max: u32,
	pub y_max: u32,
}

impl TileBBox {
	pub fn new(level: u8, x_min: u32, y_min: u32, x_max: u32, y_max: u32) -> Result<TileBBox> {
		ensure!(x_min <= x_max, "x_min ({x_min}) must be <= x_max ({x_max})");
		ensure!(y_min <= y_max, "y_min ({y_min}) must be <= y_max ({y_max})");
		// validates the level and the upper corner against the grid
		TileCoord::new(level, x_max, y_max)?;
		Ok(TileBBox {
			level,
			x_min,
			y_min,
			x_max,
			y_max,
		})
	}

	#[must_use]
	pub fn width(&self) -> u32 {
		self.x_max - self.x_min + 1
	}

	#[must_use]
	pub fn height(&self) -> u32 {
		self.y_max - self.y_min + 1
	}

	/// The same area at the deeper `level`, covering every descendant tile.
	pub fn scaled_to(&self, level: u8) -> Result<TileBBox> {
		ensure!(
			level >= self.level,
			"cannot scale {self:?} up to the coarser level {level}"
		);
		let shift = u32::from(level - self.level);
		let first = |v: u32| u64::from(v) << shift;
		let last = |v: u32| ((u64::from(v) + 1) << shift) - 1;
		TileBBox::new(
			level,
			u32::try_from(first(self.x_min))?,
			u32::try_from(first(self.y_min))?,
			u32::try_from(last(self.x_max))?,
			u32::try_from(last(self.y_max))?,
		)
	}

	/// Mirror the rows between XYZ and TMS numbering.
	#[must_use]
	pub fn flipped_y(&self) -> TileBBox {
		let max = ((1u64 << self.level) - 1) as u32;
		TileBBox {
			level: self.level,
			x_min: self.x_min,
			y_min: max - self.y_max,
			x_max: self.x_max,
			y_max: max - self.y_min,
		}
	}
}

impl fmt::Debug for TileBBox {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"TileBBox({}, [{}, {}, {}, {}])",
			self.level, self.x_min, self.y_min, self.x_max, self.y_max
		)
	}
}
