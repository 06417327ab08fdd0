use std::fmt;

/// Axis-aligned rectangle in the native coordinates of a tile matrix (e.g. meters for EPSG:3857).
#[derive(Clone, Copy, PartialEq)]
pub struct Envelope {
	pub min_x: f64,
	pub min_y: f64,
	pub max_x: f64,
	pub max_y: f64,
}

impl Envelope {
	#[must_use]
	pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Envelope {
		Envelope {
			min_x,
			min_y,
			max_x,
			max_y,
		}
	}

	#[must_use]
	pub fn width(&self) -> f64 {
		self.max_x - self.min_x
	}

	#[must_use]
	pub fn height(&self) -> f64 {
		self.max_y - self.min_y
	}

	/// The upper-left corner, which is where tile matrices put their origin.
	#[must_use]
	pub fn upper_left(&self) -> (f64, f64) {
		(self.min_x, self.max_y)
	}
}

impl fmt::Debug for Envelope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Envelope([{}, {}] - [{}, {}])",
			self.min_x, self.min_y, self.max_x, self.max_y
		)
	}
}
