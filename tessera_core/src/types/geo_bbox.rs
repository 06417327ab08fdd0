use anyhow::{Result, ensure};
use itertools::Itertools;
use std::fmt::Debug;
use tessera_derive::context;

/// A geographic bounding box in WGS84 degrees, stored as `west, south, east, north`.
///
/// This is the shape of the `bounds` metadata value of a tile container.
///
/// ```
/// use tessera_core::GeoBBox;
///
/// let mut bbox = GeoBBox::new(-10.0, -5.0, 10.0, 5.0).unwrap();
/// bbox.extend(&GeoBBox::new(-12.0, -3.0, 8.0, 6.0).unwrap());
/// assert_eq!(bbox.as_array(), [-12.0, -5.0, 10.0, 6.0]);
/// ```
#[derive(Clone, Copy, PartialEq)]
pub struct GeoBBox {
	pub x_min: f64,
	pub y_min: f64,
	pub x_max: f64,
	pub y_max: f64,
}

impl GeoBBox {
	/// Creates a new `GeoBBox` from `west, south, east, north`, rejecting
	/// values outside the WGS84 domain and inverted ranges.
	pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Result<GeoBBox> {
		GeoBBox {
			x_min,
			y_min,
			x_max,
			y_max,
		}
		.checked()
	}

	/// Parses a comma separated `west,south,east,north` list as stored in metadata.
	///
	/// Whitespace around the numbers is ignored.
	#[context("parsing bounds '{text}'")]
	pub fn parse_list(text: &str) -> Result<GeoBBox> {
		let values = text
			.split(',')
			.map(|part| part.trim().parse::<f64>())
			.collect::<Result<Vec<f64>, _>>()?;
		GeoBBox::try_from(values)
	}

	#[must_use]
	pub fn as_array(&self) -> [f64; 4] {
		[self.x_min, self.y_min, self.x_max, self.y_max]
	}

	/// Formats the box as `west,south,east,north` with six decimals each.
	#[must_use]
	pub fn as_string_list(&self) -> String {
		self.as_array().iter().map(|v| format!("{v:.6}")).join(",")
	}

	/// Grows this box in place so that it also covers `other`.
	pub fn extend(&mut self, other: &GeoBBox) {
		self.x_min = self.x_min.min(other.x_min);
		self.y_min = self.y_min.min(other.y_min);
		self.x_max = self.x_max.max(other.x_max);
		self.y_max = self.y_max.max(other.y_max);
	}

	#[must_use]
	pub fn extended(mut self, other: &GeoBBox) -> GeoBBox {
		self.extend(other);
		self
	}

	/// Whether `other` lies completely inside this box.
	#[must_use]
	pub fn contains(&self, other: &GeoBBox) -> bool {
		self.x_min <= other.x_min && self.y_min <= other.y_min && self.x_max >= other.x_max && self.y_max >= other.y_max
	}

	fn checked(self) -> Result<Self> {
		ensure!(self.x_min >= -180., "x_min ({}) must be >= -180", self.x_min);
		ensure!(self.y_min >= -90., "y_min ({}) must be >= -90", self.y_min);
		ensure!(self.x_max <= 180., "x_max ({}) must be <= 180", self.x_max);
		ensure!(self.y_max <= 90., "y_max ({}) must be <= 90", self.y_max);
		ensure!(
			self.x_min <= self.x_max,
			"x_min ({}) must be <= x_max ({})",
			self.x_min,
			self.x_max
		);
		ensure!(
			self.y_min <= self.y_max,
			"y_min ({}) must be <= y_max ({})",
			self.y_min,
			self.y_max
		);
		Ok(self)
	}
}

impl Debug for GeoBBox {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "GeoBBox({}, {}, {}, {})", self.x_min, self.y_min, self.x_max, self.y_max)
	}
}

impl TryFrom<Vec<f64>> for GeoBBox {
	type Error = anyhow::Error;

	#[context("converting {input:?} to GeoBBox")]
	fn try_from(input: Vec<f64>) -> Result<Self> {
		ensure!(input.len() == 4, "bounds need exactly 4 values, got {}", input.len());
		GeoBBox::new(input[0], input[1], input[2], input[3])
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn extend_and_extended() {
		let a = GeoBBox::new(-10.0, -5.0, 10.0, 5.0).unwrap();
		let b = GeoBBox::new(-8.0, -7.0, 12.0, 4.0).unwrap();
		let c = a.extended(&b);
		assert_eq!(c.as_array(), [-10.0, -7.0, 12.0, 5.0]);
		assert_eq!(a.as_array(), [-10.0, -5.0, 10.0, 5.0]);
		assert!(c.contains(&a));
		assert!(c.contains(&b));
		assert!(!a.contains(&c));
	}

	#[test]
	fn string_list_has_six_decimals() {
		let bbox = GeoBBox::new(-180.0, -85.0511287798, 180.0, 85.0511287798).unwrap();
		assert_eq!(bbox.as_string_list(), "-180.000000,-85.051129,180.000000,85.051129");
	}

	#[rstest]
	#[case("1,2,3,4", [1.0, 2.0, 3.0, 4.0])]
	#[case(" -10.5 , -5 , 10.25, 5 ", [-10.5, -5.0, 10.25, 5.0])]
	fn parse_list_ok(#[case] text: &str, #[case] expected: [f64; 4]) {
		assert_eq!(GeoBBox::parse_list(text).unwrap().as_array(), expected);
	}

	#[rstest]
	#[case("1,2,3")]
	#[case("a,b,c,d")]
	#[case("10,0,-10,5")]
	#[case("0,0,200,5")]
	fn parse_list_err(#[case] text: &str) {
		assert!(GeoBBox::parse_list(text).is_err());
	}

	#[test]
	fn rejects_inverted() {
		assert!(GeoBBox::new(0.0, 5.0, 1.0, 4.0).is_err());
	}
}
