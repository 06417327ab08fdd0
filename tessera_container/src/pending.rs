use std::collections::HashMap;
use tessera_core::{Blob, TileCoord};

/// Tiles waiting for the next flush, in first-write order.
///
/// Writing a position again replaces its payload but keeps its place in the order.
/// `bytes` counts every submitted payload, including replaced ones.
#[derive(Debug, Default)]
pub struct PendingWrites {
	tiles: Vec<(TileCoord, Blob)>,
	index: HashMap<TileCoord, usize>,
	bytes: usize,
}

impl PendingWrites {
	pub fn insert(&mut self, coord: TileCoord, data: Blob) {
		self.bytes += data.len();
		match self.index.get(&coord) {
			Some(&i) => self.tiles[i].1 = data,
			None => {
				self.index.insert(coord, self.tiles.len());
				self.tiles.push((coord, data));
			}
		}
	}

	pub fn bytes(&self) -> usize {
		self.bytes
	}

	pub fn len(&self) -> usize {
		self.tiles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tiles.is_empty()
	}

	/// Take all tiles in order and reset the buffer.
	pub fn take(&mut self) -> Vec<(TileCoord, Blob)> {
		self.index.clear();
		self.bytes = 0;
		std::mem::take(&mut self.tiles)
	}
}
