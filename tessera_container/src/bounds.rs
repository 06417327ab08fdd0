//! Bounds bookkeeping of a write session.
//!
//! The accumulator starts from the extent stored in the file (empty for new files). Every
//! successful tile write grows the zoom range and the envelope of the tile's zoom level. At
//! dispose only the envelope of the deepest level (stored or written) is merged into the
//! stored bounds, so writes at coarser levels leave the bounds of a detailed tileset alone.

use crate::metadata::StoredExtent;
use std::collections::BTreeMap;
use tessera_core::{GeoBBox, TileCoord};

#[derive(Debug, Default)]
pub struct BoundsAccumulator {
	initial: StoredExtent,
	written: Option<(u8, u8)>,
	per_level: BTreeMap<u8, GeoBBox>,
}

impl BoundsAccumulator {
	/// Continue from the extent persisted in an existing file.
	pub fn from_extent(initial: StoredExtent) -> BoundsAccumulator {
		BoundsAccumulator {
			initial,
			..BoundsAccumulator::default()
		}
	}

	/// Grow the accumulators by the footprint of `coord` (XYZ row order).
	pub fn add(&mut self, coord: &TileCoord) {
		let footprint = coord.to_geo_bbox();
		self.written = Some(match self.written {
			None => (coord.level, coord.level),
			Some((min, max)) => (min.min(coord.level), max.max(coord.level)),
		});
		self
			.per_level
			.entry(coord.level)
			.and_modify(|bbox| bbox.extend(&footprint))
			.or_insert(footprint);
	}

	pub fn level_bbox(&self, level: u8) -> Option<GeoBBox> {
		self.per_level.get(&level).copied()
	}

	/// The extent to persist, or `None` if nothing was written this session.
	pub fn finalize(&self) -> Option<StoredExtent> {
		let (written_min, written_max) = self.written?;
		let min_zoom = self.initial.min_zoom.map_or(written_min, |z| z.min(written_min));
		let max_zoom = self.initial.max_zoom.map_or(written_max, |z| z.max(written_max));

		let bbox = match (self.initial.bbox, self.level_bbox(max_zoom)) {
			(Some(initial), Some(level)) => Some(initial.extended(&level)),
			(Some(initial), None) => Some(initial),
			// no usable stored bounds, start over from the deepest written level
			(None, _) => self.level_bbox(written_max),
		};

		Some(StoredExtent {
			bbox,
			min_zoom: Some(min_zoom),
			max_zoom: Some(max_zoom),
		})
	}
}
