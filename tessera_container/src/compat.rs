use tessera_core::{TileMatrix, ZoomLevel, web_mercator};

/// Whether a tile matrix can be stored in an MBTiles container.
///
/// Without a matrix anything goes. Otherwise the SRID must be Web Mercator, every requested
/// level must exist in the native grid with the same tile dimensions and a pixel size that
/// differs by at most one pixel per tile, and the origin must lie within one native pixel
/// (at the coarsest requested level) of the native origin.
#[must_use]
pub fn is_compatible(spec: Option<&dyn TileMatrix>) -> bool {
	let Some(spec) = spec else {
		return true;
	};
	if web_mercator::normalize_srid(spec.srid()).is_none() {
		log::debug!("incompatible SRID {}", spec.srid());
		return false;
	}

	let native = web_mercator::zoom_levels(web_mercator::LEVEL_COUNT);
	for level in spec.zoom_levels() {
		let Some(native_level) = native.get(usize::from(level.level)) else {
			log::debug!("level {} is outside the native grid", level.level);
			return false;
		};
		if !level_fits(level, native_level) {
			log::debug!("{level:?} does not match native {native_level:?}");
			return false;
		}
	}

	let coarsest = spec.zoom_levels().iter().map(|z| z.level).min().unwrap_or(0);
	let Some(reference) = native.get(usize::from(coarsest)) else {
		return false;
	};
	let (x, y) = spec.origin();
	let (native_x, native_y) = web_mercator::origin();
	if (x - native_x).abs() > reference.pixel_size_x || (y - native_y).abs() > reference.pixel_size_y {
		log::debug!("origin ({x}, {y}) is off the native origin");
		return false;
	}
	true
}

fn level_fits(level: &ZoomLevel, native: &ZoomLevel) -> bool {
	if level.tile_width != native.tile_width || level.tile_height != native.tile_height {
		return false;
	}
	let deviation = |pixel: f64, native_pixel: f64, tile: u32, native_tile: u32| {
		(pixel / native_pixel * f64::from(tile) - f64::from(native_tile)).abs()
	};
	deviation(level.pixel_size_x, native.pixel_size_x, level.tile_width, native.tile_width) <= 1.0
		&& deviation(level.pixel_size_y, native.pixel_size_y, level.tile_height, native.tile_height) <= 1.0
}
