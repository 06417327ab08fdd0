//! Container traits and the MBTiles provider.

use crate::{ContainerConfig, MBTilesContainer, compat, container::file_name};
use anyhow::Result;
use std::{fs, path::Path, sync::Arc};
use tessera_core::{Blob, Metadata, MetadataValue, TileCoord, TileMatrix, web_mercator};
use tessera_image::DynamicImage;

/// A random-access store of tiles addressed in XYZ row order.
pub trait TileContainer: TileMatrix + Send + Sync {
	fn is_read_only(&self) -> bool;

	/// Raw bytes of one tile, `None` if it is missing. A read error is stored in `error`
	/// instead of being returned.
	fn get_tile_data(&self, coord: &TileCoord, error: Option<&mut Option<anyhow::Error>>) -> Option<Blob>;

	/// The decoded image of one tile. Decoding errors are reported like read errors.
	fn get_tile(&self, coord: &TileCoord, error: Option<&mut Option<anyhow::Error>>) -> Option<DynamicImage>;

	/// Insert or replace one tile.
	fn set_tile(&self, coord: &TileCoord, data: &[u8], expiration: Option<i64>) -> Result<()>;

	/// Encode `image` (PNG if it has an alpha channel, JPEG otherwise) and store it.
	fn set_tile_image(&self, coord: &TileCoord, image: &DynamicImage, expiration: Option<i64>) -> Result<()>;

	fn has_tile_expiration_metadata(&self) -> bool {
		false
	}

	fn tile_expiration(&self, _coord: &TileCoord) -> Option<i64> {
		None
	}

	fn metadata(&self) -> Metadata;

	/// Flush pending writes, finalize metadata and close the container.
	fn dispose(self: Box<Self>) -> Result<()>;
}

/// Creates and opens containers of one file format.
pub trait TileContainerProvider: Send + Sync {
	fn name(&self) -> &str;

	/// File extension including the leading dot.
	fn default_extension(&self) -> &str;

	fn create(&self, name: Option<&str>, path: &Path, spec: Option<&dyn TileMatrix>) -> Result<Box<dyn TileContainer>>;

	/// `None` if the file cannot be opened by this provider.
	fn open(&self, path: &Path, spec: Option<&dyn TileMatrix>, read_only: bool) -> Option<Box<dyn TileContainer>>;

	fn is_compatible(&self, spec: Option<&dyn TileMatrix>) -> bool;
}

#[derive(Clone, Default)]
pub struct MBTilesProvider {
	config: Arc<ContainerConfig>,
}

impl MBTilesProvider {
	#[must_use]
	pub fn new(config: ContainerConfig) -> MBTilesProvider {
		MBTilesProvider { config: config.arc() }
	}

	pub fn config(&self) -> &ContainerConfig {
		&self.config
	}

	/// Open `path` for writing. If that fails, replace it with a fresh container whose format
	/// follows the `content` hint (`vector`, `terrain` or `imagery`).
	pub fn open_or_create(&self, path: &Path, name: Option<&str>, content: Option<&str>) -> Result<MBTilesContainer> {
		if path.exists() {
			if let Some(container) = MBTilesContainer::open(path, None, false, &self.config) {
				return Ok(container);
			}
			log::debug!("replacing {path:?}");
			fs::remove_file(path)?;
		}

		let name = name.map_or_else(|| file_name(path), str::to_string);
		let spec = content.map(|content| {
			let mut metadata = Metadata::new();
			metadata.insert("content".into(), MetadataValue::from(content));
			web_mercator::tile_matrix(&name, web_mercator::LEVEL_COUNT).with_metadata(metadata)
		});
		MBTilesContainer::create(Some(&name), path, spec.as_ref().map(|s| s as &dyn TileMatrix), &self.config)
	}
}

impl TileContainerProvider for MBTilesProvider {
	fn name(&self) -> &str {
		"MBTiles"
	}

	fn default_extension(&self) -> &str {
		".mbtiles"
	}

	fn create(&self, name: Option<&str>, path: &Path, spec: Option<&dyn TileMatrix>) -> Result<Box<dyn TileContainer>> {
		Ok(Box::new(MBTilesContainer::create(name, path, spec, &self.config)?))
	}

	fn open(&self, path: &Path, spec: Option<&dyn TileMatrix>, read_only: bool) -> Option<Box<dyn TileContainer>> {
		MBTilesContainer::open(path, spec, read_only, &self.config).map(|c| Box::new(c) as Box<dyn TileContainer>)
	}

	fn is_compatible(&self, spec: Option<&dyn TileMatrix>) -> bool {
		compat::is_compatible(spec)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_fs::NamedTempFile;
	use pretty_assertions::assert_eq;

	#[test]
	fn describes_itself() {
		let provider = MBTilesProvider::default();
		assert_eq!(provider.name(), "MBTiles");
		assert_eq!(provider.default_extension(), ".mbtiles");
		assert!(provider.is_compatible(None));
		assert_eq!(provider.config().tile_write_buffer, 0);
	}

	#[test]
	fn open_or_create_uses_the_content_hint() -> Result<()> {
		let file = NamedTempFile::new("hint.mbtiles")?;
		let provider = MBTilesProvider::default();

		let container = provider.open_or_create(&file, None, Some("terrain"))?;
		assert_eq!(container.metadata()["format"], MetadataValue::from("terrain-rgb"));
		assert_eq!(container.metadata()["content"], MetadataValue::from("terrain"));
		container.set_tile(&TileCoord::new(0, 0, 0)?, &[1], None)?;
		container.dispose()?;

		// an existing tileset is opened, not replaced
		let container = provider.open_or_create(&file, None, Some("vector"))?;
		assert_eq!(container.metadata()["format"], MetadataValue::from("terrain-rgb"));
		assert!(container.get_tile_data(&TileCoord::new(0, 0, 0)?, None).is_some());
		container.dispose()
	}

	#[test]
	fn open_or_create_replaces_garbage() -> Result<()> {
		let file = NamedTempFile::new("garbage.mbtiles")?;
		fs::write(&file, "garbage")?;
		let container = MBTilesProvider::default().open_or_create(&file, Some("fresh"), None)?;
		assert_eq!(container.name(), "fresh");
		assert_eq!(container.metadata()["format"], MetadataValue::from("png"));
		container.dispose()
	}
}
