//! Create/open rules, metadata derivation and bounds bookkeeping across sessions.

use anyhow::{Result, anyhow};
use approx::assert_relative_eq;
use pretty_assertions::assert_eq;
use std::{fs, path::Path};
use tempfile::TempDir;
use tessera_container::*;
use tessera_core::{GeoBBox, Metadata, MetadataValue, TileCoord, TileMatrix, web_mercator};

fn config() -> ContainerConfig {
	ContainerConfig::default()
}

fn hint(entries: &[(&str, &str)]) -> Metadata {
	entries
		.iter()
		.map(|(k, v)| ((*k).to_string(), MetadataValue::from(*v)))
		.collect()
}

fn text(metadata: &Metadata, key: &str) -> Option<String> {
	metadata.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn stored_bounds_text(path: &Path) -> Result<String> {
	let container = MBTilesContainer::try_open(path, None, true, &config())?;
	let bounds = text(&container.metadata(), "bounds").ok_or_else(|| anyhow!("no bounds"))?;
	container.dispose()?;
	Ok(bounds)
}

fn stored_bounds(path: &Path) -> Result<GeoBBox> {
	GeoBBox::parse_list(&stored_bounds_text(path)?)
}

fn downcast(err: &anyhow::Error) -> Option<&ContainerError> {
	err.downcast_ref::<ContainerError>()
}

#[test]
fn pbf_format_derives_vector_content() -> Result<()> {
	let dir = TempDir::new()?;
	let path = dir.path().join("vector.mbtiles");
	let spec = web_mercator::tile_matrix("vector", 15).with_metadata(hint(&[("format", "pbf")]));

	MBTilesContainer::create(None, &path, Some(&spec), &config())?.dispose()?;

	let container = MBTilesContainer::try_open(&path, None, false, &config())?;
	let metadata = container.metadata();
	assert_eq!(text(&metadata, "format").as_deref(), Some("pbf"));
	assert_eq!(text(&metadata, "content").as_deref(), Some("vector"));
	container.dispose()
}

#[test]
fn content_hint_becomes_format() -> Result<()> {
	let dir = TempDir::new()?;
	let path = dir.path().join("terrain.mbtiles");
	let spec = web_mercator::tile_matrix("terrain", 15).with_metadata(hint(&[("content", "terrain")]));
	MBTilesContainer::create(None, &path, Some(&spec), &config())?.dispose()?;

	let conn = r2d2_sqlite::rusqlite::Connection::open(&path)?;
	let stored: Vec<(String, String)> = conn
		.prepare("SELECT name, value FROM metadata ORDER BY name")?
		.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
		.collect::<Result<_, _>>()?;
	assert_eq!(stored, vec![("format".to_string(), "terrain-rgb".to_string())]);
	Ok(())
}

#[test]
fn dispose_without_writes_keeps_metadata() -> Result<()> {
	let dir = TempDir::new()?;
	let path = dir.path().join("untouched.mbtiles");
	let container = MBTilesContainer::create(None, &path, None, &config())?;
	container.set_tile(&TileCoord::new(4, 3, 3)?, &[7; 32], None)?;
	container.dispose()?;
	let before = fs::read(&path)?;

	for read_only in [false, true] {
		MBTilesContainer::try_open(&path, None, read_only, &config())?.dispose()?;
		assert_eq!(fs::read(&path)?, before, "read_only: {read_only}");
	}
	Ok(())
}

#[test]
fn bounds_grow_across_sessions() -> Result<()> {
	let dir = TempDir::new()?;
	let path = dir.path().join("bounds.mbtiles");

	let container = MBTilesContainer::create(None, &path, None, &config())?;
	container.set_tile(&TileCoord::new(3, 4, 3)?, &[1], None)?;
	container.dispose()?;
	let first = stored_bounds(&path)?;
	assert_relative_eq!(first.x_min, 0.0, epsilon = 1e-6);
	assert_relative_eq!(first.x_max, 45.0, epsilon = 1e-6);

	let container = MBTilesContainer::try_open(&path, None, false, &config())?;
	container.set_tile(&TileCoord::new(3, 1, 5)?, &[2], None)?;
	container.dispose()?;
	let second = stored_bounds(&path)?;
	assert!(second.contains(&first));
	assert_relative_eq!(second.x_min, -135.0, epsilon = 1e-6);

	// writes at a coarser level keep the extent and widen the zoom range
	let container = MBTilesContainer::try_open(&path, None, false, &config())?;
	container.set_tile(&TileCoord::new(1, 0, 0)?, &[3], None)?;
	container.dispose()?;
	let third = stored_bounds(&path)?;
	assert_eq!(third, second);

	let container = MBTilesContainer::try_open(&path, None, true, &config())?;
	let metadata = container.metadata();
	assert_eq!(text(&metadata, "minzoom").as_deref(), Some("1"));
	assert_eq!(text(&metadata, "maxzoom").as_deref(), Some("3"));
	assert_eq!(container.zoom_levels().len(), 4);
	container.dispose()
}

#[test]
fn coarse_write_into_detailed_tileset_keeps_bounds() -> Result<()> {
	let dir = TempDir::new()?;
	let path = dir.path().join("detailed.mbtiles");

	let container = MBTilesContainer::create(None, &path, None, &config())?;
	container.set_tile(&TileCoord::new(5, 16, 10)?, &[1], None)?;
	container.dispose()?;
	let before = stored_bounds_text(&path)?;
	assert_eq!(before, "0.000000,48.922499,11.250000,55.776573");

	let container = MBTilesContainer::try_open(&path, None, false, &config())?;
	container.set_tile(&TileCoord::new(0, 0, 0)?, &[2], None)?;
	container.dispose()?;
	assert_eq!(stored_bounds_text(&path)?, before);

	let container = MBTilesContainer::try_open(&path, None, true, &config())?;
	let metadata = container.metadata();
	assert_eq!(text(&metadata, "minzoom").as_deref(), Some("0"));
	assert_eq!(text(&metadata, "maxzoom").as_deref(), Some("5"));
	container.dispose()
}

#[test]
fn read_only_refuses_writes() -> Result<()> {
	let dir = TempDir::new()?;
	let path = dir.path().join("read_only.mbtiles");
	MBTilesContainer::create(None, &path, None, &config())?.dispose()?;

	let container = MBTilesContainer::try_open(&path, None, true, &config())?;
	assert_eq!(container.zoom_levels().len(), 0);
	let err = container
		.set_tile(&TileCoord::new(0, 0, 0)?, &[1], None)
		.err()
		.ok_or_else(|| anyhow!("write succeeded"))?;
	assert!(matches!(downcast(&err), Some(ContainerError::ReadOnly)));
	container.dispose()
}

#[test]
fn encode_failure_is_distinct() -> Result<()> {
	let dir = TempDir::new()?;
	let path = dir.path().join("encode.mbtiles");
	let container = MBTilesContainer::create(None, &path, None, &config())?;
	let image = tessera_image::DynamicImage::new_rgb32f(16, 16);
	let err = container
		.set_tile_image(&TileCoord::new(0, 0, 0)?, &image, None)
		.err()
		.ok_or_else(|| anyhow!("encoding succeeded"))?;
	assert!(matches!(downcast(&err), Some(ContainerError::TileEncode(_))));
	assert!(container.get_tile_data(&TileCoord::new(0, 0, 0)?, None).is_none());
	container.dispose()
}

#[test]
fn initialization_closes_with_the_first_tile() -> Result<()> {
	let dir = TempDir::new()?;
	let path = dir.path().join("init.mbtiles");
	let container = MBTilesContainer::create(None, &path, None, &config())?;
	container.set_initial_metadata(&hint(&[("content", "vector"), ("name", "roads")]))?;
	let metadata = container.metadata();
	assert_eq!(text(&metadata, "format").as_deref(), Some("pbf"));
	assert_eq!(text(&metadata, "content").as_deref(), Some("vector"));
	assert_eq!(text(&metadata, "name").as_deref(), Some("roads"));

	container.set_tile(&TileCoord::new(0, 0, 0)?, &[1], None)?;
	let err = container
		.set_initial_metadata(&hint(&[("name", "late")]))
		.err()
		.ok_or_else(|| anyhow!("metadata accepted"))?;
	assert!(matches!(downcast(&err), Some(ContainerError::InitializationClosed)));
	container.dispose()?;

	// opened containers never accept initialization metadata
	let container = MBTilesContainer::try_open(&path, None, false, &config())?;
	assert_eq!(container.name(), "roads");
	assert!(container.set_initial_metadata(&hint(&[("name", "x")])).is_err());
	container.dispose()
}

#[test]
fn open_checks_the_tile_matrix() -> Result<()> {
	let dir = TempDir::new()?;
	let path = dir.path().join("spec.mbtiles");
	MBTilesContainer::create(None, &path, None, &config())?.dispose()?;

	let native = web_mercator::tile_matrix("native", 20);
	assert!(MBTilesContainer::open(&path, Some(&native), true, &config()).is_some());
	assert!(MBTilesContainer::open(&path, Some(&native.clone().with_srid(900_913)), true, &config()).is_some());
	assert!(MBTilesContainer::open(&path, Some(&native.clone().with_srid(4326)), true, &config()).is_none());
	assert!(MBTilesContainer::open(&path, Some(&native.with_origin((0.0, 0.0))), true, &config()).is_none());
	Ok(())
}

#[test]
fn create_rejects_incompatible_specs() -> Result<()> {
	let dir = TempDir::new()?;
	let path = dir.path().join("rejected.mbtiles");
	let shifted = web_mercator::tile_matrix("shifted", 4).with_origin((0.0, 0.0));
	let err = MBTilesContainer::create(None, &path, Some(&shifted), &config())
		.err()
		.ok_or_else(|| anyhow!("created"))?;
	assert!(matches!(downcast(&err), Some(ContainerError::IncompatibleSpec)));
	assert!(!path.exists());
	Ok(())
}

#[test]
fn create_replaces_existing_files() -> Result<()> {
	let dir = TempDir::new()?;
	let path = dir.path().join("replace.mbtiles");
	let container = MBTilesContainer::create(None, &path, None, &config())?;
	container.set_tile(&TileCoord::new(0, 0, 0)?, &[1], None)?;
	container.dispose()?;

	let container = MBTilesContainer::create(None, &path, None, &config())?;
	assert!(container.get_tile_data(&TileCoord::new(0, 0, 0)?, None).is_none());
	container.dispose()
}
