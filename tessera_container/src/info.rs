//! Facts about an existing tileset, gathered before a container is opened.

use crate::{
	metadata::{CONTENT_IMAGERY, CONTENT_TERRAIN, CONTENT_VECTOR, FORMAT_PBF, FORMAT_TERRAIN, read_metadata},
	schema::introspect::{column_names, table_names},
};
use anyhow::Result;
use r2d2_sqlite::rusqlite::{Connection, OptionalExtension};
use std::collections::HashSet;
use tessera_core::{TileBBox, web_mercator};
use tessera_derive::context;
use tessera_image::probe_dimensions;

const TILE_COLUMNS: [&str; 4] = ["zoom_level", "tile_column", "tile_row", "tile_data"];
const TILE_ALPHA: &str = "tile_alpha";

#[derive(Clone, Debug, PartialEq)]
pub struct TilesetInfo {
	pub name: Option<String>,
	pub format: Option<String>,
	/// `vector`, `terrain` or `imagery`.
	pub content: String,
	/// Lowest and highest stored zoom level. `None` if the tileset holds no tiles.
	pub min_level: Option<u8>,
	pub max_level: Option<u8>,
	/// Occupied tile range at `min_level`, in XYZ row order.
	pub min_level_extent: Option<TileBBox>,
	/// `min_level_extent` scaled down to `max_level` without scanning that level.
	pub max_level_extent: Option<TileBBox>,
	pub tile_width: u32,
	pub tile_height: u32,
	pub has_tile_alpha: bool,
	pub srid: i32,
}

impl TilesetInfo {
	/// Inspect `conn`. Returns `None` if it does not hold an MBTiles tileset: `tiles` must have
	/// exactly the four standard columns (optionally plus `tile_alpha`) and `metadata` must exist.
	#[context("probing MBTiles tileset")]
	pub fn probe(conn: &Connection) -> Result<Option<TilesetInfo>> {
		let standard: HashSet<String> = TILE_COLUMNS.iter().map(|c| (*c).to_string()).collect();
		let mut columns = column_names(conn, "tiles")?;
		let has_tile_alpha = columns.remove(TILE_ALPHA);
		if columns != standard || !table_names(conn)?.contains("metadata") {
			return Ok(None);
		}

		let metadata = read_metadata(conn)?;
		let text = |key: &str| metadata.get(key).and_then(|v| v.as_str()).map(str::to_string);
		let name = text("name");
		let format = text("format");
		let content = match format.as_deref() {
			Some(FORMAT_PBF) => CONTENT_VECTOR,
			Some(FORMAT_TERRAIN) => CONTENT_TERRAIN,
			_ if metadata.contains_key("json") => CONTENT_VECTOR,
			_ => CONTENT_IMAGERY,
		}
		.to_string();

		let (min_level, max_level): (Option<u8>, Option<u8>) =
			conn.query_row("SELECT min(zoom_level), max(zoom_level) FROM tiles", [], |row| {
				Ok((row.get(0)?, row.get(1)?))
			})?;

		let min_level_extent = match min_level {
			Some(level) => Some(tile_extent(conn, level)?),
			None => None,
		};
		let max_level_extent = match (min_level_extent, max_level) {
			(Some(extent), Some(level)) => Some(extent.scaled_to(level)?),
			_ => None,
		};

		let (tile_width, tile_height) = conn
			.query_row("SELECT tile_data FROM tiles LIMIT 1", [], |row| row.get::<_, Vec<u8>>(0))
			.optional()?
			.and_then(|data| probe_dimensions(&data))
			.unwrap_or((web_mercator::TILE_SIZE, web_mercator::TILE_SIZE));

		let info = TilesetInfo {
			name,
			format,
			content,
			min_level,
			max_level,
			min_level_extent,
			max_level_extent,
			tile_width,
			tile_height,
			has_tile_alpha,
			srid: web_mercator::SRID,
		};
		log::debug!("probed tileset {info:?}");
		Ok(Some(info))
	}
}

/// Occupied columns and rows at `level`, converted to XYZ row order.
fn tile_extent(conn: &Connection, level: u8) -> Result<TileBBox> {
	let (x_min, y_min, x_max, y_max): (u32, u32, u32, u32) = conn.query_row(
		"SELECT min(tile_column), min(tile_row), max(tile_column), max(tile_row) FROM tiles WHERE zoom_level = ?1",
		[level],
		|row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
	)?;
	Ok(TileBBox::new(level, x_min, y_min, x_max, y_max)?.flipped_y())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::SchemaKind;
	use pretty_assertions::assert_eq;
	use r2d2_sqlite::rusqlite::params;
	use tessera_core::{Metadata, TileCoord};
	use tessera_image::{DynamicImage, encode_tile};

	fn database(metadata: &[(&str, &str)]) -> Result<Connection> {
		let conn = Connection::open_in_memory()?;
		let metadata: Metadata = metadata.iter().map(|(k, v)| ((*k).to_string(), (*v).into())).collect();
		SchemaKind::Flat.create_tables(&conn, Some(&metadata))?;
		Ok(conn)
	}

	#[test]
	fn empty_tileset() -> Result<()> {
		let info = TilesetInfo::probe(&database(&[("name", "empty")])?)?.unwrap();
		assert_eq!(info.name.as_deref(), Some("empty"));
		assert_eq!(info.format.as_deref(), Some("png"));
		assert_eq!(info.content, "imagery");
		assert_eq!((info.min_level, info.max_level), (None, None));
		assert_eq!(info.min_level_extent, None);
		assert_eq!(info.max_level_extent, None);
		assert_eq!((info.tile_width, info.tile_height), (256, 256));
		assert!(!info.has_tile_alpha);
		assert_eq!(info.srid, 3857);
		Ok(())
	}

	#[test]
	fn levels_extent_and_dimensions() -> Result<()> {
		let conn = database(&[])?;
		let tile = encode_tile(&DynamicImage::new_rgb8(64, 32))?;
		// stored rows: level 2 row 0 is XYZ row 3
		for (level, x, y) in [(2, 1, 0), (2, 2, 1), (4, 0, 0)] {
			SchemaKind::Flat.set_tile(&conn, &TileCoord::new(level, x, y)?, tile.as_slice())?;
		}
		let info = TilesetInfo::probe(&conn)?.unwrap();
		assert_eq!((info.min_level, info.max_level), (Some(2), Some(4)));
		assert_eq!(info.min_level_extent, Some(TileBBox::new(2, 1, 2, 2, 3)?));
		assert_eq!(info.max_level_extent, Some(TileBBox::new(4, 4, 8, 11, 15)?));
		assert_eq!((info.tile_width, info.tile_height), (64, 32));
		Ok(())
	}

	#[test]
	fn content_classification() -> Result<()> {
		let probe = |metadata: &[(&str, &str)]| -> Result<String> {
			Ok(TilesetInfo::probe(&database(metadata)?)?.unwrap().content)
		};
		assert_eq!(probe(&[("format", "pbf")])?, "vector");
		assert_eq!(probe(&[("format", "terrain-rgb")])?, "terrain");
		assert_eq!(probe(&[("format", "jpg"), ("json", "{}")])?, "vector");
		assert_eq!(probe(&[("format", "webp")])?, "imagery");
		Ok(())
	}

	#[test]
	fn rejects_foreign_tables() -> Result<()> {
		let conn = Connection::open_in_memory()?;
		assert!(TilesetInfo::probe(&conn)?.is_none());

		conn.execute_batch(
			"CREATE TABLE tiles (zoom_level INTEGER, tile_column INTEGER, tile_row INTEGER, tile_data BLOB, extra TEXT);
			CREATE TABLE metadata (name TEXT, value TEXT);",
		)?;
		assert!(TilesetInfo::probe(&conn)?.is_none());
		Ok(())
	}

	#[test]
	fn tile_alpha_column() -> Result<()> {
		let conn = Connection::open_in_memory()?;
		conn.execute_batch(
			"CREATE TABLE tiles (zoom_level INTEGER, tile_column INTEGER, tile_row INTEGER, tile_data BLOB, tile_alpha INTEGER);
			CREATE TABLE metadata (name TEXT, value TEXT);",
		)?;
		conn.execute(
			"INSERT INTO tiles VALUES (?1, ?2, ?3, ?4, 1)",
			params![0, 0, 0, vec![0u8; 8]],
		)?;
		let info = TilesetInfo::probe(&conn)?.unwrap();
		assert!(info.has_tile_alpha);
		assert_eq!(info.min_level_extent, Some(TileBBox::new(0, 0, 0, 0, 0)?));
		assert_eq!(info.max_level_extent, info.min_level_extent);
		Ok(())
	}
}
