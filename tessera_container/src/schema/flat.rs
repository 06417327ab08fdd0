//! The MBTiles 1.x layout: a single `tiles` table holding every payload.

use super::introspect::{matches_schema, table_names};
use crate::metadata;
use anyhow::Result;
use r2d2_sqlite::rusqlite::{Connection, params};
use tessera_core::{Metadata, TileCoord};

pub const TABLES: &[(&str, &[&str])] = &[("tiles", &["tile_data", "zoom_level", "tile_column", "tile_row"])];

const EXISTS: &str = "SELECT 1 FROM tiles WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3 LIMIT 1";
const UPDATE: &str = "UPDATE tiles SET tile_data = ?1 WHERE zoom_level = ?2 AND tile_column = ?3 AND tile_row = ?4";
const INSERT: &str = "INSERT INTO tiles (tile_data, zoom_level, tile_column, tile_row) VALUES (?1, ?2, ?3, ?4)";

pub fn matches(conn: &Connection) -> Result<bool> {
	matches_schema(conn, TABLES)
}

/// Creates whatever of `tiles` and `metadata` is missing.
pub fn create_tables(conn: &Connection, initial: Option<&Metadata>) -> Result<Option<Metadata>> {
	let tables = table_names(conn)?;
	if !tables.contains("tiles") {
		conn.execute_batch(
			"CREATE TABLE tiles (tile_data BLOB, zoom_level INTEGER, tile_column INTEGER, tile_row INTEGER);
			CREATE UNIQUE INDEX tile_index ON tiles (zoom_level, tile_column, tile_row);",
		)?;
	}
	if tables.contains("metadata") {
		return Ok(None);
	}
	conn.execute_batch("CREATE TABLE metadata (name TEXT, value TEXT)")?;
	metadata::insert_initial(conn, initial).map(Some)
}

/// Writes one tile; `coord` is in stored (TMS) row order.
pub fn set_tile(conn: &Connection, coord: &TileCoord, data: &[u8]) -> Result<()> {
	let exists = conn
		.prepare_cached(EXISTS)?
		.exists(params![coord.level, coord.x, coord.y])?;
	let sql = if exists { UPDATE } else { INSERT };
	log::trace!("{} tile {coord:?}", if exists { "update" } else { "insert" });
	conn
		.prepare_cached(sql)?
		.execute(params![data, coord.level, coord.x, coord.y])?;
	Ok(())
}
