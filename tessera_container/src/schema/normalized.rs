//! The OpenMapTiles layout: tile positions in `tiles_shallow` reference payloads in
//! `tiles_data` by content id, and a `tiles` view joins both into the flat column shape.
//!
//! Content ids are allocated as `max(tile_data_id) + 1` the first time a position is written.
//! Rewriting a position replaces the payload behind its id. Identical payloads are not shared.

use super::introspect::{matches_schema, table_names};
use crate::metadata;
use anyhow::Result;
use r2d2_sqlite::rusqlite::{Connection, OptionalExtension, params};
use tessera_core::{Metadata, TileCoord};

pub const TABLES: &[(&str, &[&str])] = &[
	("tiles_shallow", &["zoom_level", "tile_column", "tile_row", "tile_data_id"]),
	("tiles_data", &["tile_data_id", "tile_data"]),
];

const QUERY_ID: &str =
	"SELECT tile_data_id FROM tiles_shallow WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3 LIMIT 1";
const QUERY_MAX_ID: &str = "SELECT max(tile_data_id) FROM tiles_data";
const INSERT_SHALLOW: &str =
	"INSERT INTO tiles_shallow (zoom_level, tile_column, tile_row, tile_data_id) VALUES (?1, ?2, ?3, ?4)";
const UPSERT_DATA: &str = "INSERT INTO tiles_data (tile_data_id, tile_data) VALUES (?1, ?2)
	ON CONFLICT(tile_data_id) DO UPDATE SET tile_data = excluded.tile_data";

/// Both normalized tables must exist next to something shaped like the flat `tiles` table.
pub fn matches(conn: &Connection) -> Result<bool> {
	Ok(super::flat::matches(conn)? && matches_schema(conn, TABLES)?)
}

pub fn create_tables(conn: &Connection, initial: Option<&Metadata>) -> Result<Option<Metadata>> {
	let tables = table_names(conn)?;
	if !tables.contains("tiles_data") {
		conn.execute_batch("CREATE TABLE tiles_data (tile_data_id INTEGER PRIMARY KEY, tile_data BLOB)")?;
	}
	if !tables.contains("tiles_shallow") {
		conn.execute_batch(
			"CREATE TABLE tiles_shallow (zoom_level INTEGER, tile_column INTEGER, tile_row INTEGER, tile_data_id INTEGER, PRIMARY KEY (zoom_level, tile_column, tile_row)) WITHOUT ROWID",
		)?;
	}
	if !tables.contains("tiles") {
		conn.execute_batch(
			"CREATE VIEW tiles AS SELECT
				tiles_shallow.zoom_level AS zoom_level,
				tiles_shallow.tile_column AS tile_column,
				tiles_shallow.tile_row AS tile_row,
				tiles_data.tile_data AS tile_data
			FROM tiles_shallow JOIN tiles_data ON tiles_shallow.tile_data_id = tiles_data.tile_data_id",
		)?;
	}
	if tables.contains("metadata") {
		return Ok(None);
	}
	conn.execute_batch("CREATE TABLE metadata (name TEXT, value TEXT)")?;
	let written = metadata::insert_initial(conn, initial)?;
	conn.execute_batch("CREATE UNIQUE INDEX name ON metadata (name)")?;
	Ok(Some(written))
}

/// Writes one tile; `coord` is in stored (TMS) row order.
pub fn set_tile(conn: &Connection, coord: &TileCoord, data: &[u8]) -> Result<()> {
	let existing: Option<i64> = conn
		.prepare_cached(QUERY_ID)?
		.query_row(params![coord.level, coord.x, coord.y], |row| row.get(0))
		.optional()?;

	let id = match existing {
		Some(id) => id,
		None => {
			let max: Option<i64> = conn.prepare_cached(QUERY_MAX_ID)?.query_row([], |row| row.get(0))?;
			let id = max.unwrap_or(0) + 1;
			conn
				.prepare_cached(INSERT_SHALLOW)?
				.execute(params![coord.level, coord.x, coord.y, id])?;
			id
		}
	};
	log::trace!("write tile {coord:?} as content id {id}");

	conn.prepare_cached(UPSERT_DATA)?.execute(params![id, data])?;
	Ok(())
}
