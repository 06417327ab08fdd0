//! Physical table layouts of MBTiles files.
//!
//! A container detects its layout once when it is opened and keeps it for its lifetime.
//! Detection walks [`SchemaKind::DETECTION_ORDER`] and falls back to the flat layout when
//! nothing matches. All write statements are compiled through the connection's statement
//! cache and released with [`SchemaKind::release_statements`].

mod flat;
pub(crate) mod introspect;
mod normalized;

use anyhow::Result;
use r2d2_sqlite::rusqlite::Connection;
use tessera_core::{Metadata, TileCoord};
use tessera_derive::context;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SchemaKind {
	/// One `tiles` table with a unique index on the tile position.
	#[default]
	Flat,
	/// `tiles_shallow` + `tiles_data` with a `tiles` view on top.
	Normalized,
}

impl SchemaKind {
	/// Highest priority first. The normalized layout also matches the flat fingerprint,
	/// so it has to be tested before it.
	pub const DETECTION_ORDER: [SchemaKind; 2] = [SchemaKind::Normalized, SchemaKind::Flat];

	pub fn name(&self) -> &'static str {
		match self {
			SchemaKind::Flat => "default",
			SchemaKind::Normalized => "omt",
		}
	}

	pub fn from_name(name: &str) -> Option<SchemaKind> {
		SchemaKind::DETECTION_ORDER.into_iter().find(|s| s.name() == name)
	}

	pub fn matches(&self, conn: &Connection) -> Result<bool> {
		match self {
			SchemaKind::Flat => flat::matches(conn),
			SchemaKind::Normalized => normalized::matches(conn),
		}
	}

	/// The first layout in priority order that matches, or [`SchemaKind::Flat`].
	#[context("detecting MBTiles schema")]
	pub fn detect(conn: &Connection) -> Result<SchemaKind> {
		for schema in SchemaKind::DETECTION_ORDER {
			if schema.matches(conn)? {
				log::debug!("detected MBTiles schema '{}'", schema.name());
				return Ok(schema);
			}
		}
		log::debug!("no MBTiles schema matched, using '{}'", SchemaKind::Flat.name());
		Ok(SchemaKind::Flat)
	}

	/// Create the missing tables of this layout. Returns the initial metadata that was
	/// written if the `metadata` table had to be created.
	#[context("creating tables for MBTiles schema '{}'", self.name())]
	pub fn create_tables(&self, conn: &Connection, initial: Option<&Metadata>) -> Result<Option<Metadata>> {
		match self {
			SchemaKind::Flat => flat::create_tables(conn, initial),
			SchemaKind::Normalized => normalized::create_tables(conn, initial),
		}
	}

	/// Insert or replace one tile. `coord` uses the stored (TMS) row order.
	#[context("writing tile {coord:?} with schema '{}'", self.name())]
	pub fn set_tile(&self, conn: &Connection, coord: &TileCoord, data: &[u8]) -> Result<()> {
		match self {
			SchemaKind::Flat => flat::set_tile(conn, coord, data),
			SchemaKind::Normalized => normalized::set_tile(conn, coord, data),
		}
	}

	/// Drop all cached statements of `conn`, including the ones compiled by this layout.
	pub fn release_statements(conn: &Connection) {
		conn.flush_prepared_statement_cache();
	}
}

/// Whether `conn` holds any layout a container can work with.
pub fn is_compatible_schema(conn: &Connection) -> Result<bool> {
	for schema in SchemaKind::DETECTION_ORDER {
		if schema.matches(conn)? {
			return Ok(true);
		}
	}
	Ok(false)
}
