//! Table and column discovery through `sqlite_master` and `pragma_table_info`.

use anyhow::Result;
use r2d2_sqlite::rusqlite::Connection;
use std::collections::HashSet;

/// Names of all tables and views.
pub fn table_names(conn: &Connection) -> Result<HashSet<String>> {
	let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type IN ('table', 'view')")?;
	let names = stmt
		.query_map([], |row| row.get::<_, String>(0))?
		.collect::<Result<HashSet<_>, _>>()?;
	Ok(names)
}

/// Column names of a table or view. Empty if it does not exist.
pub fn column_names(conn: &Connection, table: &str) -> Result<HashSet<String>> {
	let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
	let names = stmt
		.query_map([table], |row| row.get::<_, String>(0))?
		.collect::<Result<HashSet<_>, _>>()?;
	Ok(names)
}

/// Whether every listed table exists and has at least the listed columns.
pub fn matches_schema(conn: &Connection, expected: &[(&str, &[&str])]) -> Result<bool> {
	for (table, columns) in expected {
		let found = column_names(conn, table)?;
		if found.is_empty() || !columns.iter().all(|c| found.contains(*c)) {
			return Ok(false);
		}
	}
	Ok(true)
}
