//! The `metadata` name/value table.
//!
//! Well-known keys:
//! - `format`: tile encoding (`png`, `jpg`, `pbf`, `terrain-rgb`, ...)
//! - `content`: derived from `format` when absent (`vector`, `terrain`, `imagery`)
//! - `bounds`, `minzoom`, `maxzoom`: written by the container when it is disposed after writes

use anyhow::Result;
use r2d2_sqlite::rusqlite::{
	Connection, params,
	types::{Value, ValueRef},
};
use tessera_core::{GeoBBox, Metadata, MetadataValue};
use tessera_derive::context;

pub const FORMAT_PNG: &str = "png";
pub const FORMAT_PBF: &str = "pbf";
pub const FORMAT_TERRAIN: &str = "terrain-rgb";

pub const CONTENT_VECTOR: &str = "vector";
pub const CONTENT_TERRAIN: &str = "terrain";
pub const CONTENT_IMAGERY: &str = "imagery";

const IMAGERY_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "tiff"];

/// The `format` a fresh container gets for a `content` hint.
pub fn format_for_content(content: &str) -> Option<&'static str> {
	match content {
		CONTENT_VECTOR => Some(FORMAT_PBF),
		CONTENT_TERRAIN => Some(FORMAT_TERRAIN),
		CONTENT_IMAGERY => Some(FORMAT_PNG),
		_ => None,
	}
}

/// The `content` implied by a `format`, if the format is known.
pub fn content_for_format(format: &str) -> Option<&'static str> {
	match format {
		FORMAT_PBF => Some(CONTENT_VECTOR),
		FORMAT_TERRAIN => Some(CONTENT_TERRAIN),
		f if IMAGERY_FORMATS.contains(&f) => Some(CONTENT_IMAGERY),
		_ => None,
	}
}

/// Values written when a container is created.
///
/// Without any hint the format is `png`. A textual `content` hint without a `format` is
/// replaced by the matching format; unknown content hints are kept as they are.
pub fn initial_values(metadata: Option<&Metadata>) -> Metadata {
	let mut values = metadata.cloned().unwrap_or_default();
	if !values.contains_key("format") && !values.contains_key("content") {
		values.insert("format".into(), FORMAT_PNG.into());
	}
	translate_content_hint(&mut values);
	values
}

/// Replace a known textual `content` hint by its `format`, unless a format is already given.
pub fn translate_content_hint(values: &mut Metadata) {
	if values.contains_key("format") {
		return;
	}
	let format = values
		.get("content")
		.and_then(|c| c.as_str())
		.and_then(format_for_content);
	if let Some(format) = format {
		values.insert("format".into(), format.into());
		values.remove("content");
	}
}

/// Add `content` derived from a textual `format` unless `content` is already present.
pub fn derive_content(metadata: &mut Metadata) {
	if metadata.contains_key("content") {
		return;
	}
	let derived = metadata
		.get("format")
		.and_then(|f| f.as_str())
		.and_then(content_for_format);
	if let Some(content) = derived {
		metadata.insert("content".into(), content.into());
	}
}

/// Insert the initial values into a freshly created, empty `metadata` table.
#[context("initializing MBTiles metadata")]
pub fn insert_initial(conn: &Connection, metadata: Option<&Metadata>) -> Result<Metadata> {
	let values = initial_values(metadata);
	let mut stmt = conn.prepare("INSERT INTO metadata (name, value) VALUES (?1, ?2)")?;
	for (name, value) in &values {
		stmt.execute(params![name, to_sql(value)])?;
	}
	Ok(values)
}

/// Insert or update one entry. Works with and without a unique index on `name`.
#[context("setting metadata '{name}' = {value:?}")]
pub fn set_metadata(conn: &Connection, name: &str, value: &MetadataValue) -> Result<()> {
	let exists = conn
		.prepare_cached("SELECT 1 FROM metadata WHERE name = ?1 LIMIT 1")?
		.exists([name])?;
	let sql = if exists {
		"UPDATE metadata SET value = ?1 WHERE name = ?2"
	} else {
		"INSERT INTO metadata (value, name) VALUES (?1, ?2)"
	};
	conn.prepare_cached(sql)?.execute(params![to_sql(value), name])?;
	Ok(())
}

/// All non-null entries.
#[context("reading MBTiles metadata")]
pub fn read_metadata(conn: &Connection) -> Result<Metadata> {
	let mut stmt = conn.prepare("SELECT name, value FROM metadata")?;
	let mut rows = stmt.query([])?;
	let mut metadata = Metadata::new();
	while let Some(row) = rows.next()? {
		let Some(name) = row.get::<_, Option<String>>(0)? else {
			continue;
		};
		if let Some(value) = from_sql(row.get_ref(1)?) {
			metadata.insert(name, value);
		}
	}
	Ok(metadata)
}

fn to_sql(value: &MetadataValue) -> Value {
	match value {
		MetadataValue::Text(v) => Value::Text(v.clone()),
		MetadataValue::Integer(v) => Value::Integer(i64::from(*v)),
		MetadataValue::Long(v) => Value::Integer(*v),
		MetadataValue::Double(v) => Value::Real(*v),
		MetadataValue::Blob(v) => Value::Blob(v.clone()),
	}
}

fn from_sql(value: ValueRef<'_>) -> Option<MetadataValue> {
	match value {
		ValueRef::Null => None,
		ValueRef::Integer(v) => Some(i32::try_from(v).map_or(MetadataValue::Long(v), MetadataValue::Integer)),
		ValueRef::Real(v) => Some(MetadataValue::Double(v)),
		ValueRef::Text(v) => Some(MetadataValue::Text(String::from_utf8_lossy(v).into_owned())),
		ValueRef::Blob(v) => Some(MetadataValue::Blob(v.to_vec())),
	}
}

/// Extent recorded in metadata when a container was opened.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StoredExtent {
	pub bbox: Option<GeoBBox>,
	pub min_zoom: Option<u8>,
	pub max_zoom: Option<u8>,
}

impl StoredExtent {
	/// Reads `bounds`, `minzoom` and `maxzoom`. Missing zoom values are taken from the
	/// zoom levels present in the `tiles` table.
	#[context("reading stored extent")]
	pub fn load(conn: &Connection, metadata: &Metadata) -> Result<StoredExtent> {
		let zoom = |key: &str| {
			metadata
				.get(key)
				.and_then(|v| v.as_i64())
				.and_then(|v| u8::try_from(v).ok())
		};
		let mut extent = StoredExtent {
			bbox: None,
			min_zoom: zoom("minzoom"),
			max_zoom: zoom("maxzoom"),
		};

		if let Some(value) = metadata.get("bounds") {
			match value.as_str().map(GeoBBox::parse_list) {
				Some(Ok(bbox)) => extent.bbox = Some(bbox),
				Some(Err(err)) => log::warn!("ignoring malformed bounds: {err:#}"),
				None => log::warn!("ignoring bounds stored as {}", value.type_name()),
			}
		}

		if extent.min_zoom.is_none() || extent.max_zoom.is_none() {
			let (min, max): (Option<i64>, Option<i64>) =
				conn.query_row("SELECT min(zoom_level), max(zoom_level) FROM tiles", [], |row| {
					Ok((row.get(0)?, row.get(1)?))
				})?;
			extent.min_zoom = extent.min_zoom.or(min.and_then(|v| u8::try_from(v).ok()));
			extent.max_zoom = extent.max_zoom.or(max.and_then(|v| u8::try_from(v).ok()));
		}
		Ok(extent)
	}
}
