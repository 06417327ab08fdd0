//! Typed values of the `metadata` name/value table.
//!
//! A container stores its metadata as loosely typed SQLite values. [`MetadataValue`] keeps the
//! storage class that was read (text, 32 or 64 bit integer, double or blob) so that values
//! round-trip unchanged, while the accessors offer the lenient numeric parsing readers need
//! for keys like `minzoom` that are frequently stored as text.

use std::{collections::BTreeMap, fmt};

/// Metadata keyed by name.
pub type Metadata = BTreeMap<String, MetadataValue>;

#[derive(Clone, PartialEq)]
pub enum MetadataValue {
	Text(String),
	Integer(i32),
	Long(i64),
	Double(f64),
	Blob(Vec<u8>),
}

impl MetadataValue {
	/// The value as text, only for [`MetadataValue::Text`].
	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			MetadataValue::Text(text) => Some(text),
			_ => None,
		}
	}

	/// The value as an integer. Text is parsed; doubles and blobs are not converted.
	#[must_use]
	pub fn as_i64(&self) -> Option<i64> {
		match self {
			MetadataValue::Integer(v) => Some(i64::from(*v)),
			MetadataValue::Long(v) => Some(*v),
			MetadataValue::Text(text) => text.trim().parse().ok(),
			MetadataValue::Double(_) | MetadataValue::Blob(_) => None,
		}
	}

	#[must_use]
	pub fn type_name(&self) -> &'static str {
		match self {
			MetadataValue::Text(_) => "text",
			MetadataValue::Integer(_) => "integer",
			MetadataValue::Long(_) => "long",
			MetadataValue::Double(_) => "double",
			MetadataValue::Blob(_) => "blob",
		}
	}
}

impl fmt::Debug for MetadataValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MetadataValue::Text(v) => write!(f, "Text({v:?})"),
			MetadataValue::Integer(v) => write!(f, "Integer({v})"),
			MetadataValue::Long(v) => write!(f, "Long({v})"),
			MetadataValue::Double(v) => write!(f, "Double({v})"),
			MetadataValue::Blob(v) => write!(f, "Blob({} bytes)", v.len()),
		}
	}
}

impl fmt::Display for MetadataValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MetadataValue::Text(v) => f.write_str(v),
			MetadataValue::Integer(v) => write!(f, "{v}"),
			MetadataValue::Long(v) => write!(f, "{v}"),
			MetadataValue::Double(v) => write!(f, "{v}"),
			MetadataValue::Blob(v) => write!(f, "<{} bytes>", v.len()),
		}
	}
}

impl From<&str> for MetadataValue {
	fn from(value: &str) -> Self {
		MetadataValue::Text(value.to_string())
	}
}

impl From<String> for MetadataValue {
	fn from(value: String) -> Self {
		MetadataValue::Text(value)
	}
}

impl From<i32> for MetadataValue {
	fn from(value: i32) -> Self {
		MetadataValue::Integer(value)
	}
}

impl From<i64> for MetadataValue {
	fn from(value: i64) -> Self {
		MetadataValue::Long(value)
	}
}

impl From<f64> for MetadataValue {
	fn from(value: f64) -> Self {
		MetadataValue::Double(value)
	}
}

impl From<Vec<u8>> for MetadataValue {
	fn from(value: Vec<u8>) -> Self {
		MetadataValue::Blob(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(MetadataValue::from(7), Some(7))]
	#[case(MetadataValue::from(7_i64), Some(7))]
	#[case(MetadataValue::from(" 12 "), Some(12))]
	#[case(MetadataValue::from("twelve"), None)]
	#[case(MetadataValue::from(1.5), None)]
	#[case(MetadataValue::from(vec![1u8]), None)]
	fn as_i64(#[case] value: MetadataValue, #[case] expected: Option<i64>) {
		assert_eq!(value.as_i64(), expected);
	}

	#[test]
	fn text_access_and_display() {
		let value = MetadataValue::from("pbf");
		assert_eq!(value.as_str(), Some("pbf"));
		assert_eq!(value.to_string(), "pbf");
		assert_eq!(value.type_name(), "text");
		assert_eq!(MetadataValue::from(3).as_str(), None);
		assert_eq!(format!("{:?}", MetadataValue::from(vec![0u8; 4])), "Blob(4 bytes)");
	}
}
