use crate::SchemaKind;
use std::{sync::Arc, time::Duration};

/// Settings shared by all containers a provider creates or opens.
#[derive(Clone, Debug)]
pub struct ContainerConfig {
	/// Byte threshold of the buffered write path. `0` writes every tile synchronously.
	pub tile_write_buffer: usize,
	/// Layout created for new containers, in addition to the flat layout.
	pub default_schema: SchemaKind,
	/// How long a caller waits for the container's database connection.
	pub connection_timeout: Duration,
}

impl ContainerConfig {
	#[must_use]
	pub fn arc(self) -> Arc<Self> {
		Arc::new(self)
	}

	pub fn with_tile_write_buffer(mut self, bytes: usize) -> Self {
		self.tile_write_buffer = bytes;
		self
	}

	pub fn with_default_schema(mut self, schema: SchemaKind) -> Self {
		self.default_schema = schema;
		self
	}

	/// Select the default schema by its name (`"default"` or `"omt"`).
	/// Unknown names keep the current setting, `None` resets it to the flat layout.
	pub fn with_default_schema_name(mut self, name: Option<&str>) -> Self {
		match name {
			None => self.default_schema = SchemaKind::Flat,
			Some(name) => match SchemaKind::from_name(name) {
				Some(schema) => self.default_schema = schema,
				None => log::warn!("unknown MBTiles schema '{name}', keeping '{}'", self.default_schema.name()),
			},
		}
		self
	}

	pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
		self.connection_timeout = timeout;
		self
	}

	pub(crate) fn is_buffered(&self) -> bool {
		self.tile_write_buffer > 0
	}
}

impl Default for ContainerConfig {
	fn default() -> Self {
		Self {
			tile_write_buffer: 0,
			default_schema: SchemaKind::Flat,
			connection_timeout: Duration::from_secs(30),
		}
	}
}
