//! Tile containers backed by SQLite.
//!
//! The crate implements MBTiles containers with two physical layouts (a flat `tiles` table and
//! a normalized `tiles_shallow`/`tiles_data` pair behind a `tiles` view), a typed metadata store,
//! bounds bookkeeping and an optional buffered background writer.
//!
//! ```no_run
//! use tessera_container::*;
//! use tessera_core::TileCoord;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let provider = MBTilesProvider::new(ContainerConfig::default().with_tile_write_buffer(1 << 20));
//!     let container = provider.create(Some("demo"), Path::new("/tmp/demo.mbtiles"), None)?;
//!     container.set_tile(&TileCoord::new(3, 5, 2)?, &[0x01; 100], None)?;
//!     container.dispose()?;
//!     Ok(())
//! }
//! ```

mod bounds;
mod compat;
mod config;
mod container;
mod error;
mod info;
mod metadata;
mod pending;
mod provider;
mod registry;
mod schema;
mod writer;

pub use compat::is_compatible;
pub use config::ContainerConfig;
pub use container::MBTilesContainer;
pub use error::ContainerError;
pub use info::TilesetInfo;
pub use metadata::{CONTENT_IMAGERY, CONTENT_TERRAIN, CONTENT_VECTOR, FORMAT_PBF, FORMAT_PNG, FORMAT_TERRAIN};
pub use provider::{MBTilesProvider, TileContainer, TileContainerProvider};
pub use registry::ContainerRegistry;
pub use schema::{SchemaKind, is_compatible_schema};
