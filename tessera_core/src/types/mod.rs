//! Contains types like coordinates, bounding boxes, zoom levels and tile matrices.

mod blob;
pub use blob::*;

mod envelope;
pub use envelope::*;

mod geo_bbox;
pub use geo_bbox::*;

mod metadata;
pub use metadata::*;

mod tile_bbox;
pub use tile_bbox::*;

mod tile_coord;
pub use tile_coord::*;

mod tile_matrix;
pub use tile_matrix::*;

pub mod web_mercator;

mod zoom_level;
pub use zoom_level::*;
