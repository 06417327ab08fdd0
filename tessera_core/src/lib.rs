//! Value types shared by the tessera crates: blobs, tile coordinates, bounding boxes,
//! tile matrix geometry and metadata values.

pub mod types;
pub use types::*;
