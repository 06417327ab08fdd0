//! Tile image encoding for tessera containers.
//!
//! Images with an alpha channel are stored losslessly as PNG, everything else as JPEG
//! with quality [`DEFAULT_JPEG_QUALITY`]. Decoding guesses the format from the payload.

pub mod format;

mod tile;
pub use tile::*;

pub use image::DynamicImage;
