use crate::format::{jpeg, png};
use anyhow::{Result, bail};
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use tessera_core::Blob;
use tessera_derive::context;

pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Encode a tile image: PNG when the image carries an alpha channel, JPEG otherwise.
pub fn encode_tile(image: &DynamicImage) -> Result<Blob> {
	if image.color().has_alpha() {
		png::encode(image)
	} else {
		jpeg::encode(image, DEFAULT_JPEG_QUALITY)
	}
}

/// Decode a tile payload, guessing the image format from its content.
#[context("decoding tile image ({} bytes)", blob.len())]
pub fn decode_tile(blob: &Blob) -> Result<DynamicImage> {
	match image::guess_format(blob.as_slice()) {
		Ok(ImageFormat::Png) => png::decode(blob),
		Ok(ImageFormat::Jpeg) => jpeg::decode(blob),
		Ok(format) => bail!("unsupported tile image format {format:?}"),
		Err(_) => bail!("unknown tile image format"),
	}
}

/// Width and height of an encoded image without decoding the pixels.
///
/// Returns `None` if the payload is not a recognized image.
pub fn probe_dimensions(data: &[u8]) -> Option<(u32, u32)> {
	ImageReader::new(Cursor::new(data))
		.with_guessed_format()
		.ok()?
		.into_dimensions()
		.ok()
		.filter(|(w, h)| *w > 0 && *h > 0)
}
