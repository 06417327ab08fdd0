//! Lossy JPEG encoding. Only 8-bit grey and RGB images are accepted since
//! JPEG has no alpha channel.

use super::bits_per_value;
use anyhow::{Result, anyhow, bail};
use image::{DynamicImage, ImageEncoder, ImageFormat, codecs::jpeg::JpegEncoder, load_from_memory_with_format};
use tessera_core::Blob;
use tessera_derive::context;

/// Encode `image` with `quality` in `1..=100`.
#[context("encoding {}x{} {:?} as JPEG (q={})", image.width(), image.height(), image.color(), quality)]
pub fn encode(image: &DynamicImage, quality: u8) -> Result<Blob> {
	if bits_per_value(image) != 8 {
		bail!("JPEG only supports 8-bit images");
	}
	if !(1..=100).contains(&quality) {
		bail!("JPEG quality must be within 1..=100");
	}
	if !matches!(image.color().channel_count(), 1 | 3) {
		bail!("JPEG only supports Grey or RGB images without alpha channel");
	}

	let mut buffer: Vec<u8> = Vec::new();
	JpegEncoder::new_with_quality(&mut buffer, quality).write_image(
		image.as_bytes(),
		image.width(),
		image.height(),
		image.color().into(),
	)?;

	Ok(Blob::from(buffer))
}

#[context("decoding JPEG image ({} bytes)", blob.len())]
pub fn decode(blob: &Blob) -> Result<DynamicImage> {
	load_from_memory_with_format(blob.as_slice(), ImageFormat::Jpeg)
		.map_err(|e| anyhow!("failed to decode JPEG image: {e}"))
}
