use super::bits_per_value;
use anyhow::{Result, anyhow, bail};
use image::{DynamicImage, ImageEncoder, ImageFormat, codecs::png::PngEncoder, load_from_memory_with_format};
use tessera_core::Blob;
use tessera_derive::context;

/// Encode an 8 or 16 bit image as PNG.
#[context("encoding {}x{} {:?} as PNG", image.width(), image.height(), image.color())]
pub fn encode(image: &DynamicImage) -> Result<Blob> {
	if !matches!(bits_per_value(image), 8 | 16) {
		bail!("PNG only supports 8 or 16 bit images");
	}

	let mut buffer: Vec<u8> = Vec::new();
	PngEncoder::new(&mut buffer).write_image(
		image.as_bytes(),
		image.width(),
		image.height(),
		image.color().into(),
	)?;

	Ok(Blob::from(buffer))
}

#[context("decoding PNG image ({} bytes)", blob.len())]
pub fn decode(blob: &Blob) -> Result<DynamicImage> {
	load_from_memory_with_format(blob.as_slice(), ImageFormat::Png).map_err(|e| anyhow!("failed to decode PNG image: {e}"))
}
