//! Encoders and decoders for the supported tile image formats.

pub mod jpeg;
pub mod png;

use image::DynamicImage;

/// Bits per channel value, e.g. 8 for `Rgb8` and 32 for `Rgba32F`.
pub(crate) fn bits_per_value(image: &DynamicImage) -> u16 {
	let color = image.color();
	u16::from(color.bytes_per_pixel()) * 8 / u16::from(color.channel_count())
}
