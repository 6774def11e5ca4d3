//! Image decode, letterboxing and PNG encoding shared by the exporters.

use forge_core::ImageData;
use forge_error::{MediaError, MediaErrorKind};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Letterbox background.
pub(crate) const BACKDROP: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Decode an encoded panel image.
pub(crate) fn decode(image: &ImageData) -> Result<DynamicImage, MediaError> {
    image::load_from_memory(&image.bytes)
        .map_err(|e| {
            MediaError::new(MediaErrorKind::ImageDecode(format!("{} panel: {e}", image.mime)))
        })
}

/// Scale `image` to fit a `size`x`size` square, centred on a black backdrop.
pub(crate) fn letterbox(image: &DynamicImage, size: u32) -> RgbaImage {
    let scaled = image.resize(size, size, FilterType::Triangle).to_rgba8();
    let mut canvas = RgbaImage::from_pixel(size, size, BACKDROP);
    let x = (size - scaled.width()) / 2;
    let y = (size - scaled.height()) / 2;
    imageops::overlay(&mut canvas, &scaled, i64::from(x), i64::from(y));
    canvas
}

/// Encode an RGBA buffer as PNG.
pub(crate) fn encode_png(image: RgbaImage) -> Result<Vec<u8>, MediaError> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| MediaError::new(MediaErrorKind::ImageEncode(e.to_string())))?;
    Ok(bytes)
}
