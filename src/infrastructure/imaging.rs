//! Image re-encoding for "save image as"

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::ActionResult;

/// Bytes hidden in every saved image
pub const WATERMARK: &[u8] = b"rightmenu";

/// Decode an image, embed the blind watermark and encode it as PNG.
///
/// The mark lives in the least significant bit of the blue channel, repeated
/// across the whole surface, so no channel value moves by more than one.
pub fn watermark_png(bytes: &[u8]) -> ActionResult<Vec<u8>> {
    let mut surface = image::load_from_memory(bytes)?.to_rgba8();
    embed_watermark(&mut surface, WATERMARK);

    let mut out = Vec::new();
    DynamicImage::ImageRgba8(surface).write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    Ok(out)
}

fn watermark_bit(mark: &[u8], index: usize) -> u8 {
    let byte = mark[(index / 8) % mark.len()];
    (byte >> (7 - index % 8)) & 1
}

pub fn embed_watermark(surface: &mut RgbaImage, mark: &[u8]) {
    if mark.is_empty() {
        return;
    }
    for (index, pixel) in surface.pixels_mut().enumerate() {
        pixel.0[2] = (pixel.0[2] & !1) | watermark_bit(mark, index);
    }
}

/// First `len` watermark bytes read back from a surface
pub fn read_watermark(surface: &RgbaImage, len: usize) -> Vec<u8> {
    let bits: Vec<u8> = surface.pixels().take(len * 8).map(|p| p.0[2] & 1).collect();
    bits.chunks(8)
        .filter(|chunk| chunk.len() == 8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, bit| (acc << 1) | bit))
        .collect()
}

/// The saved file is always PNG, whatever the source was
pub fn png_file_name(name: &str) -> String {
    Path::new(name)
        .with_extension("png")
        .to_string_lossy()
        .into_owned()
}
