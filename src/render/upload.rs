//! CPU-side helpers for getting RGB24 frames into RGBA textures.

use crate::core::geometry::{UploadRegion, RGB24_BYTES_PER_PIXEL};
use crate::render::sink::SinkError;

pub const RGBA_BYTES_PER_PIXEL: usize = 4;

/// Number of mip levels down to 1x1 for a `width` x `height` texture.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    u32::BITS - largest.leading_zeros()
}

/// Expands the rows `region` selects from an RGB24 buffer into tightly packed
/// RGBA8 with opaque alpha. Row order is kept, so the first row written is the
/// first row after the skipped padding.
///
/// `out` is cleared and reused; its allocation survives across frames.
pub fn expand_rgb24_to_rgba(
    region: &UploadRegion,
    pixels: &[u8],
    out: &mut Vec<u8>,
) -> Result<(), SinkError> {
    let required = region.required_len();
    if pixels.len() < required {
        return Err(SinkError::Upload(format!(
            "buffer holds {} bytes, region needs {}",
            pixels.len(),
            required
        )));
    }

    let width = region.width as usize;
    let stride = region.source_row_bytes();
    let offset = region.byte_offset();

    out.clear();
    out.reserve(width * region.height as usize * RGBA_BYTES_PER_PIXEL);
    for row in 0..region.height as usize {
        let start = offset + row * stride;
        let src = &pixels[start..start + width * RGB24_BYTES_PER_PIXEL];
        for rgb in src.chunks_exact(RGB24_BYTES_PER_PIXEL) {
            out.extend_from_slice(&[rgb[0], rgb[1], rgb[2], u8::MAX]);
        }
    }
    Ok(())
}
