//! Display and buffer geometry of a decoded video.

use serde::{Deserialize, Serialize};

/// Target pixel format of the converted frame: packed 24-bit RGB.
pub const RGB24_BYTES_PER_PIXEL: usize = 3;

/// Picture geometry of one opened video.
///
/// `width`/`height` is the size meant to be shown. `buffer_width`/`buffer_height`
/// is what the decoder allocates and may be padded for alignment; it is never
/// smaller than the display size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub buffer_width: u32,
    pub buffer_height: u32,
    pub pixel_aspect_ratio: f64,
}

impl Geometry {
    /// Builds a geometry, widening the buffer to at least the display size and
    /// replacing a non-positive aspect ratio with 1.0.
    pub fn new(width: u32, height: u32, buffer_width: u32, buffer_height: u32, par: f64) -> Self {
        Self {
            width,
            height,
            buffer_width: buffer_width.max(width),
            buffer_height: buffer_height.max(height),
            pixel_aspect_ratio: if par.is_finite() && par > 0.0 { par } else { 1.0 },
        }
    }

    /// `(width, height / par)`: height corrected for non-square pixels.
    pub fn display_size(&self) -> (f64, f64) {
        (
            self.width as f64,
            self.height as f64 / self.pixel_aspect_ratio,
        )
    }

    /// Bytes of one RGB24 frame at buffer geometry, rows packed without padding.
    pub fn buffer_len(&self) -> usize {
        self.buffer_row_len() * self.buffer_height as usize
    }

    pub fn buffer_row_len(&self) -> usize {
        self.buffer_width as usize * RGB24_BYTES_PER_PIXEL
    }

    /// Region of the buffer holding the display-size picture.
    ///
    /// Rows are stored bottom-up, so padding rows of the source end up at the
    /// start of the buffer and are skipped.
    pub fn upload_region(&self) -> UploadRegion {
        UploadRegion {
            width: self.width,
            height: self.height,
            skip_rows: self.buffer_height - self.height,
            row_length: self.buffer_width,
            alignment: 1,
        }
    }
}

/// Sub-region upload parameters for a presentation sink, all in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadRegion {
    pub width: u32,
    pub height: u32,
    pub skip_rows: u32,
    pub row_length: u32,
    pub alignment: u32,
}

impl UploadRegion {
    /// Byte offset of the first uploaded row within an RGB24 buffer.
    pub fn byte_offset(&self) -> usize {
        self.skip_rows as usize * self.source_row_bytes()
    }

    /// Bytes between consecutive rows in the source buffer.
    pub fn source_row_bytes(&self) -> usize {
        let unaligned = self.row_length as usize * RGB24_BYTES_PER_PIXEL;
        let align = self.alignment.max(1) as usize;
        unaligned.div_ceil(align) * align
    }

    /// Smallest source buffer length this region can be read from.
    pub fn required_len(&self) -> usize {
        if self.height == 0 {
            return self.byte_offset();
        }
        self.byte_offset()
            + (self.height as usize - 1) * self.source_row_bytes()
            + self.width as usize * RGB24_BYTES_PER_PIXEL
    }
}
