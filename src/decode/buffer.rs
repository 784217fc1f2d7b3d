//! Backing pixel storage for converted frames.

use crate::core::geometry::Geometry;
use crate::decode::error::OpenError;
use crate::decode::orientation::MAX_PLANES;

/// One contiguous RGB24 frame at buffer geometry. Never resized after creation.
#[derive(Debug)]
pub struct PixelBuffer {
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a zeroed buffer, reporting allocation failure instead of aborting.
    pub fn alloc(len: usize) -> Result<Self, OpenError> {
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| OpenError::Allocation(format!("{} byte pixel buffer: {}", len, e)))?;
        data.resize(len, 0);
        Ok(Self { data })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Plane layout of the converted frame inside its [`PixelBuffer`].
///
/// Fixed once at construction: packed RGB24 uses a single plane starting at
/// offset 0 with a stride of `buffer_width * 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertedFrame {
    offsets: [usize; MAX_PLANES],
    strides: [i32; MAX_PLANES],
    required_len: usize,
}

impl ConvertedFrame {
    pub fn rgb24(geometry: &Geometry) -> Self {
        let mut strides = [0; MAX_PLANES];
        strides[0] = geometry.buffer_row_len() as i32;
        Self {
            offsets: [0; MAX_PLANES],
            strides,
            required_len: geometry.buffer_len(),
        }
    }

    pub fn strides(&self) -> [i32; MAX_PLANES] {
        self.strides
    }

    pub fn offsets(&self) -> [usize; MAX_PLANES] {
        self.offsets
    }

    /// Write pointers for each plane into `buffer`, null for unused planes.
    ///
    /// Returns `None` if `buffer` is too small for this layout.
    pub fn data_pointers(&self, buffer: &mut PixelBuffer) -> Option<[*mut u8; MAX_PLANES]> {
        if buffer.len() < self.required_len {
            return None;
        }
        let base = buffer.as_mut_slice().as_mut_ptr();
        let mut planes = [std::ptr::null_mut(); MAX_PLANES];
        for plane in 0..MAX_PLANES {
            if self.strides[plane] != 0 {
                // In bounds: offsets are within required_len <= buffer.len()
                planes[plane] = base.wrapping_add(self.offsets[plane]);
            }
        }
        Some(planes)
    }

    fn row_range(&self, row: usize) -> Option<std::ops::Range<usize>> {
        let stride = self.strides[0] as usize;
        let start = row.checked_mul(stride)?.checked_add(self.offsets[0])?;
        Some(start..start.checked_add(stride)?)
    }

    /// Row `row` of plane 0 within `buffer`, `None` past the last row
    pub fn row<'a>(&self, buffer: &'a PixelBuffer, row: usize) -> Option<&'a [u8]> {
        buffer.as_slice().get(self.row_range(row)?)
    }

    /// Mutable row `row` of plane 0 within `buffer`, `None` past the last row
    pub fn row_mut<'a>(&self, buffer: &'a mut PixelBuffer, row: usize) -> Option<&'a mut [u8]> {
        let range = self.row_range(row)?;
        buffer.as_mut_slice().get_mut(range)
    }
}
