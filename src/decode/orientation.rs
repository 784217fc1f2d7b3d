//! Bottom-up row views over top-down decoded frames.
//!
//! Decoders emit rows top to bottom; the presentation side wants them bottom
//! to top. Instead of copying, each plane's start is moved to its last row and
//! its stride negated. The view is computed fresh from the frame's strides on
//! every call, so repeated frames never accumulate flips.

use crate::decode::stream_info::SourceFormat;

/// Maximum number of data planes considered per frame
pub const MAX_PLANES: usize = 4;

/// Reversed-row view of a frame: per-plane byte offset of the first row to
/// read, and the (negated) stride to step between rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlippedView {
    pub offsets: [isize; MAX_PLANES],
    pub strides: [i32; MAX_PLANES],
}

/// Number of rows in each plane of a frame of `format` at `buffer_height`.
///
/// Chroma planes use the format's vertical subsampling, rounded up so odd
/// heights still cover the last chroma row. Planes the format does not carry
/// have zero rows.
pub fn plane_rows(buffer_height: u32, format: &SourceFormat) -> [usize; MAX_PLANES] {
    let full = buffer_height as usize;
    let shift = u32::from(format.chroma_v_shift);
    let chroma = (full + (1 << shift) - 1) >> shift;
    let planes = usize::from(format.planes).min(MAX_PLANES);

    let mut rows = [0; MAX_PLANES];
    for (plane, slot) in rows.iter_mut().enumerate().take(planes) {
        *slot = match plane {
            0 | 3 => full,
            _ => chroma,
        };
    }
    rows
}

/// Reverse the row order of every plane that has both rows and a stride.
pub fn flip_rows(strides: [i32; MAX_PLANES], rows: [usize; MAX_PLANES]) -> FlippedView {
    let mut view = FlippedView {
        offsets: [0; MAX_PLANES],
        strides,
    };
    for plane in 0..MAX_PLANES {
        let stride = strides[plane];
        if stride == 0 || rows[plane] == 0 {
            continue;
        }
        view.offsets[plane] = stride as isize * (rows[plane] as isize - 1);
        view.strides[plane] = -stride;
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray() -> SourceFormat {
        SourceFormat {
            name: "gray".to_string(),
            planes: 1,
            chroma_v_shift: 0,
        }
    }

    #[test]
    fn test_plane_rows_yuv420() {
        assert_eq!(plane_rows(1080, &SourceFormat::yuv420p()), [1080, 540, 540, 0]);
        assert_eq!(plane_rows(5, &SourceFormat::yuv420p()), [5, 3, 3, 0]);
    }

    #[test]
    fn test_plane_rows_packed_and_alpha() {
        assert_eq!(plane_rows(4, &gray()), [4, 0, 0, 0]);
        let yuva = SourceFormat {
            name: "yuva420p".to_string(),
            planes: 4,
            chroma_v_shift: 1,
        };
        assert_eq!(plane_rows(4, &yuva), [4, 2, 2, 4]);
    }

    #[test]
    fn test_flip_rows_yuv420() {
        let rows = plane_rows(8, &SourceFormat::yuv420p());
        let view = flip_rows([64, 32, 32, 0], rows);
        assert_eq!(view.offsets, [64 * 7, 32 * 3, 32 * 3, 0]);
        assert_eq!(view.strides, [-64, -32, -32, 0]);
    }

    #[test]
    fn test_flip_is_not_cumulative() {
        // The decoder hands back the same strides every frame; the view must
        // be identical each time it is derived.
        let rows = plane_rows(8, &SourceFormat::yuv420p());
        let first = flip_rows([64, 32, 32, 0], rows);
        let second = flip_rows([64, 32, 32, 0], rows);
        assert_eq!(first, second);
    }

    #[test]
    fn test_flip_visits_rows_bottom_up() {
        let rows = plane_rows(3, &gray());
        let view = flip_rows([10, 0, 0, 0], rows);
        let visited: Vec<isize> = (0..3)
            .map(|r| view.offsets[0] + r * view.strides[0] as isize)
            .collect();
        assert_eq!(visited, vec![20, 10, 0]);
    }

    #[test]
    fn test_zero_height_leaves_planes_untouched() {
        let view = flip_rows([10, 5, 5, 0], [0; MAX_PLANES]);
        assert_eq!(view.offsets, [0; MAX_PLANES]);
        assert_eq!(view.strides, [10, 5, 5, 0]);
    }
}
