//! Core value types shared by the decode pipeline and the presentation side.
//!
//! Rationals and the metadata normalization rules live here, as does the
//! picture geometry that ties decoder buffers to the presentation sink.

pub mod geometry;
pub mod rational;

pub use geometry::{Geometry, UploadRegion, RGB24_BYTES_PER_PIXEL};
pub use rational::{fix_codec_time_base, frame_rate, pixel_aspect_ratio, Rational};
