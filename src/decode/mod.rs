//! Frame pipeline: stream discovery, packet decoding, orientation and
//! pixel format conversion.

pub mod backend;
pub mod buffer;
pub mod error;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod orientation;
pub mod source;
pub mod stream_info;
#[cfg(test)]
pub(crate) mod synthetic;

pub use backend::{Backend, Container, Converter, FrameDecoder, Packet, RawFrame, Receive};
pub use buffer::{ConvertedFrame, PixelBuffer};
pub use error::{BackendError, DecodeError, OpenError};
#[cfg(feature = "ffmpeg")]
pub use ffmpeg::FfmpegBackend;
pub use orientation::{flip_rows, plane_rows, FlippedView, MAX_PLANES};
pub use source::MediaSource;
pub use stream_info::{CodecParams, MediaKind, SourceFormat, StreamInfo};
