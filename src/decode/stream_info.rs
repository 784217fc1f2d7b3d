//! Stream metadata extracted from a media container.

use std::fmt;

use crate::core::rational::Rational;

/// Kind of an elementary stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
    Subtitle,
    Data,
    Unknown,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Subtitle => "subtitle",
            MediaKind::Data => "data",
            MediaKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Information about one stream of a container
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub index: usize,
    pub kind: MediaKind,
    pub codec_name: String,
    pub time_base: Rational,
    pub avg_frame_rate: Rational,
}

impl StreamInfo {
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

/// Index of the first video stream, in container order
pub fn first_video_stream(streams: &[StreamInfo]) -> Option<usize> {
    streams.iter().find(|s| s.is_video()).map(|s| s.index)
}

/// Source pixel format as seen by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFormat {
    pub name: String,
    /// Number of data planes a frame of this format carries
    pub planes: u8,
    /// log2 of the vertical chroma subsampling (1 for 4:2:0)
    pub chroma_v_shift: u8,
}

impl SourceFormat {
    /// Planar 4:2:0 YUV, the most common decoder output
    pub fn yuv420p() -> Self {
        Self {
            name: "yuv420p".to_string(),
            planes: 3,
            chroma_v_shift: 1,
        }
    }
}

/// Decoder-reported parameters of the chosen video stream
#[derive(Debug, Clone, PartialEq)]
pub struct CodecParams {
    pub width: u32,
    pub height: u32,
    /// Decode buffer size; equals the display size unless the decoder pads
    pub buffer_width: u32,
    pub buffer_height: u32,
    pub sample_aspect_ratio: Rational,
    pub time_base: Rational,
    pub format: SourceFormat,
}
