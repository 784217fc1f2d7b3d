//! vidtex: decode video files into bottom-up RGB frames and present them as
//! textures.

pub mod config;
pub mod core;
pub mod decode;
pub mod host;
pub mod playback;
pub mod render;

pub use config::{ConfigError, ScalingQuality, VideoConfig};
pub use decode::{MediaSource, OpenError};
pub use host::VideoHandle;
pub use playback::{PlaybackState, Status};
pub use render::{PresentationSink, Rect, SinkError, TextureId};
