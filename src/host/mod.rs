//! Host-facing video object: a decode session bound to one presentation sink.

use std::path::Path;

use crate::config::VideoConfig;
use crate::decode::backend::Backend;
use crate::decode::error::OpenError;
use crate::decode::source::MediaSource;
use crate::playback::state::Status;
use crate::render::sink::{PresentationSink, Rect, SinkError, TextureId};

/// Opacity used when the host does not pass one to `draw`
pub const DEFAULT_ALPHA: f32 = 1.0;

/// What a scripting host holds for one loaded video
pub struct VideoHandle<B: Backend, S: PresentationSink> {
    source: MediaSource<B>,
    sink: S,
}

impl<B: Backend, S: PresentationSink> VideoHandle<B, S> {
    /// Open `path` and bind the sink the frames are presented to
    pub fn open_with<P: AsRef<Path>>(
        backend: &B,
        path: P,
        config: VideoConfig,
        sink: S,
    ) -> Result<Self, OpenError> {
        let source = MediaSource::open_with(backend, path, config)?;
        Ok(Self::from_parts(source, sink))
    }

    pub fn from_parts(source: MediaSource<B>, sink: S) -> Self {
        Self { source, sink }
    }

    /// Playback state plus the display size and fps
    pub fn state(&self) -> Status {
        self.source.state()
    }

    /// Draw the last presented frame over `(x1, y1)`-`(x2, y2)`
    pub fn draw(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        alpha: Option<f32>,
    ) -> Result<(), SinkError> {
        self.sink
            .draw(Rect::new(x1, y1, x2, y2), alpha.unwrap_or(DEFAULT_ALPHA))
    }

    /// Decode the next frame and upload it to the sink.
    ///
    /// Returns false once the video is finished. A frame that decoded but
    /// could not be uploaded still counts as advanced.
    pub fn next(&mut self) -> bool {
        if !self.source.advance() {
            return false;
        }
        if let Err(err) = self.source.present_current_frame(&mut self.sink) {
            log::warn!("failed to present frame: {}", err);
        }
        true
    }

    /// `(width, height / par)`
    pub fn size(&self) -> (f64, f64) {
        self.source.display_size()
    }

    pub fn fps(&self) -> f64 {
        self.source.fps()
    }

    pub fn texture_id(&self) -> TextureId {
        self.sink.texture_id()
    }

    /// Release the decode session now. `state()` reports finished afterwards;
    /// later calls, and the drop that follows, do nothing more.
    pub fn dispose(&mut self) {
        self.source.release();
    }

    pub fn source(&self) -> &MediaSource<B> {
        &self.source
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

#[cfg(all(feature = "ffmpeg", feature = "gpu"))]
impl VideoHandle<crate::decode::ffmpeg::FfmpegBackend, crate::render::texture::GpuTexture> {
    /// Open `path` with FFmpeg and present into a new texture of its display
    /// size, drawable into targets of `target_format`
    pub fn open<P: AsRef<Path>>(
        path: P,
        config: VideoConfig,
        context: crate::render::context::GpuContext,
        target_format: wgpu::TextureFormat,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let source = MediaSource::open_config(path, config)?;
        let geometry = source.geometry();
        let texture = crate::render::texture::GpuTexture::new(
            context,
            geometry.width,
            geometry.height,
            target_format,
        )?;
        Ok(Self::from_parts(source, texture))
    }
}
