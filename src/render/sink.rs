//! Presentation sink interface: where decoded frames end up.

use std::fmt;

use crate::core::geometry::UploadRegion;

/// Error type for presentation operations
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("no decoded frame to present")]
    NoFrame,
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("no render target bound")]
    NoTarget,
    #[error("draw failed: {0}")]
    Draw(String),
    #[error("wgpu error: {0}")]
    Wgpu(String),
}

/// Host-visible identifier of a sink's texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Screen rectangle of a draw, in target pixels. `(x1, y1)` receives the
/// top of the picture and `(x2, y2)` its bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Rect {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Corners in normalized device coordinates for a `width` x `height`
    /// target with its origin at the top left: `[x1, y1, x2, y2]`.
    pub fn to_ndc(&self, width: u32, height: u32) -> [f32; 4] {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        [
            self.x1 / w * 2.0 - 1.0,
            1.0 - self.y1 / h * 2.0,
            self.x2 / w * 2.0 - 1.0,
            1.0 - self.y2 / h * 2.0,
        ]
    }
}

/// A texture-like target for RGB24 frames
pub trait PresentationSink {
    fn texture_id(&self) -> TextureId;

    /// Copy `region` of an RGB24 buffer (bottom row first) into the texture
    fn upload(&mut self, region: &UploadRegion, pixels: &[u8]) -> Result<(), SinkError>;

    /// Rebuild every mip level from level 0
    fn regenerate_mips(&mut self) -> Result<(), SinkError>;

    /// Draw the texture as a quad over `rect` with opacity `alpha`
    fn draw(&mut self, rect: Rect, alpha: f32) -> Result<(), SinkError>;
}
