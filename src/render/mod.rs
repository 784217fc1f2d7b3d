//! Presentation of decoded frames: the sink interface and its wgpu backend.

pub mod sink;
pub mod upload;

#[cfg(feature = "gpu")]
pub mod context;
#[cfg(feature = "gpu")]
pub mod mipmap;
#[cfg(feature = "gpu")]
pub mod quad;
#[cfg(feature = "gpu")]
pub mod shader;
#[cfg(feature = "gpu")]
pub mod texture;

pub use sink::{PresentationSink, Rect, SinkError, TextureId};

#[cfg(feature = "gpu")]
pub use context::GpuContext;
#[cfg(feature = "gpu")]
pub use texture::{GpuTexture, TEXTURE_FORMAT};
