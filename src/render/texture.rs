//! wgpu-backed presentation sink.

use std::sync::atomic::{AtomicU64, Ordering};

use wgpu::*;

use crate::core::geometry::UploadRegion;
use crate::render::context::GpuContext;
use crate::render::mipmap::MipGenerator;
use crate::render::quad::{QuadRenderer, QuadUniform};
use crate::render::sink::{PresentationSink, Rect, SinkError, TextureId};
use crate::render::upload::{expand_rgb24_to_rgba, mip_level_count, RGBA_BYTES_PER_PIXEL};

/// Format of every video texture. RGB24 frames are expanded to it on upload.
pub const TEXTURE_FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

struct RenderTarget {
    view: TextureView,
    width: u32,
    height: u32,
}

/// Mipmapped RGBA texture sized to a video's display geometry
pub struct GpuTexture {
    context: GpuContext,
    id: TextureId,
    texture: Texture,
    view: TextureView,
    sampler: Sampler,
    width: u32,
    height: u32,
    mip_level_count: u32,
    staging: Vec<u8>,
    mips: MipGenerator,
    quad: QuadRenderer,
    target: Option<RenderTarget>,
}

impl GpuTexture {
    /// Create a texture for a `width` x `height` picture, drawable into
    /// targets of `target_format`
    pub fn new(
        context: GpuContext,
        width: u32,
        height: u32,
        target_format: TextureFormat,
    ) -> Result<Self, SinkError> {
        if width == 0 || height == 0 {
            return Err(SinkError::Wgpu(format!(
                "cannot create a {}x{} texture",
                width, height
            )));
        }

        let device = context.device();
        let max_dimension = device.limits().max_texture_dimension_2d;
        if width > max_dimension || height > max_dimension {
            return Err(SinkError::Wgpu(format!(
                "{}x{} texture exceeds the device limit of {}",
                width, height, max_dimension
            )));
        }

        let mip_level_count = mip_level_count(width, height);

        let texture = device.create_texture(&TextureDescriptor {
            label: Some("video texture"),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: TextureUsages::TEXTURE_BINDING
                | TextureUsages::COPY_DST
                | TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&TextureViewDescriptor::default());

        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("video sampler"),
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            address_mode_w: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: FilterMode::Linear,
            ..Default::default()
        });

        let mips = MipGenerator::new(device, TEXTURE_FORMAT);
        let quad = QuadRenderer::new(device, target_format);
        let id = TextureId(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed));

        log::debug!(
            "created texture {} ({}x{}, {} mip levels)",
            id,
            width,
            height,
            mip_level_count
        );

        Ok(Self {
            context,
            id,
            texture,
            view,
            sampler,
            width,
            height,
            mip_level_count,
            staging: Vec::new(),
            mips,
            quad,
            target: None,
        })
    }

    /// Bind the view that subsequent draws render into
    pub fn set_target(&mut self, view: TextureView, width: u32, height: u32) {
        self.target = Some(RenderTarget {
            view,
            width,
            height,
        });
    }

    pub fn clear_target(&mut self) {
        self.target = None;
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mip_level_count(&self) -> u32 {
        self.mip_level_count
    }
}

impl PresentationSink for GpuTexture {
    fn texture_id(&self) -> TextureId {
        self.id
    }

    fn upload(&mut self, region: &UploadRegion, pixels: &[u8]) -> Result<(), SinkError> {
        if region.width != self.width || region.height != self.height {
            return Err(SinkError::Upload(format!(
                "region {}x{} does not match texture {}x{}",
                region.width, region.height, self.width, self.height
            )));
        }

        expand_rgb24_to_rgba(region, pixels, &mut self.staging)?;

        self.context.queue().write_texture(
            ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: Origin3d::ZERO,
                aspect: TextureAspect::All,
            },
            &self.staging,
            ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.width * RGBA_BYTES_PER_PIXEL as u32),
                rows_per_image: Some(self.height),
            },
            Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn regenerate_mips(&mut self) -> Result<(), SinkError> {
        self.mips.generate(
            self.context.device(),
            self.context.queue(),
            &self.texture,
            self.mip_level_count,
        );
        Ok(())
    }

    fn draw(&mut self, rect: Rect, alpha: f32) -> Result<(), SinkError> {
        let target = self.target.as_ref().ok_or(SinkError::NoTarget)?;
        let uniform = QuadUniform::new(rect.to_ndc(target.width, target.height), alpha);

        self.quad.draw(
            self.context.device(),
            self.context.queue(),
            &self.view,
            &self.sampler,
            &target.view,
            uniform,
        );
        Ok(())
    }
}
