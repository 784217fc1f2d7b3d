//! Shared wgpu device and queue.

use std::sync::Arc;

use wgpu::*;

use crate::render::sink::SinkError;

/// Device and queue handed to every GPU texture
#[derive(Clone)]
pub struct GpuContext {
    device: Arc<Device>,
    queue: Arc<Queue>,
}

impl GpuContext {
    /// Wrap a host application's existing device
    pub fn from_parts(device: Arc<Device>, queue: Arc<Queue>) -> Self {
        Self { device, queue }
    }

    /// Create a device without a surface, for offscreen use and tests
    pub fn headless() -> Result<Self, SinkError> {
        let instance = Instance::new(InstanceDescriptor {
            backends: Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&RequestAdapterOptions {
            power_preference: PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| SinkError::Wgpu("No adapter found".to_string()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &DeviceDescriptor {
                label: Some("vidtex device"),
                required_features: Features::empty(),
                required_limits: adapter.limits(),
            },
            None,
        ))
        .map_err(|e| SinkError::Wgpu(e.to_string()))?;

        log::debug!("using adapter {:?}", adapter.get_info().name);
        Ok(Self::from_parts(Arc::new(device), Arc::new(queue)))
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }
}
