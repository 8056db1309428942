use anyhow::{Context, Result};

use crate::render::RenderCtx;

use super::{resolve, AdapterLoader, DeviceFunctions, GpuInit};

/// Owns the wgpu core objects for offscreen rendering.
///
/// This type is the low-level device context:
/// - creates and stores Instance/Adapter/Device/Queue
/// - resolves the device entry points before the device is requested
pub struct Gpu {
    /// wgpu instance used to create the adapter.
    instance: wgpu::Instance,

    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,

    /// Entry points resolved against `adapter`.
    functions: DeviceFunctions,
}

impl Gpu {
    /// Creates a headless GPU context.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu. Fails without
    /// creating a device when any required entry point is missing.
    pub async fn new(init: &GpuInit) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: init.force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        log_adapter(&adapter);

        let functions = resolve(&AdapterLoader::new(&adapter))
            .context("adapter lacks required device entry points")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("gpu3d device"),
                required_features: functions.required_features(),
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            functions,
        })
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    pub fn functions(&self) -> &DeviceFunctions {
        &self.functions
    }

    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    /// Device/queue pair handed to the render stages.
    #[inline]
    pub fn render_ctx(&self) -> RenderCtx<'_> {
        RenderCtx::new(&self.device, &self.queue)
    }

    /// Blocks until all submitted work has finished.
    pub fn wait_idle(&self) {
        if let Err(e) = self.device.poll(wgpu::PollType::wait_indefinitely()) {
            log::warn!("failed to wait for device idle: {e:?}");
        }
    }
}

fn log_adapter(adapter: &wgpu::Adapter) {
    let info = adapter.get_info();
    let limits = adapter.limits();

    log::info!("renderer: {} ({:?})", info.name, info.device_type);
    log::info!("backend: {:?}, driver: {} {}", info.backend, info.driver, info.driver_info);
    log::info!("max texture dimension: {}", limits.max_texture_dimension_2d);
    log::info!("max texture array layers: {}", limits.max_texture_array_layers);
}
