//! The 3D renderer as seen by the emulator core.
//!
//! `Renderer3d` owns the device, the frame pipeline and the scanline mirror.
//! All calls come from one thread; the only one that blocks is
//! `request_line(0)`.

mod config;

use anyhow::{Context, Result};

use crate::device::Gpu;
use crate::geometry::Polygon;
use crate::render::{
    read_aux, CapacityError, FrameRenderer, FrameResources, FrameStats, OverflowPolicy,
    ReadbackError, ScanlineReadback,
};

pub use config::RendererConfig;

pub struct Renderer3d {
    gpu: Gpu,
    frame: FrameRenderer,
    readback: ScanlineReadback,
}

impl Renderer3d {
    /// Creates the device, resolves its entry points and builds both shader
    /// variants and all frame resources.
    ///
    /// Fails without a usable renderer on any missing entry point, shader
    /// compile/link error, or adapter/device failure.
    pub async fn open(config: RendererConfig) -> Result<Self> {
        let gpu = Gpu::new(&config.gpu).await?;

        let frame = FrameRenderer::new(
            &gpu.render_ctx(),
            config.clear_color,
            config.overflow_policy,
        )
        .context("failed to build render shaders")?;

        log::info!(
            "3d renderer ready on {} (overflow policy: {:?})",
            gpu.adapter_info().name,
            config.overflow_policy
        );

        Ok(Self {
            gpu,
            frame,
            readback: ScanlineReadback::new(),
        })
    }

    /// [`open`](Self::open) driven to completion on the calling thread.
    pub fn open_blocking(config: RendererConfig) -> Result<Self> {
        pollster::block_on(Self::open(config))
    }

    /// Renders one frame and queues its color readback. Does not wait for
    /// the GPU.
    pub fn render_frame(&mut self, polygons: &[Polygon]) -> Result<FrameStats, CapacityError> {
        self.frame.render(&self.gpu.render_ctx(), polygons)
    }

    /// Signals that the consumer is about to read `line`.
    ///
    /// Line 0 waits for the last rendered frame and refreshes the mirror.
    pub fn request_line(&mut self, line: usize) -> Result<(), ReadbackError> {
        self.readback.request_line(
            &self.gpu.render_ctx(),
            &self.frame.resources().readback,
            line,
        )
    }

    /// 256 pixel words of `line`. Valid once `request_line(0)` has been
    /// called for the current frame.
    pub fn get_line(&self, line: usize) -> Result<&[u32], ReadbackError> {
        self.readback.get_line(line)
    }

    /// Byte view of [`get_line`](Self::get_line): R, G, B, A per pixel.
    pub fn line_bytes(&self, line: usize) -> Result<&[u8], ReadbackError> {
        self.readback.line_bytes(line)
    }

    /// The whole mirrored frame.
    pub fn frame(&self) -> &[u32] {
        self.readback.frame()
    }

    /// Reads back the per-pixel aux image. Blocks.
    pub fn read_aux(&self) -> Result<Vec<[u32; 2]>, ReadbackError> {
        read_aux(&self.gpu.render_ctx(), &self.frame.resources().aux)
    }

    /// Nothing is cached between frames, so there is nothing to reset.
    pub fn reset(&mut self) {
        log::debug!("3d renderer reset");
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.frame.assembler().policy()
    }

    /// Applies from the next `render_frame` on.
    pub fn set_overflow_policy(&mut self, policy: OverflowPolicy) {
        log::debug!("overflow policy set to {policy:?}");
        self.frame.set_overflow_policy(policy);
    }

    /// Long-lived GPU objects (targets, geometry and readback buffers).
    pub fn resources(&self) -> &FrameResources {
        self.frame.resources()
    }

    pub fn frame_index(&self) -> u64 {
        self.frame.frame_index()
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    /// Waits for in-flight work, then releases every GPU object.
    pub fn close(self) {
        self.gpu.wait_idle();
        log::info!("3d renderer closed after {} frames", self.frame.frame_index());
    }
}
