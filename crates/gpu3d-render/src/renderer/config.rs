use crate::device::GpuInit;
use crate::render::{OverflowPolicy, DEFAULT_CLEAR_COLOR};

/// Configuration for [`Renderer3d::open`](super::Renderer3d::open).
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Adapter and device selection.
    pub gpu: GpuInit,

    /// Background written to every pixel before drawing, in readback byte
    /// order (R, G, B, A).
    pub clear_color: wgpu::Color,

    /// What happens to frames that exceed the staging capacity.
    pub overflow_policy: OverflowPolicy,
}

impl RendererConfig {
    /// Defaults, but on a software adapter.
    pub fn fallback() -> Self {
        let mut config = Self::default();
        config.gpu.force_fallback_adapter = true;
        config
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            gpu: GpuInit::default(),
            clear_color: DEFAULT_CLEAR_COLOR,
            overflow_policy: OverflowPolicy::RejectFrame,
        }
    }
}
