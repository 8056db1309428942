use super::resolver::{Capability, EntryPoint, ProcLoader};
use crate::render::{AUX_FORMAT, AUX_USAGES, COLOR_FORMAT, DEPTH_FORMAT, FRAME_BYTES, MAX_VERTICES};
use crate::render::PackedVertex;

/// Answers entry point lookups by inspecting a wgpu adapter.
pub struct AdapterLoader<'a> {
    adapter: &'a wgpu::Adapter,
}

impl<'a> AdapterLoader<'a> {
    pub fn new(adapter: &'a wgpu::Adapter) -> Self {
        Self { adapter }
    }

    fn format_allows(&self, format: wgpu::TextureFormat, usages: wgpu::TextureUsages) -> bool {
        self.adapter
            .get_texture_format_features(format)
            .allowed_usages
            .contains(usages)
    }
}

impl ProcLoader for AdapterLoader<'_> {
    fn get_proc_address(&self, name: &str) -> Option<Capability> {
        let entry = EntryPoint::ALL.into_iter().find(|e| e.name() == name)?;
        let limits = self.adapter.limits();

        let available = match entry {
            EntryPoint::ColorTarget => self.format_allows(
                COLOR_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            ),
            EntryPoint::DepthTarget => {
                self.format_allows(DEPTH_FORMAT, wgpu::TextureUsages::RENDER_ATTACHMENT)
            }
            EntryPoint::AuxImage => self.format_allows(AUX_FORMAT, AUX_USAGES),
            EntryPoint::GeometryBuffers => {
                let vertex_bytes = (MAX_VERTICES * std::mem::size_of::<PackedVertex>()) as u64;
                limits.max_buffer_size >= vertex_bytes.max(FRAME_BYTES as u64)
            }
            EntryPoint::IntegerVertexAttributes => {
                limits.max_vertex_attributes >= PackedVertex::ATTRIBUTE_COUNT
                    && limits.max_vertex_buffer_array_stride
                        >= std::mem::size_of::<PackedVertex>() as u32
            }
            EntryPoint::ShaderModules
            | EntryPoint::FragmentDepth
            | EntryPoint::DrawIndexed
            | EntryPoint::PixelPack
            | EntryPoint::MapRead => true,
        };

        available.then_some(Capability::Core)
    }
}
