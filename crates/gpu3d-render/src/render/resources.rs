//! GPU objects that live for the whole renderer lifetime.

use super::{PackedVertex, RenderCtx, MAX_INDICES, MAX_VERTICES};

pub const SCREEN_WIDTH: u32 = 256;
pub const SCREEN_HEIGHT: u32 = 192;

/// Bytes per color row (4 bytes per pixel).
pub const ROW_BYTES: u32 = SCREEN_WIDTH * 4;

/// Bytes in one full color frame.
pub const FRAME_BYTES: usize = (ROW_BYTES * SCREEN_HEIGHT) as usize;

pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Per-pixel metadata image (two 32-bit channels).
pub const AUX_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg32Uint;

/// Usages of the aux image. It is written and read by copies only; no
/// pipeline binds it.
pub const AUX_USAGES: wgpu::TextureUsages =
    wgpu::TextureUsages::COPY_DST.union(wgpu::TextureUsages::COPY_SRC);

/// Value every aux texel is reset to at the start of a frame.
pub const AUX_SENTINEL: [u32; 2] = [0x00FF_FFFF, 0];

/// Bytes per aux row.
pub const AUX_ROW_BYTES: u32 = SCREEN_WIDTH * 8;

const VERTEX_BUFFER_BYTES: u64 = (MAX_VERTICES * std::mem::size_of::<PackedVertex>()) as u64;
const INDEX_BUFFER_BYTES: u64 = (MAX_INDICES * std::mem::size_of::<u16>()) as u64;

/// Full-screen size used for every attachment.
pub const SCREEN_EXTENT: wgpu::Extent3d = wgpu::Extent3d {
    width: SCREEN_WIDTH,
    height: SCREEN_HEIGHT,
    depth_or_array_layers: 1,
};

/// Vertex/index buffers, the three screen-sized images and the color
/// readback buffer.
///
/// Created once; nothing is reallocated per frame.
pub struct FrameResources {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,

    pub color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth: wgpu::Texture,
    pub depth_view: wgpu::TextureView,
    pub aux: wgpu::Texture,

    /// Host-mappable copy of the color target (`FRAME_BYTES`).
    pub readback: wgpu::Buffer,

    aux_clear: Vec<u8>,
    index_scratch: Vec<u16>,
}

impl FrameResources {
    pub fn new(ctx: &RenderCtx<'_>) -> Self {
        let device = ctx.device;

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gpu3d vertex buffer"),
            size: VERTEX_BUFFER_BYTES,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gpu3d index buffer"),
            size: INDEX_BUFFER_BYTES,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let color = create_target(
            device,
            "gpu3d color target",
            COLOR_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        );
        let depth = create_target(
            device,
            "gpu3d depth target",
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let aux = create_target(device, "gpu3d aux image", AUX_FORMAT, AUX_USAGES);

        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gpu3d color readback"),
            size: FRAME_BYTES as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let aux_clear = bytemuck::cast_slice::<u32, u8>(&AUX_SENTINEL)
            .repeat((SCREEN_WIDTH * SCREEN_HEIGHT) as usize);

        log::debug!(
            "frame resources: {VERTEX_BUFFER_BYTES} B vertices, {INDEX_BUFFER_BYTES} B indices, \
             {SCREEN_WIDTH}x{SCREEN_HEIGHT} targets"
        );

        Self {
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            vertex_buffer,
            index_buffer,
            color,
            depth,
            aux,
            readback,
            aux_clear,
            index_scratch: Vec::with_capacity(MAX_INDICES),
        }
    }

    /// Fills the aux image with [`AUX_SENTINEL`].
    pub fn clear_aux(&self, queue: &wgpu::Queue) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.aux,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &self.aux_clear,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(AUX_ROW_BYTES),
                rows_per_image: Some(SCREEN_HEIGHT),
            },
            SCREEN_EXTENT,
        );
    }

    /// Copies the assembled streams into the geometry buffers.
    ///
    /// Queue writes must be 4-byte sized, so an odd index count is padded with
    /// one trailing zero that the draw never reads.
    pub fn upload(&mut self, queue: &wgpu::Queue, vertices: &[PackedVertex], indices: &[u16]) {
        if !vertices.is_empty() {
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(vertices));
        }

        if indices.is_empty() {
            return;
        }

        if indices.len() % 2 == 0 {
            queue.write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(indices));
        } else {
            self.index_scratch.clear();
            self.index_scratch.extend_from_slice(indices);
            self.index_scratch.push(0);
            queue.write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&self.index_scratch));
        }
    }
}

fn create_target(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: SCREEN_EXTENT,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_pitch_is_copy_aligned() {
        assert_eq!(ROW_BYTES % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT, 0);
        assert_eq!(AUX_ROW_BYTES % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT, 0);
        assert_eq!(FRAME_BYTES, 256 * 192 * 4);
    }

    #[test]
    fn buffers_are_write_aligned() {
        assert_eq!(VERTEX_BUFFER_BYTES % wgpu::COPY_BUFFER_ALIGNMENT, 0);
        assert_eq!(INDEX_BUFFER_BYTES % wgpu::COPY_BUFFER_ALIGNMENT, 0);
    }

    #[test]
    fn aux_image_is_copy_only() {
        assert_eq!(
            AUX_USAGES,
            wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::COPY_SRC
        );
        assert!(!AUX_USAGES.contains(wgpu::TextureUsages::STORAGE_BINDING));
    }

    #[test]
    fn aux_sentinel_bytes() {
        let bytes = bytemuck::cast_slice::<u32, u8>(&AUX_SENTINEL);
        assert_eq!(bytes, &[0xFF, 0xFF, 0xFF, 0x00, 0, 0, 0, 0]);
    }
}
