use crate::geometry::Polygon;

use super::{
    Assembler, CapacityError, FrameResources, OverflowPolicy, RenderCtx, RenderTarget,
    ShaderBuildError, ShaderSet, ShaderVariant, ROW_BYTES, SCREEN_EXTENT, SCREEN_HEIGHT,
    SCREEN_WIDTH,
};

/// Background written by the color clear: black, alpha 31/255.
///
/// Channels are given in readback byte order (R, G, B, A).
pub const DEFAULT_CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 31.0 / 255.0,
};

/// Per-frame output counts.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    /// 1-based index of the frame since the renderer was opened.
    pub frame_index: u64,
    /// `None` for an empty polygon list.
    pub variant: Option<ShaderVariant>,
    pub vertices: u32,
    pub triangles: u32,
    pub dropped_polygons: u32,
}

/// Records and submits one frame per call.
///
/// Nothing here blocks; the color copy lands in the readback buffer in
/// submission order and is only waited for by the scanline reader.
pub struct FrameRenderer {
    shaders: ShaderSet,
    resources: FrameResources,
    assembler: Assembler,

    /// Clear value as seen by the BGRA target.
    target_clear: wgpu::Color,
    frame_index: u64,
}

impl FrameRenderer {
    pub fn new(
        ctx: &RenderCtx<'_>,
        clear_color: wgpu::Color,
        policy: OverflowPolicy,
    ) -> Result<Self, ShaderBuildError> {
        let shaders = ShaderSet::build(ctx)?;
        let resources = FrameResources::new(ctx);

        Ok(Self {
            shaders,
            resources,
            assembler: Assembler::new(policy),
            target_clear: bgra_clear(clear_color),
            frame_index: 0,
        })
    }

    pub fn resources(&self) -> &FrameResources {
        &self.resources
    }

    pub fn shaders(&self) -> &ShaderSet {
        &self.shaders
    }

    pub fn assembler(&self) -> &Assembler {
        &self.assembler
    }

    pub fn set_overflow_policy(&mut self, policy: OverflowPolicy) {
        self.assembler.set_policy(policy);
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Clears the targets, draws `polygons` and queues the color copy.
    ///
    /// A frame rejected by the overflow policy is still cleared and copied,
    /// so the readback shows an empty frame; the error is returned after
    /// submission.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        polygons: &[Polygon],
    ) -> Result<FrameStats, CapacityError> {
        self.frame_index += 1;

        self.resources.clear_aux(ctx.queue);

        let variant = ShaderVariant::for_frame(polygons);
        let assembled = self.assembler.assemble(polygons);
        if let Err(err) = &assembled {
            log::warn!("frame {} rejected: {err}", self.frame_index);
        }

        self.resources.upload(
            ctx.queue,
            self.assembler.vertices(),
            self.assembler.indices(),
        );

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("gpu3d frame encoder"),
            });

        {
            let mut target = RenderTarget::new(
                &mut encoder,
                &self.resources.color_view,
                &self.resources.depth_view,
            );
            self.encode_pass(&mut target, variant);
        }

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.resources.color,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.resources.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(ROW_BYTES),
                    rows_per_image: Some(SCREEN_HEIGHT),
                },
            },
            SCREEN_EXTENT,
        );

        ctx.queue.submit(std::iter::once(encoder.finish()));

        let counts = assembled?;
        let stats = FrameStats {
            frame_index: self.frame_index,
            variant,
            vertices: counts.vertices,
            triangles: counts.triangles,
            dropped_polygons: counts.dropped_polygons,
        };

        log::trace!("{stats:?}");
        Ok(stats)
    }

    fn encode_pass(&self, target: &mut RenderTarget<'_>, variant: Option<ShaderVariant>) {
        let mut pass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("gpu3d frame pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.target_clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_viewport(0.0, 0.0, SCREEN_WIDTH as f32, SCREEN_HEIGHT as f32, 0.0, 1.0);

        let index_count = self.assembler.indices().len() as u32;
        let (Some(variant), true) = (variant, index_count > 0) else {
            return;
        };

        let vertex_bytes =
            std::mem::size_of_val(self.assembler.vertices()) as wgpu::BufferAddress;
        let index_bytes = (index_count as usize * std::mem::size_of::<u16>()) as wgpu::BufferAddress;

        pass.set_pipeline(&self.shaders.select(variant).pipeline);
        pass.set_vertex_buffer(0, self.resources.vertex_buffer.slice(..vertex_bytes));
        pass.set_index_buffer(
            self.resources.index_buffer.slice(..index_bytes),
            wgpu::IndexFormat::Uint16,
        );
        pass.draw_indexed(0..index_count, 0, 0..1);
    }
}

/// Swaps red and blue so the target stores the channels in R, G, B, A byte
/// order.
fn bgra_clear(color: wgpu::Color) -> wgpu::Color {
    wgpu::Color {
        r: color.b,
        g: color.g,
        b: color.r,
        a: color.a,
    }
}
