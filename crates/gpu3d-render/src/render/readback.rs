//! Host-side copy of the rendered frame.

use std::fmt;
use std::sync::mpsc;

use super::{RenderCtx, AUX_ROW_BYTES, FRAME_BYTES, SCREEN_EXTENT, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Words (pixels) per scanline.
pub const LINE_WORDS: usize = SCREEN_WIDTH as usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadbackError {
    /// Mapping the readback buffer failed.
    Map(String),
    /// Requested scanline is not in `0..SCREEN_HEIGHT`.
    LineOutOfRange { line: usize },
}

impl fmt::Display for ReadbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadbackError::Map(msg) => write!(f, "failed to map readback buffer: {msg}"),
            ReadbackError::LineOutOfRange { line } => {
                write!(f, "scanline {line} out of range (0..{SCREEN_HEIGHT})")
            }
        }
    }
}

impl std::error::Error for ReadbackError {}

/// Host mirror of the last frame copied into the readback buffer.
///
/// Each pixel word holds the bytes R, G, B, A in memory order. Until the
/// first `request_line(0)` every line reads as zeros.
#[derive(Debug, Clone)]
pub struct ScanlineReadback {
    mirror: Vec<u32>,
}

impl ScanlineReadback {
    pub fn new() -> Self {
        Self {
            mirror: vec![0; LINE_WORDS * SCREEN_HEIGHT as usize],
        }
    }

    /// Line 0 blocks until the GPU has finished the frame, then refreshes the
    /// whole mirror. Other lines are served from the mirror and do nothing.
    pub fn request_line(
        &mut self,
        ctx: &RenderCtx<'_>,
        readback: &wgpu::Buffer,
        line: usize,
    ) -> Result<(), ReadbackError> {
        if line != 0 {
            return Ok(());
        }

        let mirror: &mut [u8] = bytemuck::cast_slice_mut(&mut self.mirror);
        map_read(ctx.device, readback, FRAME_BYTES, |data| {
            mirror.copy_from_slice(data)
        })
    }

    /// Pixels of scanline `line` from the mirror.
    pub fn get_line(&self, line: usize) -> Result<&[u32], ReadbackError> {
        if line >= SCREEN_HEIGHT as usize {
            return Err(ReadbackError::LineOutOfRange { line });
        }
        let start = line * LINE_WORDS;
        Ok(&self.mirror[start..start + LINE_WORDS])
    }

    /// Same as [`get_line`](Self::get_line), as bytes.
    pub fn line_bytes(&self, line: usize) -> Result<&[u8], ReadbackError> {
        self.get_line(line).map(bytemuck::cast_slice)
    }

    /// The whole mirror, row-major.
    pub fn frame(&self) -> &[u32] {
        &self.mirror
    }
}

impl Default for ScanlineReadback {
    fn default() -> Self {
        Self::new()
    }
}

/// Blocking map of `buffer[..size]` for reading; `f` sees the mapped bytes.
fn map_read<R>(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
    size: usize,
    f: impl FnOnce(&[u8]) -> R,
) -> Result<R, ReadbackError> {
    let slice = buffer.slice(..size as wgpu::BufferAddress);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    let mapped = device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| ReadbackError::Map(e.to_string()))
        .and_then(|_| {
            receiver
                .recv()
                .map_err(|_| ReadbackError::Map("map callback dropped".into()))
        })
        .and_then(|result| result.map_err(|e| ReadbackError::Map(e.to_string())));

    // A pending map is cancelled by unmap, so the next request can map again.
    if let Err(err) = mapped {
        buffer.unmap();
        return Err(err);
    }

    let out = {
        let data = slice.get_mapped_range();
        f(&data)
    };
    buffer.unmap();
    Ok(out)
}

/// Reads the aux image back, one `[u32; 2]` per pixel, row-major.
///
/// Debug helper: allocates a staging buffer and waits for the device.
pub fn read_aux(ctx: &RenderCtx<'_>, aux: &wgpu::Texture) -> Result<Vec<[u32; 2]>, ReadbackError> {
    let size = (AUX_ROW_BYTES * SCREEN_HEIGHT) as usize;
    let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("gpu3d aux readback"),
        size: size as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("gpu3d aux readback encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: aux,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(AUX_ROW_BYTES),
                rows_per_image: Some(SCREEN_HEIGHT),
            },
        },
        SCREEN_EXTENT,
    );
    ctx.queue.submit(std::iter::once(encoder.finish()));

    map_read(ctx.device, &staging, size, |data| {
        data.chunks_exact(8)
            .map(bytemuck::pod_read_unaligned::<[u32; 2]>)
            .collect()
    })
}
