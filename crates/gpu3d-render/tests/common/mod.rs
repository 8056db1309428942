#![allow(dead_code)]

use gpu3d_render::device::ResolveError;
use gpu3d_render::logging::{init_logging, LoggingConfig};
use gpu3d_render::render::OverflowPolicy;
use gpu3d_render::{Polygon, Renderer3d, RendererConfig, Vertex};

pub const BACKGROUND: [u8; 4] = [0, 0, 0, 31];
pub const RED: [u8; 4] = [63, 0, 0, 31];
pub const GREEN: [u8; 4] = [0, 63, 0, 31];
pub const BLUE: [u8; 4] = [0, 0, 63, 31];

/// Opens a renderer, preferring a software adapter.
///
/// Returns `None` (and prints why) when no adapter or device is available,
/// unless `GPU3D_REQUIRE_GPU=1` is set. An adapter that exists but is
/// refused by entry point resolution always fails the test.
pub fn open(policy: OverflowPolicy) -> Option<Renderer3d> {
    init_logging(LoggingConfig::default());

    let mut config = RendererConfig::fallback();
    config.overflow_policy = policy;

    let opened = Renderer3d::open_blocking(config.clone()).or_else(|_| {
        config.gpu.force_fallback_adapter = false;
        Renderer3d::open_blocking(config)
    });

    match opened {
        Ok(renderer) => Some(renderer),
        Err(err) => {
            if err.downcast_ref::<ResolveError>().is_some() {
                panic!("adapter found but refused by entry point resolution: {err:#}");
            }
            if require_gpu() {
                panic!("GPU3D_REQUIRE_GPU is set but the renderer failed to open: {err:#}");
            }
            eprintln!("skipping GPU-dependent test: {err:#}");
            None
        }
    }
}

pub fn require_gpu() -> bool {
    std::env::var("GPU3D_REQUIRE_GPU")
        .map(|v| v.trim() == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Software adapter, if the platform has one.
pub fn fallback_adapter() -> Option<wgpu::Adapter> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::LowPower,
        compatible_surface: None,
        force_fallback_adapter: true,
    }));

    match adapter {
        Ok(adapter) => Some(adapter),
        Err(err) => {
            if require_gpu() {
                panic!("GPU3D_REQUIRE_GPU is set but no fallback adapter exists: {err}");
            }
            eprintln!("skipping fallback adapter test: {err}");
            None
        }
    }
}

pub fn open_default() -> Option<Renderer3d> {
    open(OverflowPolicy::RejectFrame)
}

/// Pixel `(x, y)` of the mirrored frame as R, G, B, A bytes.
pub fn pixel(renderer: &Renderer3d, x: usize, y: usize) -> [u8; 4] {
    let line = renderer.line_bytes(y).expect("line in range");
    [line[x * 4], line[x * 4 + 1], line[x * 4 + 2], line[x * 4 + 3]]
}

/// Renders `polygons`, waits for the frame and refreshes the mirror.
pub fn render_and_read(renderer: &mut Renderer3d, polygons: &[Polygon]) {
    renderer.render_frame(polygons).expect("frame fits");
    renderer.request_line(0).expect("readback");
}

/// Top-left half of the screen.
pub fn upper_left_triangle(z: u32, color: [u16; 3]) -> Polygon {
    let [r, g, b] = color;
    Polygon::new(vec![
        Vertex::new(0, 0, z, 0x1000).with_color(r, g, b),
        Vertex::new(256, 0, z, 0x1000).with_color(r, g, b),
        Vertex::new(0, 192, z, 0x1000).with_color(r, g, b),
    ])
}

/// Whole screen at depth `z`.
pub fn full_screen_quad(z: u32, color: [u16; 3]) -> Polygon {
    let [r, g, b] = color;
    Polygon::new(vec![
        Vertex::new(0, 0, z, 0x1000).with_color(r, g, b),
        Vertex::new(256, 0, z, 0x1000).with_color(r, g, b),
        Vertex::new(256, 192, z, 0x1000).with_color(r, g, b),
        Vertex::new(0, 192, z, 0x1000).with_color(r, g, b),
    ])
}

pub const FULL_RED: [u16; 3] = [0x1FF, 0, 0];
pub const FULL_GREEN: [u16; 3] = [0, 0x1FF, 0];
pub const FULL_BLUE: [u16; 3] = [0, 0, 0x1FF];
