mod scenes;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use gpu3d_render::logging::{init_logging, LoggingConfig};
use gpu3d_render::render::{OverflowPolicy, SCREEN_HEIGHT, SCREEN_WIDTH};
use gpu3d_render::{Renderer3d, RendererConfig};

use scenes::Scene;

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum Policy {
    Reject,
    Truncate,
}

impl From<Policy> for OverflowPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Reject => OverflowPolicy::RejectFrame,
            Policy::Truncate => OverflowPolicy::Truncate,
        }
    }
}

#[derive(Parser)]
#[command(name = "gpu3d-capture")]
#[command(about = "Render one test scene offscreen and save the read-back frame as PNG", long_about = None)]
#[command(version)]
struct Cli {
    /// Scene to render
    #[arg(short, long, value_enum, default_value = "triangle")]
    scene: Scene,

    /// Output PNG path
    #[arg(short, long, default_value = "frame.png")]
    out: PathBuf,

    /// Use a software adapter
    #[arg(long)]
    fallback: bool,

    /// Frames exceeding the staging capacity
    #[arg(long, value_enum, default_value = "reject")]
    policy: Policy,

    /// Log filter (env_logger syntax); defaults to RUST_LOG
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    let mut config = RendererConfig::default();
    config.gpu.force_fallback_adapter = cli.fallback;
    config.overflow_policy = cli.policy.into();

    let mut renderer = Renderer3d::open_blocking(config).context("failed to open 3d renderer")?;

    let polygons = cli.scene.polygons();
    let stats = renderer
        .render_frame(&polygons)
        .context("frame rejected")?;
    log::info!(
        "rendered {:?}: {} vertices, {} triangles, variant {:?}",
        cli.scene,
        stats.vertices,
        stats.triangles,
        stats.variant
    );

    let mut rgba = Vec::with_capacity((SCREEN_WIDTH * SCREEN_HEIGHT * 4) as usize);
    for line in 0..SCREEN_HEIGHT as usize {
        renderer.request_line(line)?;
        let bytes = renderer.line_bytes(line)?;
        for px in bytes.chunks_exact(4) {
            rgba.extend_from_slice(&[expand6(px[0]), expand6(px[1]), expand6(px[2]), 0xFF]);
        }
    }

    renderer.close();

    let image = image::RgbaImage::from_raw(SCREEN_WIDTH, SCREEN_HEIGHT, rgba)
        .ok_or_else(|| anyhow!("invalid image data"))?;
    image
        .save(&cli.out)
        .with_context(|| format!("failed to write {}", cli.out.display()))?;

    log::info!("wrote {}", cli.out.display());
    Ok(())
}

/// 6-bit channel to 8 bits, replicating the high bits into the low ones.
fn expand6(v: u8) -> u8 {
    let v = v & 0x3F;
    (v << 2) | (v >> 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_scene_and_output() {
        let cli = Cli::try_parse_from(["gpu3d-capture", "--scene", "wbuffer", "--out", "w.png", "--fallback"])
            .expect("valid args");
        assert_eq!(cli.scene, Scene::Wbuffer);
        assert_eq!(cli.out, PathBuf::from("w.png"));
        assert!(cli.fallback);
        assert_eq!(OverflowPolicy::from(cli.policy), OverflowPolicy::RejectFrame);
    }

    #[test]
    fn channel_expansion_covers_full_range() {
        assert_eq!(expand6(0), 0);
        assert_eq!(expand6(63), 255);
        assert_eq!(expand6(32), 130);
    }
}
