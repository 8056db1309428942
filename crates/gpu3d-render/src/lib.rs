//! Hardware-accelerated back end for an emulated fixed-function 3D GPU.
//!
//! The upstream geometry stage hands over one list of screen-space polygons
//! per frame. This crate packs them into GPU buffers, draws them into a
//! 256x192 offscreen target with one of two depth modes, and serves the
//! result back one scanline at a time.
//!
//! Entry point: [`Renderer3d`].

pub mod device;
pub mod geometry;
pub mod logging;
pub mod render;
pub mod renderer;

pub use geometry::{Polygon, Vertex};
pub use renderer::{Renderer3d, RendererConfig};
