//! Emulated geometry records handed in by the upstream geometry stage.
//!
//! Everything here is read-only to the render pipeline: polygons and their
//! vertices are built, transformed and clipped upstream, then passed to
//! `Renderer3d::render_frame` once per frame.

mod polygon;
mod vertex;

pub use polygon::{Polygon, PolygonAttr, MAX_POLYGON_VERTICES};
pub use vertex::Vertex;
