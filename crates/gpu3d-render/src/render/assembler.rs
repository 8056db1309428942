//! Polygon list → packed vertex/index stream.

use std::fmt;

use crate::geometry::Polygon;

use super::PackedVertex;

/// Staging capacity in vertices.
pub const MAX_VERTICES: usize = 10240;

/// Staging capacity in index entries (3 per triangle).
pub const MAX_INDICES: usize = 2048 * 10;

/// What to do when a frame does not fit the staging arenas.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum OverflowPolicy {
    /// Drop the whole frame; nothing is drawn.
    #[default]
    RejectFrame,
    /// Keep every polygon that fits, drop the first one that does not and
    /// everything after it.
    Truncate,
}

/// Output counts of one assembly pass.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct AssemblyCounts {
    pub vertices: u32,
    pub triangles: u32,
    /// Polygons dropped by [`OverflowPolicy::Truncate`].
    pub dropped_polygons: u32,
}

/// A frame needs more staging space than is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityError {
    /// Index (in the input list) of the first polygon that did not fit.
    pub polygon: usize,
    /// Vertices the whole frame would need.
    pub required_vertices: usize,
    /// Index entries the whole frame would need.
    pub required_indices: usize,
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame exceeds staging capacity at polygon {}: needs {} vertices (max {}) and {} indices (max {})",
            self.polygon, self.required_vertices, MAX_VERTICES, self.required_indices, MAX_INDICES
        )
    }
}

impl std::error::Error for CapacityError {}

/// Packs a frame's polygons into preallocated host staging arenas.
///
/// Polygons are fanned around their first vertex. Index values are offsets
/// into the frame's vertex stream, not per-polygon.
#[derive(Debug)]
pub struct Assembler {
    vertices: Vec<PackedVertex>,
    indices: Vec<u16>,
    policy: OverflowPolicy,
}

impl Assembler {
    pub fn new(policy: OverflowPolicy) -> Self {
        Self {
            vertices: Vec::with_capacity(MAX_VERTICES),
            indices: Vec::with_capacity(MAX_INDICES),
            policy,
        }
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: OverflowPolicy) {
        self.policy = policy;
    }

    /// Packed vertices of the last successful assembly.
    pub fn vertices(&self) -> &[PackedVertex] {
        &self.vertices
    }

    /// Triangle-list indices of the last successful assembly.
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Replaces the staging contents with `polygons`.
    ///
    /// Degenerate polygons are skipped and contribute neither vertices nor
    /// triangles. Capacity is checked per polygon before any of it is written,
    /// so a polygon is either packed whole or not at all.
    pub fn assemble(&mut self, polygons: &[Polygon]) -> Result<AssemblyCounts, CapacityError> {
        self.clear();

        for (i, poly) in polygons.iter().enumerate() {
            if poly.degenerate {
                continue;
            }

            let needed_vertices = poly.vertices.len();
            let needed_indices = poly.triangle_count() * 3;
            if self.vertices.len() + needed_vertices > MAX_VERTICES
                || self.indices.len() + needed_indices > MAX_INDICES
            {
                return self.overflow(polygons, i);
            }

            self.push_polygon(poly);
        }

        Ok(self.counts(0))
    }

    fn push_polygon(&mut self, poly: &Polygon) {
        let first = self.vertices.len() as u16;
        let vertex_attr = poly.vertex_attr();

        for (j, vertex) in poly.vertices.iter().enumerate() {
            let current = self.vertices.len() as u16;
            self.vertices.push(PackedVertex::pack(poly, vertex_attr, vertex));

            if j >= 2 {
                self.indices.extend_from_slice(&[first, current - 1, current]);
            }
        }
    }

    fn overflow(
        &mut self,
        polygons: &[Polygon],
        at: usize,
    ) -> Result<AssemblyCounts, CapacityError> {
        let (required_vertices, required_indices) = polygons
            .iter()
            .filter(|p| !p.degenerate)
            .fold((0, 0), |(v, i), p| (v + p.vertices.len(), i + p.triangle_count() * 3));

        let err = CapacityError {
            polygon: at,
            required_vertices,
            required_indices,
        };

        match self.policy {
            OverflowPolicy::RejectFrame => {
                self.clear();
                Err(err)
            }
            OverflowPolicy::Truncate => {
                let dropped = polygons[at..].iter().filter(|p| !p.degenerate).count();
                log::warn!("{err}; dropping {dropped} polygons");
                Ok(self.counts(dropped as u32))
            }
        }
    }

    fn counts(&self, dropped_polygons: u32) -> AssemblyCounts {
        AssemblyCounts {
            vertices: self.vertices.len() as u32,
            triangles: self.triangle_count() as u32,
            dropped_polygons,
        }
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(OverflowPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vertex;

    fn poly(n: usize) -> Polygon {
        let vertices = (0..n)
            .map(|i| Vertex::new(i as u16, i as u16 * 2, 0x100, 0x1000))
            .collect();
        Polygon::new(vertices)
    }

    fn triangles(asm: &Assembler) -> Vec<[u16; 3]> {
        asm.indices()
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect()
    }

    // ── fan construction ──────────────────────────────────────────────────

    #[test]
    fn single_triangle() {
        let mut asm = Assembler::default();
        let counts = asm.assemble(&[poly(3)]).unwrap();

        assert_eq!(counts.vertices, 3);
        assert_eq!(counts.triangles, 1);
        assert_eq!(asm.indices(), &[0, 1, 2]);
    }

    #[test]
    fn n_gon_fans_around_first_vertex() {
        for n in 3..=10 {
            let mut asm = Assembler::default();
            let counts = asm.assemble(&[poly(n)]).unwrap();

            assert_eq!(counts.vertices as usize, n);
            assert_eq!(counts.triangles as usize, n - 2);

            let expected: Vec<[u16; 3]> =
                (2..n as u16).map(|k| [0, k - 1, k]).collect();
            assert_eq!(triangles(&asm), expected);
        }
    }

    #[test]
    fn indices_are_global_offsets() {
        let mut asm = Assembler::default();
        asm.assemble(&[poly(4), poly(3)]).unwrap();

        assert_eq!(triangles(&asm), vec![[0, 1, 2], [0, 2, 3], [4, 5, 6]]);
    }

    #[test]
    fn vertices_keep_input_order() {
        let mut asm = Assembler::default();
        asm.assemble(&[poly(5)]).unwrap();

        let xs: Vec<u32> = asm.vertices().iter().map(|v| v.position & 0xFFFF).collect();
        assert_eq!(xs, vec![0, 1, 2, 3, 4]);
    }

    // ── degenerate polygons ───────────────────────────────────────────────

    #[test]
    fn degenerate_polygons_contribute_nothing() {
        let mut asm = Assembler::default();
        let counts = asm
            .assemble(&[poly(3), poly(6).degenerate(true), poly(4)])
            .unwrap();

        assert_eq!(counts.vertices, 7);
        assert_eq!(counts.triangles, 3);
        assert_eq!(triangles(&asm), vec![[0, 1, 2], [3, 4, 5], [3, 5, 6]]);
    }

    #[test]
    fn all_degenerate_is_empty() {
        let mut asm = Assembler::default();
        let counts = asm
            .assemble(&[poly(3).degenerate(true), poly(3).degenerate(true)])
            .unwrap();

        assert_eq!(counts, AssemblyCounts::default());
        assert!(asm.vertices().is_empty());
        assert!(asm.indices().is_empty());
    }

    #[test]
    fn short_polygons_emit_vertices_without_triangles() {
        let mut asm = Assembler::default();
        let counts = asm.assemble(&[poly(2)]).unwrap();
        assert_eq!(counts.vertices, 2);
        assert_eq!(counts.triangles, 0);
    }

    #[test]
    fn reassembly_replaces_previous_frame() {
        let mut asm = Assembler::default();
        asm.assemble(&[poly(10), poly(10)]).unwrap();
        let counts = asm.assemble(&[poly(3)]).unwrap();

        assert_eq!(counts.vertices, 3);
        assert_eq!(asm.indices(), &[0, 1, 2]);
    }

    // ── capacity ──────────────────────────────────────────────────────────

    #[test]
    fn exactly_full_vertex_arena_is_accepted() {
        // 1024 decagons = 10240 vertices, 8192 triangles would overflow the
        // index arena, so use quads: 2560 quads = 10240 vertices, 5120 triangles.
        let polys = vec![poly(4); MAX_VERTICES / 4];
        let mut asm = Assembler::default();
        let counts = asm.assemble(&polys).unwrap();

        assert_eq!(counts.vertices as usize, MAX_VERTICES);
        assert_eq!(counts.triangles, 5120);
    }

    #[test]
    fn vertex_overflow_rejects_frame() {
        let polys = vec![poly(4); MAX_VERTICES / 4 + 1];
        let mut asm = Assembler::new(OverflowPolicy::RejectFrame);
        let err = asm.assemble(&polys).unwrap_err();

        assert_eq!(err.polygon, MAX_VERTICES / 4);
        assert_eq!(err.required_vertices, MAX_VERTICES + 4);
        assert!(asm.vertices().is_empty());
        assert!(asm.indices().is_empty());
    }

    #[test]
    fn index_overflow_rejects_frame() {
        // Decagons: 24 index entries each; 854 of them need 20496 > 20480.
        let polys = vec![poly(10); 854];
        let mut asm = Assembler::new(OverflowPolicy::RejectFrame);
        let err = asm.assemble(&polys).unwrap_err();

        assert_eq!(err.polygon, 853);
        assert_eq!(err.required_indices, 854 * 24);
    }

    #[test]
    fn truncate_keeps_polygons_that_fit() {
        let mut polys = vec![poly(4); MAX_VERTICES / 4];
        polys.push(poly(3));
        polys.push(poly(3).degenerate(true));
        polys.push(poly(3));

        let mut asm = Assembler::new(OverflowPolicy::Truncate);
        let counts = asm.assemble(&polys).unwrap();

        assert_eq!(counts.vertices as usize, MAX_VERTICES);
        assert_eq!(counts.dropped_polygons, 2);
        assert_eq!(asm.vertices().len(), MAX_VERTICES);
    }

    #[test]
    fn policy_change_applies_to_next_assembly() {
        let polys = vec![poly(4); MAX_VERTICES / 4 + 1];
        let mut asm = Assembler::new(OverflowPolicy::RejectFrame);
        assert!(asm.assemble(&polys).is_err());

        asm.set_policy(OverflowPolicy::Truncate);
        let counts = asm.assemble(&polys).unwrap();
        assert_eq!(counts.dropped_polygons, 1);

        asm.set_policy(OverflowPolicy::RejectFrame);
        assert!(asm.assemble(&polys).is_err());
        assert!(asm.vertices().is_empty());
    }

    #[test]
    fn degenerate_polygons_do_not_count_against_capacity() {
        let mut polys = vec![poly(4); MAX_VERTICES / 4];
        polys.push(poly(10).degenerate(true));

        let mut asm = Assembler::default();
        assert!(asm.assemble(&polys).is_ok());
    }
}
