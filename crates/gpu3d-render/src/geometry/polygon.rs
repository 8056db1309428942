use super::Vertex;

/// Upper bound on vertices per polygon after clipping.
pub const MAX_POLYGON_VERTICES: usize = 10;

/// Raw 32-bit polygon attribute word.
///
/// Bit layout (as written by the geometry engine):
/// - 4..=7   light/mode flags
/// - 11, 14..=15 depth/fog flags
/// - 16..=20 alpha
/// - 24..=29 polygon ID
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct PolygonAttr(pub u32);

impl PolygonAttr {
    /// Bits forwarded to the vertex stream unchanged.
    pub const VERTEX_MASK: u32 = 0x1F00_C8F0;

    /// Set in the packed attribute word when the polygon faces the viewer.
    pub const FACING_VIEW_BIT: u32 = 1 << 8;

    /// Set in the packed attribute word when the polygon uses W-buffering.
    pub const W_BUFFER_BIT: u32 = 1 << 9;

    #[inline]
    pub const fn alpha(self) -> u32 {
        (self.0 >> 16) & 0x1F
    }

    /// Attribute bits that travel with every vertex, before the facing,
    /// W-buffer and Z-shift bits are merged in.
    #[inline]
    pub const fn vertex_bits(self) -> u32 {
        self.0 & Self::VERTEX_MASK
    }
}

/// One emulated polygon with 3..=10 vertices and shared attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Polygon {
    pub vertices: Vec<Vertex>,
    pub attr: PolygonAttr,
    pub tex_param: u32,
    pub tex_palette: u32,

    /// Depth is interpolated from W instead of perspective-divided Z.
    pub w_buffer: bool,
    pub facing_view: bool,

    /// Degenerate polygons (zero area after projection) are never drawn.
    pub degenerate: bool,
}

impl Polygon {
    pub fn new(vertices: Vec<Vertex>) -> Self {
        debug_assert!(vertices.len() <= MAX_POLYGON_VERTICES);
        Self {
            vertices,
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, attr: u32) -> Self {
        self.attr = PolygonAttr(attr);
        self
    }

    pub fn with_texture(mut self, tex_param: u32, tex_palette: u32) -> Self {
        self.tex_param = tex_param;
        self.tex_palette = tex_palette;
        self
    }

    pub fn w_buffered(mut self, w_buffer: bool) -> Self {
        self.w_buffer = w_buffer;
        self
    }

    pub fn facing(mut self, facing_view: bool) -> Self {
        self.facing_view = facing_view;
        self
    }

    pub fn degenerate(mut self, degenerate: bool) -> Self {
        self.degenerate = degenerate;
        self
    }

    /// Triangles this polygon contributes when fanned around its first vertex.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.vertices.len().saturating_sub(2)
    }

    /// Attribute word stored in every packed vertex of this polygon
    /// (Z shift excluded).
    #[inline]
    pub fn vertex_attr(&self) -> u32 {
        let mut attr = self.attr.vertex_bits();
        if self.facing_view {
            attr |= PolygonAttr::FACING_VIEW_BIT;
        }
        if self.w_buffer {
            attr |= PolygonAttr::W_BUFFER_BIT;
        }
        attr
    }
}
