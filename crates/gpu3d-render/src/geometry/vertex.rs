/// Final screen-space vertex.
///
/// Fixed-point values exactly as the geometry engine produced them. X and Y are
/// screen pixels (top-left origin, +Y down). Z may exceed 16 bits; the packer
/// shifts it down and records the shift.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Vertex {
    pub x: u16,
    pub y: u16,
    pub z: u32,
    pub w: u32,

    /// Final RGB color. Sources carry 9 significant bits per channel
    /// (0..=0x1FF); bit 0 is dropped when packing.
    pub color: [u16; 3],

    /// Texture coordinates (S, T).
    pub texcoord: [u16; 2],
}

impl Vertex {
    #[inline]
    pub const fn new(x: u16, y: u16, z: u32, w: u32) -> Self {
        Self {
            x,
            y,
            z,
            w,
            color: [0; 3],
            texcoord: [0; 2],
        }
    }

    #[inline]
    pub const fn with_color(mut self, r: u16, g: u16, b: u16) -> Self {
        self.color = [r, g, b];
        self
    }

    #[inline]
    pub const fn with_texcoord(mut self, s: u16, t: u16) -> Self {
        self.texcoord = [s, t];
        self
    }
}
