//! GPU-facing vertex record (7 × 32-bit words).

use bytemuck::{Pod, Zeroable};

use crate::geometry::{Polygon, Vertex};

/// Packed vertex as consumed by both shader variants.
///
/// Word layout:
/// - `position`:    x | y << 16
/// - `depth`:       z (after shift) | w << 16
/// - `color`:       (c >> 1) & 0xFF per channel at bytes 0..3 | alpha << 24
/// - `texcoord`:    s | t << 16
/// - `attr`:        polygon attribute subset | zshift << 16
/// - `tex_param`:   texture parameter word
/// - `tex_palette`: texture palette word
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct PackedVertex {
    pub position: u32,
    pub depth: u32,
    pub color: u32,
    pub texcoord: u32,
    pub attr: u32,
    pub tex_param: u32,
    pub tex_palette: u32,
}

/// Number of 32-bit words per packed vertex.
pub const PACKED_VERTEX_WORDS: usize = 7;

/// Bit offset of the Z shift inside the attribute word.
pub const ZSHIFT_OFFSET: u32 = 16;

const _: () = assert!(std::mem::size_of::<PackedVertex>() == PACKED_VERTEX_WORDS * 4);

/// Splits `z` into a 16-bit value and the right shift that produced it.
///
/// The shift is the smallest `s` with `z >> s <= 0xFFFF`; the low `s` bits of
/// `z` are lost.
#[inline]
pub const fn z_shift(z: u32) -> (u32, u32) {
    let shift = (u32::BITS - z.leading_zeros()).saturating_sub(16);
    (z >> shift, shift)
}

impl PackedVertex {
    pub const ATTRIBUTE_COUNT: u32 = 4;

    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Uint16x4, // x, y, z, w
        1 => Uint8x4,  // r, g, b, alpha
        2 => Uint16x2, // s, t
        3 => Uint32x3  // attr, tex_param, tex_palette
    ];

    /// Vertex-layout descriptor for the single vertex buffer.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PackedVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }

    /// Shader locations and formats of [`PackedVertex::layout`].
    pub fn attributes() -> &'static [wgpu::VertexAttribute] {
        &Self::ATTRS
    }

    /// Packs one vertex of `polygon`. `vertex_attr` is
    /// [`Polygon::vertex_attr`], hoisted out of the per-vertex loop.
    #[inline]
    pub fn pack(polygon: &Polygon, vertex_attr: u32, vertex: &Vertex) -> Self {
        let (z, zshift) = z_shift(vertex.z);
        let [r, g, b] = vertex.color.map(u32::from);
        let alpha = polygon.attr.alpha();

        Self {
            position: u32::from(vertex.x) | (u32::from(vertex.y) << 16),
            depth: z | (vertex.w << 16),
            color: color_byte(r) | (color_byte(g) << 8) | (color_byte(b) << 16) | (alpha << 24),
            texcoord: u32::from(vertex.texcoord[0]) | (u32::from(vertex.texcoord[1]) << 16),
            attr: vertex_attr | (zshift << ZSHIFT_OFFSET),
            tex_param: polygon.tex_param,
            tex_palette: polygon.tex_palette,
        }
    }

    /// Z shift recorded in the attribute word.
    #[inline]
    pub fn zshift(&self) -> u32 {
        (self.attr >> ZSHIFT_OFFSET) & 0x1F
    }
}

/// 9-bit channel to the 8 bits the vertex word holds. Bits above the ninth
/// are dropped.
#[inline]
const fn color_byte(c: u32) -> u32 {
    (c >> 1) & 0xFF
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_shift(mut z: u32) -> (u32, u32) {
        let mut shift = 0;
        while z > 0xFFFF {
            z >>= 1;
            shift += 1;
        }
        (z, shift)
    }

    // ── z shift ───────────────────────────────────────────────────────────

    #[test]
    fn z_within_16_bits_is_not_shifted() {
        assert_eq!(z_shift(0), (0, 0));
        assert_eq!(z_shift(0x1234), (0x1234, 0));
        assert_eq!(z_shift(0xFFFF), (0xFFFF, 0));
    }

    #[test]
    fn z_shift_is_minimal() {
        assert_eq!(z_shift(0x1_0000), (0x8000, 1));
        assert_eq!(z_shift(0xFF_FFFF), (0xFFFF, 8));
        assert_eq!(z_shift(u32::MAX), (0xFFFF, 16));

        for z in [0x1_0000u32, 0x1_FFFF, 0x7F_FFFF, 0x80_0000, 0xDEAD_BEEF] {
            let (v, s) = z_shift(z);
            assert!(v <= 0xFFFF);
            assert!(s == 0 || (z >> (s - 1)) > 0xFFFF, "shift {s} not minimal for {z:#x}");
        }
    }

    #[test]
    fn z_shift_matches_repeated_halving() {
        let mut z = 1u32;
        while z != 0 {
            assert_eq!(z_shift(z), reference_shift(z));
            assert_eq!(z_shift(z | (z >> 1)), reference_shift(z | (z >> 1)));
            z <<= 1;
        }
    }

    #[test]
    fn z_shift_drops_low_bits_only() {
        let z = 0x00AB_CDEF;
        let (v, s) = z_shift(z);
        assert_eq!(v << s, z & !((1 << s) - 1));
    }

    // ── packing ───────────────────────────────────────────────────────────

    #[test]
    fn packs_all_seven_words() {
        let poly = Polygon::new(vec![])
            .with_attr(0x1F1F_C8F0)
            .with_texture(0xCAFE_0001, 0x0000_0ABC)
            .facing(true);
        let vertex = Vertex::new(200, 150, 0x12_3456, 0x1000)
            .with_color(0x1FF, 0x100, 0x002)
            .with_texcoord(0x0040, 0x0080);

        let packed = PackedVertex::pack(&poly, poly.vertex_attr(), &vertex);

        assert_eq!(packed.position, 200 | (150 << 16));
        assert_eq!(packed.depth, 0x91A2 | (0x1000 << 16));
        assert_eq!(packed.color, 0xFF | (0x80 << 8) | (0x01 << 16) | (0x1F << 24));
        assert_eq!(packed.texcoord, 0x0040 | (0x0080 << 16));
        assert_eq!(packed.attr, 0x1F00_C8F0 | (1 << 8) | (5 << 16));
        assert_eq!(packed.zshift(), 5);
        assert_eq!(packed.tex_param, 0xCAFE_0001);
        assert_eq!(packed.tex_palette, 0x0ABC);
    }

    #[test]
    fn oversized_color_stays_in_its_byte() {
        let poly = Polygon::new(vec![]).with_attr(0x001F_0000);
        let vertex = Vertex::new(0, 0, 0, 0).with_color(0x3FF, 0xFFFF, 0x201);
        let packed = PackedVertex::pack(&poly, 0, &vertex);
        assert_eq!(packed.color, 0xFF | (0xFF << 8) | (0x00 << 16) | (0x1F << 24));
    }

    #[test]
    fn w_high_bits_fall_off_the_word() {
        let poly = Polygon::new(vec![]);
        let vertex = Vertex::new(0, 0, 0x10, 0x0001_2345);
        let packed = PackedVertex::pack(&poly, 0, &vertex);
        assert_eq!(packed.depth, 0x10 | (0x2345 << 16));
    }

    #[test]
    fn layout_matches_word_offsets() {
        let layout = PackedVertex::layout();
        assert_eq!(layout.array_stride, 28);

        let offsets: Vec<_> = layout
            .attributes
            .iter()
            .map(|a| (a.shader_location, a.offset))
            .collect();
        assert_eq!(offsets, vec![(0, 0), (1, 8), (2, 12), (3, 16)]);
    }

    #[test]
    fn bytes_are_little_endian_words() {
        let v = PackedVertex {
            position: 0x0002_0001,
            ..PackedVertex::default()
        };
        let bytes = bytemuck::bytes_of(&v);
        assert_eq!(&bytes[..4], &[0x01, 0x00, 0x02, 0x00]);
    }
}
