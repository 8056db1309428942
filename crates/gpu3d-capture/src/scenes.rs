use clap::ValueEnum;
use gpu3d_render::{Polygon, Vertex};

/// Built-in test scenes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum Scene {
    /// One red triangle covering the top-left half of the screen.
    Triangle,
    /// Shaded quad in the middle of the screen (two fan triangles).
    Quad,
    /// Two overlapping W-buffered quads; the nearer (blue) one is drawn first.
    Wbuffer,
    /// No polygons.
    Empty,
}

const W: u32 = 0x1000;

fn quad(x0: u16, y0: u16, x1: u16, y1: u16, z: u32, colors: [[u16; 3]; 4]) -> Polygon {
    let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)];
    let vertices = corners
        .into_iter()
        .zip(colors)
        .map(|((x, y), [r, g, b])| Vertex::new(x, y, z, W).with_color(r, g, b))
        .collect();
    Polygon::new(vertices)
}

impl Scene {
    pub fn polygons(self) -> Vec<Polygon> {
        match self {
            Scene::Triangle => vec![Polygon::new(vec![
                Vertex::new(0, 0, 0x1000, W).with_color(0x1FF, 0, 0),
                Vertex::new(256, 0, 0x1000, W).with_color(0x1FF, 0, 0),
                Vertex::new(0, 192, 0x1000, W).with_color(0x1FF, 0, 0),
            ])],
            Scene::Quad => vec![quad(
                64,
                48,
                192,
                144,
                0x4000,
                [
                    [0x1FF, 0, 0],
                    [0, 0x1FF, 0],
                    [0, 0, 0x1FF],
                    [0x1FF, 0x1FF, 0x1FF],
                ],
            )],
            Scene::Wbuffer => {
                let blue = [[0, 0, 0x1FF]; 4];
                let red = [[0x1FF, 0, 0]; 4];
                vec![
                    quad(32, 32, 160, 128, 0x2000, blue).w_buffered(true),
                    quad(96, 64, 224, 160, 0x80_0000, red).w_buffered(true),
                ]
            }
            Scene::Empty => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenes_have_expected_shapes() {
        assert_eq!(Scene::Triangle.polygons().len(), 1);
        assert_eq!(Scene::Quad.polygons()[0].triangle_count(), 2);
        assert!(Scene::Wbuffer.polygons().iter().all(|p| p.w_buffer));
        assert!(Scene::Empty.polygons().is_empty());
    }
}
