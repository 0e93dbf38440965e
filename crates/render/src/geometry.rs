//! Fixed-topology overlay geometry, built once at startup.
//!
//! Instance placement (box extents, ray length, frustum shape) is applied
//! through per-draw matrices, never by regenerating these buffers.

use bytemuck::{Pod, Zeroable};

/// Line vertex: position plus an index into the line palette.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color_index: f32,
}

/// Textured quad vertex for billboards.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct IconVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// CPU-side vertex and index data ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry<V> {
    pub vertices: Vec<V>,
    pub indices: Vec<u32>,
}

impl<V> Geometry<V> {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Palette slot used by the grid line through the origin along Z.
pub const HIGHLIGHT_Z_AXIS: f32 = 1.0;
/// Palette slot used by the grid line through the origin along X.
pub const HIGHLIGHT_X_AXIS: f32 = 3.0;

fn line_vertex(x: f32, y: f32, z: f32, color_index: f32) -> LineVertex {
    LineVertex {
        position: [x, y, z],
        color_index,
    }
}

/// Ground grid on the XZ plane, `divisions + 1` lines along each axis.
///
/// Per division `i` the vertex order is: the Z-parallel line at
/// `x = -half + i * step`, then the X-parallel line at `z = half - i * step`.
/// The division through the origin carries the highlight colours.
pub fn grid(size: f32, divisions: u32) -> Geometry<LineVertex> {
    let half = size / 2.0;
    let step = size / divisions.max(1) as f32;
    let center = divisions / 2;

    let mut vertices = Vec::with_capacity((divisions as usize + 1) * 4);
    for i in 0..=divisions {
        let (z_color, x_color) = if i == center {
            (HIGHLIGHT_Z_AXIS, HIGHLIGHT_X_AXIS)
        } else {
            (0.0, 0.0)
        };

        let x = -half + i as f32 * step;
        vertices.push(line_vertex(x, 0.0, half, z_color));
        vertices.push(line_vertex(x, 0.0, -half, z_color));

        let z = half - i as f32 * step;
        vertices.push(line_vertex(-half, 0.0, z, x_color));
        vertices.push(line_vertex(half, 0.0, z, x_color));
    }

    let indices = (0..vertices.len() as u32).collect();
    Geometry { vertices, indices }
}

/// Wireframe cube spanning -1..1 on every axis, as a line list of 12 edges.
pub fn unit_cube() -> Geometry<LineVertex> {
    #[rustfmt::skip]
    let vertices = vec![
        line_vertex(-1.0, -1.0, -1.0, 0.0), // near bottom left
        line_vertex( 1.0, -1.0, -1.0, 0.0), // near bottom right
        line_vertex( 1.0,  1.0, -1.0, 0.0), // near top right
        line_vertex(-1.0,  1.0, -1.0, 0.0), // near top left
        line_vertex(-1.0, -1.0,  1.0, 0.0), // far bottom left
        line_vertex( 1.0, -1.0,  1.0, 0.0), // far bottom right
        line_vertex( 1.0,  1.0,  1.0, 0.0), // far top right
        line_vertex(-1.0,  1.0,  1.0, 0.0), // far top left
    ];
    #[rustfmt::skip]
    let indices = vec![
        0,1, 1,2, 2,3, 3,0, // near
        4,5, 5,6, 6,7, 7,4, // far
        4,0, 7,3,           // left
        5,1, 6,2,           // right
    ];
    Geometry { vertices, indices }
}

/// Single segment from the origin to (0, 0, 1).
pub fn unit_ray() -> Geometry<LineVertex> {
    Geometry {
        vertices: vec![
            line_vertex(0.0, 0.0, 0.0, 0.0),
            line_vertex(0.0, 0.0, 1.0, 0.0),
        ],
        indices: vec![0, 1],
    }
}

/// 1x1 quad centred on the origin, two triangles.
pub fn billboard_quad() -> Geometry<IconVertex> {
    let s = 0.5;
    Geometry {
        vertices: vec![
            IconVertex {
                position: [-s, -s, 0.0],
                uv: [0.0, 0.0],
            },
            IconVertex {
                position: [s, -s, 0.0],
                uv: [1.0, 0.0],
            },
            IconVertex {
                position: [s, s, 0.0],
                uv: [1.0, 1.0],
            },
            IconVertex {
                position: [-s, s, 0.0],
                uv: [0.0, 1.0],
            },
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_counts() {
        let g = grid(100.0, 100);
        assert_eq!(g.vertices.len(), 404);
        assert_eq!(g.indices.len(), 404);
        assert!(g.indices.iter().enumerate().all(|(i, &v)| i as u32 == v));
    }

    #[test]
    fn grid_highlights_only_the_center_division() {
        let g = grid(100.0, 100);
        let highlighted: Vec<usize> = g
            .vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.color_index != 0.0)
            .map(|(i, _)| i)
            .collect();
        // Division 50: Z-parallel pair then X-parallel pair.
        assert_eq!(highlighted, vec![200, 201, 202, 203]);
        assert_eq!(g.vertices[200].color_index, HIGHLIGHT_Z_AXIS);
        assert_eq!(g.vertices[202].color_index, HIGHLIGHT_X_AXIS);
        // Both highlighted lines pass through the origin.
        assert_eq!(g.vertices[200].position[0], 0.0);
        assert_eq!(g.vertices[202].position[2], 0.0);
    }

    #[test]
    fn grid_spans_size() {
        let g = grid(10.0, 4);
        let xs = g.vertices.iter().map(|v| v.position[0]);
        let max = xs.clone().fold(f32::MIN, f32::max);
        let min = xs.fold(f32::MAX, f32::min);
        assert_eq!((min, max), (-5.0, 5.0));
        assert!(g.vertices.iter().all(|v| v.position[1] == 0.0));
    }

    #[test]
    fn cube_has_twelve_edges_between_adjacent_corners() {
        let c = unit_cube();
        assert_eq!(c.vertices.len(), 8);
        assert_eq!(c.index_count(), 24);
        for edge in c.indices.chunks(2) {
            let a = c.vertices[edge[0] as usize].position;
            let b = c.vertices[edge[1] as usize].position;
            let differing = (0..3).filter(|&k| a[k] != b[k]).count();
            assert_eq!(differing, 1, "edge {edge:?} is not axis aligned");
        }
    }

    #[test]
    fn ray_is_unit_segment_along_z() {
        let r = unit_ray();
        assert_eq!(r.vertices[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(r.vertices[1].position, [0.0, 0.0, 1.0]);
        assert_eq!(r.index_count(), 2);
    }

    #[test]
    fn quad_uvs_match_corners() {
        let q = billboard_quad();
        assert_eq!(q.index_count(), 6);
        for v in &q.vertices {
            assert_eq!(v.uv[0], v.position[0] + 0.5);
            assert_eq!(v.uv[1], v.position[1] + 0.5);
        }
    }
}
