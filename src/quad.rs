//! The single textured quad every spiral instance is drawn with.
//!
//! # Vertex Layout
//!
//! [`QuadVertex`] is 16 bytes, two interleaved `Float32x2` attributes:
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x2 | 0      | 0               |
//! | uv        | Float32x2 | 8      | 1               |
//!
//! The four vertices are laid out for a triangle strip: top-left,
//! bottom-left, top-right, bottom-right.

use glam::Vec2;
use wgpu::util::DeviceExt;

use crate::gpu::GpuContext;

/// Vertex for the spiral quad.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

impl QuadVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };
}

/// Unit quad centered on the origin, in strip order, with full `[0, 1]` UVs.
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-0.5, 0.5],
        uv: [0.0, 0.0],
    },
    QuadVertex {
        position: [-0.5, -0.5],
        uv: [0.0, 1.0],
    },
    QuadVertex {
        position: [0.5, 0.5],
        uv: [1.0, 0.0],
    },
    QuadVertex {
        position: [0.5, -0.5],
        uv: [1.0, 1.0],
    },
];

/// Number of vertices submitted per draw.
pub const QUAD_VERTEX_COUNT: u32 = QUAD_VERTICES.len() as u32;

/// Quad vertices with texture coordinates scaled into `[0, uv_extent]`.
///
/// Used with a padded texture so the quad samples only the region that
/// holds source pixels.
pub fn quad_vertices(uv_extent: Vec2) -> [QuadVertex; 4] {
    QUAD_VERTICES.map(|v| QuadVertex {
        position: v.position,
        uv: (Vec2::from(v.uv) * uv_extent).to_array(),
    })
}

/// GPU-resident quad geometry. Uploaded once and never modified.
pub struct Quad {
    pub(crate) vertex_buffer: wgpu::Buffer,
}

impl Quad {
    pub fn new(gpu: &GpuContext, uv_extent: Vec2) -> Self {
        let vertices = quad_vertices(uv_extent);
        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Quad Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        Self { vertex_buffer }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_four_float_stride() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 16);
        assert_eq!(QuadVertex::LAYOUT.array_stride, 16);
        assert_eq!(QUAD_VERTEX_COUNT, 4);
    }

    #[test]
    fn strip_order_forms_two_triangles() {
        let p: Vec<Vec2> = QUAD_VERTICES.iter().map(|v| Vec2::from(v.position)).collect();
        assert_eq!(p[0], Vec2::new(-0.5, 0.5));
        assert_eq!(p[1], Vec2::new(-0.5, -0.5));
        assert_eq!(p[2], Vec2::new(0.5, 0.5));
        assert_eq!(p[3], Vec2::new(0.5, -0.5));

        // Triangles (0,1,2) and (1,2,3) share the diagonal 1-2 and cover the unit square.
        let area = |a: Vec2, b: Vec2, c: Vec2| ((b - a).perp_dot(c - a) * 0.5).abs();
        assert!((area(p[0], p[1], p[2]) + area(p[1], p[2], p[3]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn uvs_scale_into_used_region() {
        let extent = Vec2::new(60.0 / 64.0, 60.0 / 64.0);
        let verts = quad_vertices(extent);
        let max_u = verts.iter().map(|v| v.uv[0]).fold(0.0, f32::max);
        let max_v = verts.iter().map(|v| v.uv[1]).fold(0.0, f32::max);
        assert_eq!(max_u, 0.9375);
        assert_eq!(max_v, 0.9375);
        assert_eq!(verts[0].uv, [0.0, 0.0]);
        for (scaled, base) in verts.iter().zip(&QUAD_VERTICES) {
            assert_eq!(scaled.position, base.position);
        }
    }
}
