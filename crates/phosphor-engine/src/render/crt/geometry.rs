use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable, PartialEq)]
pub(crate) struct QuadVertex {
    pub position: [f32; 2], // clip space
    pub uv: [f32; 2],       // bottom-left origin
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x2  // uv
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

const fn v(x: f32, y: f32, u: f32, w: f32) -> QuadVertex {
    QuadVertex {
        position: [x, y],
        uv: [u, w],
    }
}

/// Two CCW triangles sharing the (1,-1)–(-1,1) diagonal.
pub(crate) const QUAD_VERTICES: [QuadVertex; 6] = [
    v(-1.0, -1.0, 0.0, 0.0),
    v(1.0, -1.0, 1.0, 0.0),
    v(-1.0, 1.0, 0.0, 1.0),
    v(1.0, -1.0, 1.0, 0.0),
    v(1.0, 1.0, 1.0, 1.0),
    v(-1.0, 1.0, 0.0, 1.0),
];

/// Static full-screen quad, uploaded once and never written again.
pub struct FullscreenQuad {
    vbo: wgpu::Buffer,
}

impl FullscreenQuad {
    pub fn new(device: &wgpu::Device) -> Self {
        let vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("phosphor crt quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self { vbo }
    }

    pub fn vertex_count(&self) -> u32 {
        QUAD_VERTICES.len() as u32
    }

    pub(crate) fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vbo
    }
}
