use bytemuck::{Pod, Zeroable};
use skymirror_assets::MeshData;
use wgpu::util::DeviceExt;

/// Interleaved vertex for the lit object: position, normal, uv.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl ObjectVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Interleaved vertex for the mirror quad: position, uv.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MirrorVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl MirrorVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x2,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

fn vec3_at(data: &[f32], i: usize, fallback: [f32; 3]) -> [f32; 3] {
    data.get(i * 3..i * 3 + 3)
        .map(|s| [s[0], s[1], s[2]])
        .unwrap_or(fallback)
}

fn vec2_at(data: &[f32], i: usize) -> [f32; 2] {
    data.get(i * 2..i * 2 + 2)
        .map(|s| [s[0], s[1]])
        .unwrap_or([0.0, 0.0])
}

/// Missing normals default to +Y, missing UVs to the origin.
pub fn object_vertices(mesh: &MeshData) -> Vec<ObjectVertex> {
    (0..mesh.vertex_count())
        .map(|i| ObjectVertex {
            position: vec3_at(&mesh.positions, i, [0.0; 3]),
            normal: vec3_at(&mesh.normals, i, [0.0, 1.0, 0.0]),
            uv: vec2_at(&mesh.uvs, i),
        })
        .collect()
}

pub fn mirror_vertices(mesh: &MeshData) -> Vec<MirrorVertex> {
    (0..mesh.vertex_count())
        .map(|i| MirrorVertex {
            position: vec3_at(&mesh.positions, i, [0.0; 3]),
            uv: vec2_at(&mesh.uvs, i),
        })
        .collect()
}

/// Vertex and index buffers for one indexed mesh.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload<V: Pod>(device: &wgpu::Device, label: &str, vertices: &[V], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    pub fn draw<'p>(&self, pass: &mut wgpu::RenderPass<'p>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
