use glam::Vec3;
use std::sync::Arc;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex3D {
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex3D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 24,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// CPU 端网格数据
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex3D>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// 以原点为中心的长方体
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let half = Vec3::new(width, height, depth) * 0.5;
        let mut mesh = Self::default();
        // (法线, u 轴, v 轴)，u × v = 法线
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];
        for (normal, u, v) in faces {
            mesh.push_face(normal, u, v, half);
        }
        mesh
    }

    /// XZ 平面上朝 +Y 的矩形，`width` 沿 X，`depth` 沿 Z
    pub fn plane(width: f32, depth: f32) -> Self {
        let mut mesh = Self::default();
        mesh.push_face(
            Vec3::Y,
            Vec3::X,
            Vec3::NEG_Z,
            Vec3::new(width * 0.5, 0.0, depth * 0.5),
        );
        mesh
    }

    fn push_face(&mut self, normal: Vec3, u: Vec3, v: Vec3, half: Vec3) {
        let base = self.vertices.len() as u32;
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        for (su, sv) in corners {
            let pos = (normal + u * su + v * sv) * half;
            self.vertices.push(Vertex3D {
                pos: pos.to_array(),
                normal: normal.to_array(),
                uv: [(su + 1.0) * 0.5, (1.0 - sv) * 0.5],
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

#[derive(Clone, Debug)]
pub struct GpuMesh {
    pub vertex_buffer: Arc<wgpu::Buffer>,
    pub index_buffer: Arc<wgpu::Buffer>,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn new(device: &wgpu::Device, vertices: &[Vertex3D], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer: Arc::new(vertex_buffer),
            index_buffer: Arc::new(index_buffer),
            index_count: indices.len() as u32,
        }
    }

    pub fn from_data(device: &wgpu::Device, data: &MeshData) -> Self {
        Self::new(device, &data.vertices, &data.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_counts_and_extent() {
        let mesh = MeshData::cuboid(20.0, 7.0, 1.0);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        for v in &mesh.vertices {
            assert_eq!(v.pos[0].abs(), 10.0);
            assert_eq!(v.pos[1].abs(), 3.5);
            assert_eq!(v.pos[2].abs(), 0.5);
        }
    }

    #[test]
    fn test_faces_wind_counter_clockwise() {
        let mesh = MeshData::cuboid(2.0, 2.0, 2.0);
        for tri in mesh.indices.chunks(3) {
            let a = Vec3::from_array(mesh.vertices[tri[0] as usize].pos);
            let b = Vec3::from_array(mesh.vertices[tri[1] as usize].pos);
            let c = Vec3::from_array(mesh.vertices[tri[2] as usize].pos);
            let n = Vec3::from_array(mesh.vertices[tri[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(n) > 0.0);
        }
    }

    #[test]
    fn test_plane_faces_up() {
        let mesh = MeshData::plane(30.0, 400.0);
        assert_eq!(mesh.vertices.len(), 4);
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
        assert!(mesh.vertices.iter().all(|v| v.pos[1] == 0.0));
        assert!(mesh.vertices.iter().any(|v| v.pos[2] == 200.0));
    }
}
