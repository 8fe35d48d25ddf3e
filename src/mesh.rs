//! 3D mesh primitives and spatial transforms.
//!
//! [`Vertex3d`] is the vertex format every mesh uses (position, normal, uv),
//! [`Mesh`] is GPU-resident geometry, and [`Transform`] places meshes in the
//! world. All demo geometry is generated procedurally: cube, uv sphere,
//! plane, and a (p, q) torus knot.

use crate::gpu::GpuContext;
use glam::{Mat4, Quat, Vec3};
use wgpu::util::DeviceExt;

/// A vertex with position, normal, and texture coordinates (32 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// Vertex buffer layout for pipeline creation: position (loc 0),
    /// normal (loc 1), uv (loc 2).
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
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
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Generated geometry before GPU upload.
#[derive(Clone, Debug)]
pub struct MeshData {
    pub vertices: Vec<Vertex3d>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// A unit cube centered at the origin with per-face normals.
    pub fn cube() -> Self {
        // (normal, tangent u, tangent v) per face
        let faces: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, tu, tv) in faces {
            let base = vertices.len() as u32;
            for (i, (su, sv)) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
                .into_iter()
                .enumerate()
            {
                let p = (normal + tu * su + tv * sv) * 0.5;
                let uv = [i as f32 % 2.0, (i / 2) as f32];
                vertices.push(Vertex3d::new(p.to_array(), normal.to_array(), uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self { vertices, indices }
    }

    /// A unit-radius uv sphere.
    pub fn sphere(segments: u32, rings: u32) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let phi = v * std::f32::consts::PI;
            for segment in 0..=segments {
                let u = segment as f32 / segments as f32;
                let theta = u * std::f32::consts::TAU;
                let normal = Vec3::new(
                    phi.sin() * theta.cos(),
                    phi.cos(),
                    phi.sin() * theta.sin(),
                );
                vertices.push(Vertex3d::new(normal.to_array(), normal.to_array(), [u, v]));
            }
        }
        let stride = segments + 1;
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * stride + segment;
                let b = a + stride;
                indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }
        Self { vertices, indices }
    }

    /// A flat square plane of the given size in the XZ plane, facing +Y.
    pub fn plane(size: f32) -> Self {
        let h = size * 0.5;
        let vertices = vec![
            Vertex3d::new([-h, 0.0, -h], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([h, 0.0, -h], [0.0, 1.0, 0.0], [1.0, 0.0]),
            Vertex3d::new([h, 0.0, h], [0.0, 1.0, 0.0], [1.0, 1.0]),
            Vertex3d::new([-h, 0.0, h], [0.0, 1.0, 0.0], [0.0, 1.0]),
        ];
        let indices = vec![0, 2, 1, 0, 3, 2];
        Self { vertices, indices }
    }

    /// A (p, q) torus knot: a tube swept along the knot curve.
    ///
    /// `p` winds around the torus axis, `q` through its hole. The tube frame
    /// comes from the curve tangent and its cross products.
    pub fn torus_knot(p: u32, q: u32, curve_segments: u32, tube_segments: u32) -> Self {
        let curve = |t: f32| -> Vec3 {
            let r = 2.0 + (q as f32 * t).cos();
            Vec3::new(
                r * (p as f32 * t).cos(),
                (q as f32 * t).sin(),
                r * (p as f32 * t).sin(),
            )
        };
        let tube_radius = 0.4;

        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        for i in 0..=curve_segments {
            let t = i as f32 / curve_segments as f32 * std::f32::consts::TAU;
            let center = curve(t);
            let tangent = (curve(t + 0.01) - center).normalize();
            let side = tangent.cross(Vec3::Y).normalize_or(Vec3::X);
            let up = side.cross(tangent).normalize();
            for j in 0..=tube_segments {
                let angle = j as f32 / tube_segments as f32 * std::f32::consts::TAU;
                let normal = side * angle.cos() + up * angle.sin();
                let position = center + normal * tube_radius;
                vertices.push(Vertex3d::new(
                    position.to_array(),
                    normal.to_array(),
                    [
                        i as f32 / curve_segments as f32,
                        j as f32 / tube_segments as f32,
                    ],
                ));
            }
        }
        let stride = tube_segments + 1;
        for i in 0..curve_segments {
            for j in 0..tube_segments {
                let a = i * stride + j;
                let b = a + stride;
                indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }
        Self { vertices, indices }
    }
}

/// GPU-resident mesh geometry.
pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl Mesh {
    /// Uploads mesh data to the GPU.
    pub fn upload(gpu: &GpuContext, data: &MeshData, label: &str) -> Self {
        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Vertices", label)),
                contents: bytemuck::cast_slice(&data.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Indices", label)),
                contents: bytemuck::cast_slice(&data.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        }
    }
}

/// Position, rotation, and scale for placing a mesh in the world.
#[derive(Copy, Clone, Debug)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn rotated(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scaled(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// The model matrix for this transform.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_24_vertices_36_indices() {
        let cube = MeshData::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        // Every corner sits on the unit cube surface.
        for v in &cube.vertices {
            for c in v.position {
                assert!((c.abs() - 0.5).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn sphere_normals_are_unit_positions() {
        let sphere = MeshData::sphere(16, 8);
        for v in &sphere.vertices {
            let p = Vec3::from_array(v.position);
            let n = Vec3::from_array(v.normal);
            assert!((p.length() - 1.0).abs() < 1e-4);
            assert!((p - n).length() < 1e-6);
        }
        assert_eq!(sphere.indices.len() as u32, 16 * 8 * 6);
    }

    #[test]
    fn torus_knot_is_well_formed() {
        let knot = MeshData::torus_knot(2, 3, 64, 8);
        assert_eq!(knot.indices.len() % 3, 0);
        let max = *knot.indices.iter().max().unwrap();
        assert!((max as usize) < knot.vertices.len());
        for v in &knot.vertices {
            let n = Vec3::from_array(v.normal);
            assert!((n.length() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn transform_composes_in_srt_order() {
        let t = Transform::at(Vec3::new(1.0, 2.0, 3.0)).scaled(2.0);
        let m = t.matrix();
        let p = m.transform_point3(Vec3::ONE);
        assert!((p - Vec3::new(3.0, 4.0, 5.0)).length() < 1e-5);
    }
}
