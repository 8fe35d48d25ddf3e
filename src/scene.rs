//! The demo scene and its renderer.
//!
//! The pipeline only requires "something that renders the scene into the
//! currently selected target"; this module is that collaborator. It owns the
//! scene geometry (a sphere grid with varying materials, a ring of lit
//! cubes, a spinning torus knot, and emissive light markers), the lights,
//! and four pipeline variants over the same shaders:
//!
//! - **forward**: lit HDR color + depth, into `Color`-kind buffers
//! - **gbuffer**: the five-attachment MRT set with bright-pass extraction
//! - **depth-only**: no color attachments, for depth prepasses
//! - **overlay**: light markers over the screen, depth-tested against a
//!   copied depth buffer (used after the deferred composite)
//!
//! Rendering is stateless between calls, so the frame loop can invoke it
//! twice per frame (plain and depth-only) without leakage.

use crate::camera::Camera;
use crate::framebuffer::{DEPTH_FORMAT, FrameBufferKind};
use crate::gpu::GpuContext;
use crate::mesh::{Mesh, MeshData, Transform, Vertex3d};
use glam::{Quat, Vec3, Vec4};
use wgpu::util::DeviceExt;

/// Per-frame camera and light uniforms, mirrored in `scene.wgsl` / `sky.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniforms {
    view_proj: [[f32; 4]; 4],
    inv_view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 3],
    time: f32,
    light_dir: [f32; 3],
    _pad0: f32,
    light_color: [f32; 3],
    _pad1: f32,
    point_positions: [[f32; 4]; 4],
    point_colors: [[f32; 4]; 4],
}

/// Per-object uniforms, mirrored in `scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ModelUniforms {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    base_color: [f32; 4],
    material: [f32; 4],
}

/// Surface response of a scene object.
#[derive(Copy, Clone, Debug)]
pub struct Material {
    pub base_color: Vec4,
    /// Specular strength.
    pub specular: f32,
    /// Blinn-Phong shininess exponent.
    pub shininess: f32,
    /// Self-illumination added on top of lighting.
    pub emissive: f32,
}

impl Material {
    fn to_uniform(self) -> [f32; 4] {
        [self.specular, self.shininess, self.emissive, 0.0]
    }
}

/// The scene's light rig: one directional sun and four point lights.
#[derive(Copy, Clone, Debug)]
pub struct Lights {
    pub dir: Vec3,
    pub color: Vec3,
    /// (position, color) per point light.
    pub points: [(Vec3, Vec3); 4],
}

impl Default for Lights {
    fn default() -> Self {
        Self {
            dir: Vec3::new(-0.4, -1.0, -0.3).normalize(),
            color: Vec3::new(0.9, 0.85, 0.75),
            points: [
                (Vec3::new(6.0, 3.0, 6.0), Vec3::new(1.0, 0.2, 0.2)),
                (Vec3::new(-6.0, 3.0, 6.0), Vec3::new(0.2, 1.0, 0.2)),
                (Vec3::new(-6.0, 3.0, -6.0), Vec3::new(0.2, 0.4, 1.0)),
                (Vec3::new(6.0, 3.0, -6.0), Vec3::new(1.0, 0.9, 0.3)),
            ],
        }
    }
}

// hecs components
struct MeshRef(usize);
struct ModelBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}
struct Spin(f32);
/// Tags the emissive light-marker cubes drawn by the deferred overlay pass.
struct Marker;

/// Which pipeline variant a scene render uses, and its attachments.
pub enum ScenePass<'a> {
    Forward {
        color: &'a wgpu::TextureView,
        depth: &'a wgpu::TextureView,
    },
    GBuffer {
        color: Vec<&'a wgpu::TextureView>,
        depth: &'a wgpu::TextureView,
    },
    DepthOnly {
        depth: &'a wgpu::TextureView,
    },
    Overlay {
        color: &'a wgpu::TextureView,
        depth: &'a wgpu::TextureView,
    },
}

/// Renders the demo scene into whatever target the pipeline selected.
pub struct SceneRenderer {
    forward_pipeline: wgpu::RenderPipeline,
    gbuffer_pipeline: wgpu::RenderPipeline,
    depth_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
    sky_forward_pipeline: wgpu::RenderPipeline,
    sky_gbuffer_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    model_layout: wgpu::BindGroupLayout,
    meshes: Vec<Mesh>,
    world: hecs::World,
    lights: Lights,
}

impl SceneRenderer {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });
        let sky_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sky Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sky.wgsl").into()),
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Camera Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Model Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &model_layout],
            push_constant_ranges: &[],
        });
        let sky_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sky Pipeline Layout"),
            bind_group_layouts: &[&camera_layout],
            push_constant_ranges: &[],
        });

        let color_target = |format| {
            Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })
        };
        let hdr_targets = [color_target(crate::framebuffer::HDR_FORMAT)];
        let gbuffer_targets: Vec<Option<wgpu::ColorTargetState>> = FrameBufferKind::Geometry
            .color_formats()
            .iter()
            .map(|&format| color_target(format))
            .collect();
        let surface_targets = [color_target(gpu.config.format)];
        let no_targets: [Option<wgpu::ColorTargetState>; 0] = [];

        let mesh_depth = |write: bool| wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        };
        let sky_depth = wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Always,
            stencil: Default::default(),
            bias: Default::default(),
        };

        let mesh_pipeline = |label: &str,
                             layout: &wgpu::PipelineLayout,
                             entry: Option<&str>,
                             targets: &[Option<wgpu::ColorTargetState>],
                             depth: wgpu::DepthStencilState| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: &scene_shader,
                    entry_point: Some("vs"),
                    buffers: &[Vertex3d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: entry.map(|entry| wgpu::FragmentState {
                    module: &scene_shader,
                    entry_point: Some(entry),
                    targets,
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil: Some(depth),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };
        let sky_pipeline = |label: &str,
                            entry: &str,
                            targets: &[Option<wgpu::ColorTargetState>]| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&sky_layout),
                vertex: wgpu::VertexState {
                    module: &sky_shader,
                    entry_point: Some("vs"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &sky_shader,
                    entry_point: Some(entry),
                    targets,
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: Some(sky_depth.clone()),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let forward_pipeline = mesh_pipeline(
            "Scene Forward",
            &mesh_layout,
            Some("fs_forward"),
            &hdr_targets,
            mesh_depth(true),
        );
        let gbuffer_pipeline = mesh_pipeline(
            "Scene GBuffer",
            &mesh_layout,
            Some("fs_gbuffer"),
            &gbuffer_targets,
            mesh_depth(true),
        );
        let depth_pipeline = mesh_pipeline(
            "Scene Depth Only",
            &mesh_layout,
            None,
            &no_targets,
            mesh_depth(true),
        );
        let overlay_pipeline = mesh_pipeline(
            "Scene Overlay",
            &mesh_layout,
            Some("fs_forward"),
            &surface_targets,
            mesh_depth(true),
        );
        let sky_forward_pipeline = sky_pipeline("Sky Forward", "fs_forward", &hdr_targets);
        let sky_gbuffer_pipeline = sky_pipeline("Sky GBuffer", "fs_gbuffer", &gbuffer_targets);

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Camera Uniforms"),
            size: std::mem::size_of::<CameraUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let mut scene = Self {
            forward_pipeline,
            gbuffer_pipeline,
            depth_pipeline,
            overlay_pipeline,
            sky_forward_pipeline,
            sky_gbuffer_pipeline,
            camera_buffer,
            camera_bind_group,
            model_layout,
            meshes: Vec::new(),
            world: hecs::World::new(),
            lights: Lights::default(),
        };
        scene.populate(gpu);
        scene
    }

    /// The light rig, shared with the deferred / SSAO lighting passes.
    pub fn lights(&self) -> &Lights {
        &self.lights
    }

    fn add_mesh(&mut self, gpu: &GpuContext, data: &MeshData, label: &str) -> usize {
        self.meshes.push(Mesh::upload(gpu, data, label));
        self.meshes.len() - 1
    }

    fn spawn(
        &mut self,
        gpu: &GpuContext,
        mesh: usize,
        transform: Transform,
        material: Material,
        spin: Option<f32>,
        marker: bool,
    ) {
        let uniforms = model_uniforms(&transform, &material);
        let buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Scene Model Uniforms"),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Model Bind Group"),
            layout: &self.model_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        let binding = ModelBinding { buffer, bind_group };

        let entity = self
            .world
            .spawn((MeshRef(mesh), transform, material, binding));
        if let Some(speed) = spin {
            self.world.insert_one(entity, Spin(speed)).unwrap();
        }
        if marker {
            self.world.insert_one(entity, Marker).unwrap();
        }
    }

    /// Builds the demo scene content.
    fn populate(&mut self, gpu: &GpuContext) {
        let cube = self.add_mesh(gpu, &MeshData::cube(), "Cube");
        let sphere = self.add_mesh(gpu, &MeshData::sphere(32, 16), "Sphere");
        let plane = self.add_mesh(gpu, &MeshData::plane(40.0), "Ground");
        let knot = self.add_mesh(gpu, &MeshData::torus_knot(2, 3, 128, 16), "Torus Knot");

        // Ground.
        self.spawn(
            gpu,
            plane,
            Transform::default(),
            Material {
                base_color: Vec4::new(0.45, 0.45, 0.48, 1.0),
                specular: 0.1,
                shininess: 8.0,
                emissive: 0.0,
            },
            None,
            false,
        );

        // 5x5 sphere grid with varying specular response.
        let rows = 5;
        let cols = 5;
        for row in 0..rows {
            for col in 0..cols {
                let specular = row as f32 / rows as f32;
                let shininess = 4.0 + 60.0 * (col as f32 / cols as f32);
                let position = Vec3::new(
                    (row as f32 - 2.0) * 2.2,
                    1.0,
                    (col as f32 - 2.0) * 2.2,
                );
                self.spawn(
                    gpu,
                    sphere,
                    Transform::at(position).scaled(0.8),
                    Material {
                        base_color: Vec4::new(0.6, 0.08, 0.08, 1.0),
                        specular: 0.2 + specular,
                        shininess,
                        emissive: 0.0,
                    },
                    None,
                    false,
                );
            }
        }

        // A ring of lit cubes, each turned a bit further than the last.
        let ring = 10;
        for i in 0..ring {
            let angle = i as f32 / ring as f32 * std::f32::consts::TAU;
            let position = Vec3::new(angle.cos() * 10.0, 1.0, angle.sin() * 10.0);
            self.spawn(
                gpu,
                cube,
                Transform::at(position)
                    .rotated(Quat::from_rotation_y(angle * 2.0))
                    .scaled(1.6),
                Material {
                    base_color: Vec4::new(0.35, 0.25, 0.15, 1.0),
                    specular: 0.4,
                    shininess: 24.0,
                    emissive: 0.0,
                },
                None,
                false,
            );
        }

        // The spinning torus knot above the grid.
        self.spawn(
            gpu,
            knot,
            Transform::at(Vec3::new(0.0, 5.0, 0.0)).scaled(0.9),
            Material {
                base_color: Vec4::new(0.2, 0.35, 0.7, 1.0),
                specular: 0.9,
                shininess: 48.0,
                emissive: 0.0,
            },
            Some(0.5),
            false,
        );

        // Emissive markers at the point lights. These also seed the bright
        // pass, so bloom and lens flare have something to flare.
        let points = self.lights.points;
        for (position, color) in points {
            self.spawn(
                gpu,
                cube,
                Transform::at(position).scaled(0.4),
                Material {
                    base_color: Vec4::new(color.x, color.y, color.z, 1.0),
                    specular: 0.0,
                    shininess: 1.0,
                    emissive: 6.0,
                },
                None,
                true,
            );
        }
    }

    /// Per-frame update: writes camera/light uniforms and advances spins.
    pub fn update(&mut self, gpu: &GpuContext, camera: &Camera, time: f32, dt: f32) {
        let view_proj = camera.view_proj(gpu.aspect());
        let uniforms = CameraUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            camera_pos: camera.position().to_array(),
            time,
            light_dir: self.lights.dir.to_array(),
            _pad0: 0.0,
            light_color: self.lights.color.to_array(),
            _pad1: 0.0,
            point_positions: self
                .lights
                .points
                .map(|(p, _)| [p.x, p.y, p.z, 1.0]),
            point_colors: self.lights.points.map(|(_, c)| [c.x, c.y, c.z, 1.0]),
        };
        gpu.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniforms));

        for (_, (transform, material, binding, spin)) in self
            .world
            .query_mut::<(&mut Transform, &Material, &ModelBinding, &Spin)>()
        {
            transform.rotation *= Quat::from_rotation_y(spin.0 * dt);
            let uniforms = model_uniforms(transform, material);
            gpu.queue
                .write_buffer(&binding.buffer, 0, bytemuck::bytes_of(&uniforms));
        }
    }

    /// Records one scene render pass.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, pass: ScenePass<'_>) {
        let depth_attachment = Some(wgpu::RenderPassDepthStencilAttachment {
            view: match &pass {
                ScenePass::Forward { depth, .. }
                | ScenePass::GBuffer { depth, .. }
                | ScenePass::DepthOnly { depth }
                | ScenePass::Overlay { depth, .. } => *depth,
            },
            depth_ops: Some(wgpu::Operations {
                load: if matches!(&pass, ScenePass::Overlay { .. }) {
                    wgpu::LoadOp::Load
                } else {
                    wgpu::LoadOp::Clear(1.0)
                },
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        });

        let clear = wgpu::Operations {
            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
            store: wgpu::StoreOp::Store,
        };
        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = match &pass {
            ScenePass::Forward { color, .. } => vec![Some(wgpu::RenderPassColorAttachment {
                view: *color,
                resolve_target: None,
                ops: clear,
                depth_slice: None,
            })],
            ScenePass::GBuffer { color, .. } => color
                .iter()
                .map(|view| {
                    Some(wgpu::RenderPassColorAttachment {
                        view: *view,
                        resolve_target: None,
                        ops: clear,
                        depth_slice: None,
                    })
                })
                .collect(),
            ScenePass::DepthOnly { .. } => vec![],
            ScenePass::Overlay { color, .. } => vec![Some(wgpu::RenderPassColorAttachment {
                view: *color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &color_attachments,
            depth_stencil_attachment: depth_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        rpass.set_bind_group(0, &self.camera_bind_group, &[]);

        // Sky first, depth writes off; only for the full color variants.
        match &pass {
            ScenePass::Forward { .. } => {
                rpass.set_pipeline(&self.sky_forward_pipeline);
                rpass.draw(0..3, 0..1);
            }
            ScenePass::GBuffer { .. } => {
                rpass.set_pipeline(&self.sky_gbuffer_pipeline);
                rpass.draw(0..3, 0..1);
            }
            _ => {}
        }

        let pipeline = match &pass {
            ScenePass::Forward { .. } => &self.forward_pipeline,
            ScenePass::GBuffer { .. } => &self.gbuffer_pipeline,
            ScenePass::DepthOnly { .. } => &self.depth_pipeline,
            ScenePass::Overlay { .. } => &self.overlay_pipeline,
        };
        rpass.set_pipeline(pipeline);

        let markers_only = matches!(&pass, ScenePass::Overlay { .. });
        for (_, (mesh_ref, binding, marker)) in self
            .world
            .query::<(&MeshRef, &ModelBinding, Option<&Marker>)>()
            .iter()
        {
            if markers_only && marker.is_none() {
                continue;
            }
            let mesh = &self.meshes[mesh_ref.0];
            rpass.set_bind_group(1, &binding.bind_group, &[]);
            rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            rpass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn model_uniforms(transform: &Transform, material: &Material) -> ModelUniforms {
    let model = transform.matrix();
    ModelUniforms {
        model: model.to_cols_array_2d(),
        normal_matrix: model.inverse().transpose().to_cols_array_2d(),
        base_color: material.base_color.to_array(),
        material: material.to_uniform(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_layouts_match_wgsl() {
        // Sizes must match the WGSL struct declarations exactly.
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 288);
        assert_eq!(std::mem::size_of::<ModelUniforms>(), 160);
    }
}
