//! Fullscreen shader passes.
//!
//! [`ScreenPass`] wraps one compiled post-processing program: a fullscreen
//! triangle, the shared uniform block, a clamping sampler, and up to four
//! sampled color inputs plus an optional depth input. Fragment sources are
//! appended to a generated preamble that declares the uniforms, the bindings,
//! and the vertex stage, so each `.wgsl` file in `src/shaders/` is just a
//! fragment entry point.
//!
//! A program that writes to targets of different formats (the Gaussian blur
//! writes both ping-pong HDR buffers and the screen) gets one pipeline per
//! format, selected at draw time.

use crate::gpu::GpuContext;
use wgpu::util::DeviceExt;

/// Uniforms shared by every screen pass.
///
/// One block serves all programs; passes read the fields they need. The WGSL
/// mirror lives in the generated preamble and must match this layout.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PassUniforms {
    /// Current view-projection, for reprojecting world positions.
    pub view_proj: [[f32; 4]; 4],
    /// Inverse of the current view-projection, for position reconstruction.
    pub inv_view_proj: [[f32; 4]; 4],
    /// Previous frame's view-projection, for motion blur velocity.
    pub prev_view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub time: f32,
    pub resolution: [f32; 2],
    /// Fraction of the screen (from the left) the effect applies to.
    pub coverage: f32,
    /// Blur direction: 1.0 horizontal, 0.0 vertical.
    pub horizontal: f32,
    /// Effect-specific scalars: x = znear, y = zfar.
    pub params: [f32; 4],
    pub light_dir: [f32; 3],
    pub _pad0: f32,
    pub light_color: [f32; 3],
    pub _pad1: f32,
    /// Point light positions (w unused).
    pub point_positions: [[f32; 4]; 4],
    /// Point light colors (w unused).
    pub point_colors: [[f32; 4]; 4],
}

/// WGSL preamble generation: uniform block, bindings, vertex stage, helpers.
fn preamble(color_inputs: u32, samples_depth: bool) -> String {
    // Effect fragments branch on screen position (coverage split) before
    // sampling; every texture is single-mip, so implicit derivatives are
    // irrelevant and the uniformity diagnostic can be silenced.
    let mut src = String::from(
        r#"diagnostic(off, derivative_uniformity);

struct Uniforms {
    view_proj: mat4x4f,
    inv_view_proj: mat4x4f,
    prev_view_proj: mat4x4f,
    camera_pos: vec3f,
    time: f32,
    resolution: vec2f,
    coverage: f32,
    horizontal: f32,
    params: vec4f,
    light_dir: vec3f,
    _pad0: f32,
    light_color: vec3f,
    _pad1: f32,
    point_positions: array<vec4f, 4>,
    point_colors: array<vec4f, 4>,
}
@group(0) @binding(0) var<uniform> u: Uniforms;
@group(0) @binding(1) var samp: sampler;
"#,
    );
    for i in 0..color_inputs {
        src.push_str(&format!(
            "@group(0) @binding({}) var tex{}: texture_2d<f32>;\n",
            2 + i,
            i
        ));
    }
    if samples_depth {
        src.push_str(&format!(
            "@group(0) @binding({}) var depth_tex: texture_depth_2d;\n",
            2 + color_inputs
        ));
    }
    src.push_str(
        r#"
@vertex
fn vs(@builtin(vertex_index) vi: u32) -> @builtin(position) vec4f {
    let x = f32(i32(vi & 1u) * 4 - 1);
    let y = f32(i32(vi & 2u) * 2 - 1);
    return vec4f(x, y, 0.0, 1.0);
}

fn uv_of(pos: vec4f) -> vec2f {
    return pos.xy / u.resolution;
}

fn covered(uv: vec2f) -> bool {
    return uv.x <= u.coverage;
}
"#,
    );
    src
}

/// One compiled fullscreen program, with a pipeline per target format.
pub struct ScreenPass {
    pipelines: Vec<(wgpu::TextureFormat, wgpu::RenderPipeline)>,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    color_inputs: u32,
    samples_depth: bool,
    label: String,
}

impl ScreenPass {
    /// Compiles `fragment_source` against the generated preamble and builds
    /// one pipeline per entry in `formats`.
    pub fn new(
        gpu: &GpuContext,
        label: &str,
        fragment_source: &str,
        color_inputs: u32,
        samples_depth: bool,
        formats: &[wgpu::TextureFormat],
    ) -> Self {
        let device = &gpu.device;
        let source = format!(
            "{}{}",
            preamble(color_inputs, samples_depth),
            fragment_source
        );

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let mut entries = vec![
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ];
        for i in 0..color_inputs {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 2 + i,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
        }
        if samples_depth {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 2 + color_inputs,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Depth,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
        }

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{} Bind Group Layout", label)),
                entries: &entries,
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Pipeline Layout", label)),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipelines = formats
            .iter()
            .map(|&format| {
                let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(&format!("{} Pipeline ({:?})", label, format)),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs"),
                        buffers: &[],
                        compilation_options: Default::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: Some("fs"),
                        targets: &[Some(wgpu::ColorTargetState {
                            format,
                            blend: Some(wgpu::BlendState::REPLACE),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: Default::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        ..Default::default()
                    },
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                });
                (format, pipeline)
            })
            .collect();

        Self {
            pipelines,
            bind_group_layout,
            sampler,
            color_inputs,
            samples_depth,
            label: label.to_string(),
        }
    }

    /// Records one fullscreen draw into its own render pass.
    ///
    /// `inputs` must have exactly as many views as the program's color input
    /// count, and `depth` must be `Some` exactly when the program samples
    /// depth. Uniforms go into a fresh per-draw buffer so iterated passes
    /// (blur) each see their own direction state.
    pub fn draw(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        target_format: wgpu::TextureFormat,
        clear: bool,
        inputs: &[&wgpu::TextureView],
        depth: Option<&wgpu::TextureView>,
        uniforms: &PassUniforms,
    ) {
        assert_eq!(inputs.len() as u32, self.color_inputs, "{}", self.label);
        assert_eq!(depth.is_some(), self.samples_depth, "{}", self.label);

        let pipeline = &self
            .pipelines
            .iter()
            .find(|(f, _)| *f == target_format)
            .unwrap_or_else(|| panic!("{} has no pipeline for {:?}", self.label, target_format))
            .1;

        let uniform_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Uniforms", self.label)),
                contents: bytemuck::bytes_of(uniforms),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            },
        ];
        for (i, view) in inputs.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: 2 + i as u32,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }
        if let Some(view) = depth {
            entries.push(wgpu::BindGroupEntry {
                binding: 2 + self.color_inputs,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Bind Group", self.label)),
            layout: &self.bind_group_layout,
            entries: &entries,
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&self.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: if clear {
                        wgpu::LoadOp::Clear(wgpu::Color::BLACK)
                    } else {
                        wgpu::LoadOp::Load
                    },
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_layout_matches_wgsl() {
        // Must track the Uniforms struct in the generated preamble.
        assert_eq!(std::mem::size_of::<PassUniforms>(), 400);
        assert_eq!(std::mem::size_of::<PassUniforms>() % 16, 0);
    }

    #[test]
    fn preamble_declares_requested_bindings() {
        let src = preamble(3, true);
        assert!(src.contains("var tex0"));
        assert!(src.contains("var tex2"));
        assert!(!src.contains("var tex3"));
        assert!(src.contains("@group(0) @binding(5) var depth_tex"));
    }
}
