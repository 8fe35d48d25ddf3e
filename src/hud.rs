//! Text overlay drawn over the final image.
//!
//! Rasterizes an ASCII atlas with fontdue at startup and batches textured
//! quads per frame. The demo ships no font file; a usable TTF is located on
//! the system at startup (override with the `AFTERGLOW_FONT` environment
//! variable). Without one the overlay silently draws nothing.

use crate::gpu::GpuContext;
use fontdue::{Font, FontSettings};
use std::collections::HashMap;
use wgpu::util::DeviceExt;

const FONT_SIZE: f32 = 18.0;
const ATLAS_COLUMNS: u32 = 16;

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct HudVertex {
    position: [f32; 2],
    uv: [f32; 2],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct HudUniforms {
    resolution: [f32; 2],
    _pad: [f32; 2],
}

#[derive(Copy, Clone)]
struct Glyph {
    uv_min: [f32; 2],
    uv_max: [f32; 2],
    size: [f32; 2],
    offset: [f32; 2],
    advance: f32,
}

struct TextPainter {
    glyphs: HashMap<char, Glyph>,
    line_height: f32,
    bind_group: wgpu::BindGroup,
}

/// 2D text overlay pass.
pub struct Hud {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    painter: Option<TextPainter>,
    vertices: Vec<HudVertex>,
}

fn load_font_bytes() -> Option<Vec<u8>> {
    if let Ok(path) = std::env::var("AFTERGLOW_FONT") {
        match std::fs::read(&path) {
            Ok(bytes) => return Some(bytes),
            Err(e) => log::warn!("AFTERGLOW_FONT {}: {}", path, e),
        }
    }
    FONT_CANDIDATES
        .iter()
        .find_map(|path| std::fs::read(path).ok())
}

impl Hud {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("HUD Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/hud.wgsl").into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("HUD Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
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
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("HUD Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<HudVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: 8,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: 16,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("HUD Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[vertex_layout],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
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

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("HUD Uniforms"),
            size: std::mem::size_of::<HudUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let painter = match load_font_bytes() {
            Some(bytes) => match Font::from_bytes(bytes.as_slice(), FontSettings::default()) {
                Ok(font) => Some(build_painter(gpu, &layout, &uniform_buffer, &font)),
                Err(e) => {
                    log::warn!("could not parse font: {}", e);
                    None
                }
            },
            None => {
                log::warn!("no usable font found, HUD text disabled");
                None
            }
        };

        Self {
            pipeline,
            uniform_buffer,
            painter,
            vertices: Vec::new(),
        }
    }

    /// Clears the batch for a new frame.
    pub fn begin(&mut self) {
        self.vertices.clear();
    }

    /// Line height in pixels.
    pub fn line_height(&self) -> f32 {
        self.painter
            .as_ref()
            .map(|p| p.line_height)
            .unwrap_or(FONT_SIZE)
    }

    /// Queues a line of text at pixel position (x, y).
    pub fn text(&mut self, x: f32, y: f32, text: &str, color: [f32; 4]) {
        let Some(painter) = &self.painter else {
            return;
        };
        let mut pen_x = x;
        for c in text.chars() {
            let Some(glyph) = painter.glyphs.get(&c) else {
                pen_x += FONT_SIZE * 0.5;
                continue;
            };
            let x0 = pen_x + glyph.offset[0];
            let y0 = y + glyph.offset[1];
            let x1 = x0 + glyph.size[0];
            let y1 = y0 + glyph.size[1];
            let (u0, v0) = (glyph.uv_min[0], glyph.uv_min[1]);
            let (u1, v1) = (glyph.uv_max[0], glyph.uv_max[1]);
            let quad = [
                HudVertex {
                    position: [x0, y0],
                    uv: [u0, v0],
                    color,
                },
                HudVertex {
                    position: [x1, y0],
                    uv: [u1, v0],
                    color,
                },
                HudVertex {
                    position: [x1, y1],
                    uv: [u1, v1],
                    color,
                },
                HudVertex {
                    position: [x0, y0],
                    uv: [u0, v0],
                    color,
                },
                HudVertex {
                    position: [x1, y1],
                    uv: [u1, v1],
                    color,
                },
                HudVertex {
                    position: [x0, y1],
                    uv: [u0, v1],
                    color,
                },
            ];
            self.vertices.extend_from_slice(&quad);
            pen_x += glyph.advance;
        }
    }

    /// Draws the batch over `target` (load, alpha blend).
    pub fn render(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) {
        let Some(painter) = &self.painter else {
            return;
        };
        if self.vertices.is_empty() {
            return;
        }

        let uniforms = HudUniforms {
            resolution: [gpu.width() as f32, gpu.height() as f32],
            _pad: [0.0, 0.0],
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("HUD Vertices"),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("HUD Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &painter.bind_group, &[]);
        pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        pass.draw(0..self.vertices.len() as u32, 0..1);
    }
}

fn build_painter(
    gpu: &GpuContext,
    layout: &wgpu::BindGroupLayout,
    uniform_buffer: &wgpu::Buffer,
    font: &Font,
) -> TextPainter {
    let chars: Vec<char> = (32u8..127).map(|c| c as char).collect();
    let rasterized: Vec<(char, fontdue::Metrics, Vec<u8>)> = chars
        .iter()
        .map(|&c| {
            let (metrics, bitmap) = font.rasterize(c, FONT_SIZE);
            (c, metrics, bitmap)
        })
        .collect();

    let cell_w = rasterized.iter().map(|(_, m, _)| m.width).max().unwrap() as u32 + 1;
    let cell_h = rasterized.iter().map(|(_, m, _)| m.height).max().unwrap() as u32 + 1;
    let rows = (rasterized.len() as u32).div_ceil(ATLAS_COLUMNS);
    let atlas_w = cell_w * ATLAS_COLUMNS;
    let atlas_h = cell_h * rows;

    let mut pixels = vec![0u8; (atlas_w * atlas_h) as usize];
    let mut glyphs = HashMap::new();
    let line_metrics = font.horizontal_line_metrics(FONT_SIZE).unwrap();
    let ascent = line_metrics.ascent;

    for (i, (c, metrics, bitmap)) in rasterized.iter().enumerate() {
        let col = i as u32 % ATLAS_COLUMNS;
        let row = i as u32 / ATLAS_COLUMNS;
        let ox = col * cell_w;
        let oy = row * cell_h;
        for y in 0..metrics.height {
            for x in 0..metrics.width {
                let dst = (oy + y as u32) * atlas_w + ox + x as u32;
                pixels[dst as usize] = bitmap[y * metrics.width + x];
            }
        }
        glyphs.insert(
            *c,
            Glyph {
                uv_min: [ox as f32 / atlas_w as f32, oy as f32 / atlas_h as f32],
                uv_max: [
                    (ox as f32 + metrics.width as f32) / atlas_w as f32,
                    (oy as f32 + metrics.height as f32) / atlas_h as f32,
                ],
                size: [metrics.width as f32, metrics.height as f32],
                offset: [
                    metrics.xmin as f32,
                    ascent - metrics.ymin as f32 - metrics.height as f32,
                ],
                advance: metrics.advance_width,
            },
        );
    }

    let texture = gpu.device.create_texture_with_data(
        &gpu.queue,
        &wgpu::TextureDescriptor {
            label: Some("HUD Atlas"),
            size: wgpu::Extent3d {
                width: atlas_w,
                height: atlas_h,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &pixels,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("HUD Atlas Sampler"),
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("HUD Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
    });

    TextPainter {
        glyphs,
        line_height: line_metrics.new_line_size,
        bind_group,
    }
}
