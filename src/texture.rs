//! Procedurally generated textures.
//!
//! The demo ships no image assets; the one sampled texture the effect
//! library needs (the frosted-glass noise) is generated at startup.

use crate::gpu::GpuContext;
use wgpu::util::DeviceExt;

/// A small tiling RGBA noise texture.
pub struct NoiseTexture {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl NoiseTexture {
    /// Generates a `size` x `size` noise texture from a simple LCG stream.
    pub fn new(gpu: &GpuContext, size: u32, seed: u32) -> Self {
        let mut data = vec![0u8; (size * size * 4) as usize];
        let mut state = seed.wrapping_mul(747796405).wrapping_add(2891336453);
        for px in data.chunks_exact_mut(4) {
            for channel in px.iter_mut().take(3) {
                state = state.wrapping_mul(1664525).wrapping_add(1013904223);
                *channel = (state >> 24) as u8;
            }
            px[3] = 255;
        }

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some("Noise Texture"),
                size: wgpu::Extent3d {
                    width: size,
                    height: size,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }

    /// View for binding as a shader input.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}
