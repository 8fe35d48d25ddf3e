//! The compiled shader program library.
//!
//! [`ShaderLibrary`] compiles one [`ScreenPass`] per [`Program`] at startup
//! and owns the procedural noise texture some programs sample. Fragment
//! sources live in `src/shaders/`; the target formats a program can write
//! are derived from where the pass planner sends it.

use std::collections::HashMap;

use crate::framebuffer::{HDR_FORMAT, OCCLUSION_FORMAT};
use crate::gpu::GpuContext;
use crate::pipeline::Program;
use crate::screen_pass::ScreenPass;
use crate::texture::NoiseTexture;

fn source(program: Program) -> &'static str {
    match program {
        Program::Passthrough => include_str!("shaders/passthrough.wgsl"),
        Program::Invert => include_str!("shaders/invert.wgsl"),
        Program::Grayscale => include_str!("shaders/grayscale.wgsl"),
        Program::Kernel => include_str!("shaders/kernel.wgsl"),
        Program::KernelBlur => include_str!("shaders/kernel_blur.wgsl"),
        Program::SobelEdge => include_str!("shaders/sobel_edge.wgsl"),
        Program::FreiChenEdge => include_str!("shaders/frei_chen_edge.wgsl"),
        Program::ScreenWave => include_str!("shaders/screen_wave.wgsl"),
        Program::Swirl => include_str!("shaders/swirl.wgsl"),
        Program::NightVision => include_str!("shaders/night_vision.wgsl"),
        Program::LensCircle => include_str!("shaders/lens_circle.wgsl"),
        Program::Posterize => include_str!("shaders/posterize.wgsl"),
        Program::DreamVision => include_str!("shaders/dream_vision.wgsl"),
        Program::Pixelate => include_str!("shaders/pixelate.wgsl"),
        Program::FrostedGlass => include_str!("shaders/frosted_glass.wgsl"),
        Program::FrostedGlassNoise => include_str!("shaders/frosted_glass_noise.wgsl"),
        Program::Crosshatch => include_str!("shaders/crosshatch.wgsl"),
        Program::ThermalVision => include_str!("shaders/thermal_vision.wgsl"),
        Program::Toonify => include_str!("shaders/toonify.wgsl"),
        Program::Shockwave => include_str!("shaders/shockwave.wgsl"),
        Program::FishEye => include_str!("shaders/fish_eye.wgsl"),
        Program::Barrel => include_str!("shaders/barrel.wgsl"),
        Program::FishEyeGrid => include_str!("shaders/fish_eye_grid.wgsl"),
        Program::FishEyeLens => include_str!("shaders/fish_eye_lens.wgsl"),
        Program::AntiFishEye => include_str!("shaders/anti_fish_eye.wgsl"),
        Program::GaussianBlur => include_str!("shaders/gaussian_blur.wgsl"),
        Program::BoxBlur => include_str!("shaders/box_blur.wgsl"),
        Program::RadialBlur => include_str!("shaders/radial_blur.wgsl"),
        Program::MotionBlur => include_str!("shaders/motion_blur.wgsl"),
        Program::DepthView => include_str!("shaders/depth_view.wgsl"),
        Program::Vignette => include_str!("shaders/vignette.wgsl"),
        Program::BloomCombine => include_str!("shaders/bloom_combine.wgsl"),
        Program::ToneMapping => include_str!("shaders/tone_mapping.wgsl"),
        Program::LensGhost => include_str!("shaders/lens_ghost.wgsl"),
        Program::LensCombine => include_str!("shaders/lens_combine.wgsl"),
        Program::Fxaa => include_str!("shaders/fxaa.wgsl"),
        Program::Deferred => include_str!("shaders/deferred.wgsl"),
        Program::SsaoOcclusion => include_str!("shaders/ssao_occlusion.wgsl"),
        Program::SsaoBlur => include_str!("shaders/ssao_blur.wgsl"),
        Program::SsaoLighting => include_str!("shaders/ssao_lighting.wgsl"),
    }
}

/// The target formats a program's pipeline must support, derived from the
/// pass plans: blur iterations write the HDR ping-pong pair (and the screen
/// for the standalone blur's display pass), ghost generation writes the HDR
/// aux buffer, the SSAO intermediate passes write occlusion buffers, and
/// everything else writes the screen.
fn target_formats(program: Program, surface: wgpu::TextureFormat) -> Vec<wgpu::TextureFormat> {
    match program {
        Program::GaussianBlur => vec![HDR_FORMAT, surface],
        Program::LensGhost => vec![HDR_FORMAT],
        Program::SsaoOcclusion | Program::SsaoBlur => vec![OCCLUSION_FORMAT],
        _ => vec![surface],
    }
}

/// All compiled post-processing programs plus their shared noise texture.
pub struct ShaderLibrary {
    passes: HashMap<Program, ScreenPass>,
    noise: NoiseTexture,
}

impl ShaderLibrary {
    /// Compiles every program. Done once at startup; shader compilation
    /// failures are programmer errors and panic inside wgpu.
    pub fn new(gpu: &GpuContext) -> Self {
        let surface = gpu.config.format;
        let passes = Program::ALL
            .iter()
            .map(|&program| {
                let pass = ScreenPass::new(
                    gpu,
                    &format!("{:?}", program),
                    source(program),
                    program.color_inputs(),
                    program.samples_depth(),
                    &target_formats(program, surface),
                );
                (program, pass)
            })
            .collect();

        Self {
            passes,
            noise: NoiseTexture::new(gpu, 64, 7),
        }
    }

    /// The compiled pass for `program`.
    pub fn pass(&self, program: Program) -> &ScreenPass {
        &self.passes[&program]
    }

    /// The noise texture view for [`crate::pipeline::Binding::Noise`] inputs.
    pub fn noise_view(&self) -> &wgpu::TextureView {
        self.noise.view()
    }
}
