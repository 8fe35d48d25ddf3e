//! Walks a [`FramePlan`], recording the actual wgpu passes.
//!
//! The executor owns no buffers and creates none; it resolves the plan's
//! roles and attachments against the controller's [`FrameBufferSet`] and
//! records fullscreen draws, scene re-renders, and depth copies in plan
//! order. That a pass never samples its own target is guaranteed by the
//! planner (and its tests), not re-checked here.

use crate::framebuffer::HDR_FORMAT;
use crate::gpu::GpuContext;
use crate::pipeline::plan::{Binding, BufferRole, FramePlan, PassStep, Target};
use crate::pipeline::FrameBufferSet;
use crate::scene::{ScenePass, SceneRenderer};
use crate::screen_pass::PassUniforms;
use crate::shaders::ShaderLibrary;

/// Everything one effect execution needs besides the buffers.
pub struct ExecuteContext<'a> {
    pub gpu: &'a GpuContext,
    pub encoder: &'a mut wgpu::CommandEncoder,
    /// The on-screen surface view for this frame.
    pub screen: &'a wgpu::TextureView,
    pub library: &'a ShaderLibrary,
    pub scene: &'a SceneRenderer,
    /// Base uniforms for every pass; the executor fills in the per-pass
    /// blur direction.
    pub uniforms: PassUniforms,
}

/// Runs every step of `plan` in order.
pub fn execute(plan: &FramePlan, buffers: &FrameBufferSet, ctx: &mut ExecuteContext<'_>) {
    for step in &plan.steps {
        match step {
            PassStep::Scene { target, depth_only } => {
                let buffer = buffers.get(*target);
                let pass = if *depth_only {
                    ScenePass::DepthOnly {
                        depth: buffer.depth_view(),
                    }
                } else {
                    ScenePass::Forward {
                        color: buffer.color_view(0),
                        depth: buffer.depth_view(),
                    }
                };
                ctx.scene.render(ctx.encoder, pass);
            }

            PassStep::Fullscreen {
                program,
                target,
                clear,
                inputs,
                depth_input,
                horizontal,
            } => {
                let (view, format) = match target {
                    Target::Screen => (ctx.screen, ctx.gpu.config.format),
                    Target::Buffer(role) => (
                        buffers.get(*role).color_view(0),
                        role.kind().color_formats()[0],
                    ),
                    Target::Ping(i) => (
                        buffers.get(BufferRole::PingPong).color_view(*i as usize),
                        HDR_FORMAT,
                    ),
                };
                let input_views: Vec<&wgpu::TextureView> = inputs
                    .iter()
                    .map(|binding| match binding {
                        Binding::Buffer(role, attachment) => {
                            buffers.get(*role).color_view(attachment.color_index())
                        }
                        Binding::Noise => ctx.library.noise_view(),
                    })
                    .collect();
                let depth_view = depth_input.map(|role| buffers.get(role).depth_view());

                let mut uniforms = ctx.uniforms;
                uniforms.horizontal = match horizontal {
                    Some(true) | None => 1.0,
                    Some(false) => 0.0,
                };

                ctx.library.pass(*program).draw(
                    ctx.gpu,
                    ctx.encoder,
                    view,
                    format,
                    *clear,
                    &input_views,
                    depth_view,
                    &uniforms,
                );
            }

            PassStep::CopyDepth { from, to } => {
                buffers
                    .get(*from)
                    .copy_depth_to(ctx.encoder, buffers.get(*to));
            }

            PassStep::Overlay => {
                ctx.scene.render(
                    ctx.encoder,
                    ScenePass::Overlay {
                        color: ctx.screen,
                        depth: buffers.get(BufferRole::Scene).depth_view(),
                    },
                );
            }
        }
    }
}
