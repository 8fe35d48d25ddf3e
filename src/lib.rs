//! # Afterglow
//!
//! **An interactive multi-pass post-processing playground built on wgpu.**
//!
//! Afterglow renders a small 3D scene into offscreen frame buffers and runs
//! one of ~38 post-processing effects over it every frame — from one-pass
//! color filters up to iterative Gaussian blurs, bloom, lens flare, deferred
//! shading, and SSAO. The interesting machinery is the pipeline that decides,
//! per effect, which buffers are allocated, written, sampled, and in what
//! order:
//!
//! - [`FrameBuffer`] — offscreen render targets with fixed attachment sets
//! - [`Effect`] — the closed effect catalog mapping each effect to its
//!   required source buffer kind
//! - [`pipeline::plan`] — pure, testable per-effect pass plans
//! - [`PipelineController`] — buffer ownership, reallocation on resize or
//!   effect switch, and the per-frame begin/run/end sequence
//! - [`run`] — the frame loop driving scene render, post passes, and HUD
//!
//! ## Quick start
//!
//! ```no_run
//! use afterglow::{AppConfig, Effect};
//!
//! fn main() {
//!     afterglow::run(AppConfig::new().effect(Effect::Bloom));
//! }
//! ```

mod app;
mod camera;
mod effects;
mod framebuffer;
mod gpu;
mod hud;
mod input;
mod mesh;
pub mod pipeline;
mod scene;
mod screen_pass;
mod shaders;
mod texture;

pub use app::{AppConfig, run};
pub use camera::Camera;
pub use effects::{Effect, EffectInfo, UnknownEffect};
pub use framebuffer::{FrameBuffer, FrameBufferError, FrameBufferKind};
pub use gpu::GpuContext;
pub use hud::Hud;
pub use input::Input;
pub use mesh::{Mesh, MeshData, Transform, Vertex3d};
pub use pipeline::PipelineController;
pub use scene::{Lights, Material, ScenePass, SceneRenderer};
pub use screen_pass::{PassUniforms, ScreenPass};
pub use shaders::ShaderLibrary;

// Re-export the math types used across the public API.
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
