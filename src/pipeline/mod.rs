//! Post-processing pipeline orchestration.
//!
//! [`PipelineController`] owns the full set of offscreen buffers and drives
//! each frame through the same sequence: `begin_frame` (re)allocates buffers
//! if the size or effect changed and selects the scene target, the frame
//! loop renders the scene into that target, `run_effect` executes the
//! effect's pass plan, and `end_frame` returns to the on-screen target.
//!
//! Buffer lifecycles live entirely here. The executor only ever borrows the
//! buffer set, and reallocation always releases every buffer before creating
//! the new set — attachment sets never change in place.

mod executor;
mod plan;

pub use executor::{ExecuteContext, execute};
pub use plan::{
    Attachment, Binding, BlurRead, BlurSchedule, BlurStep, BufferRole, FramePlan, PassStep,
    Program, Target, blur_schedule, plan, scene_target_for, slot, BLOOM_BLUR_ITERATIONS,
    BLUR_ITERATIONS,
};

use crate::effects::Effect;
use crate::framebuffer::{FrameBuffer, FrameBufferError, FrameBufferKind};
use crate::gpu::GpuContext;
use crate::scene::ScenePass;

/// The seven frame buffers the pipeline owns, indexed by [`BufferRole`].
pub struct FrameBufferSet {
    buffers: Vec<FrameBuffer>,
}

impl FrameBufferSet {
    fn allocate(gpu: &GpuContext, width: u32, height: u32) -> Result<Self, FrameBufferError> {
        let buffers = BufferRole::ALL
            .iter()
            .map(|role| FrameBuffer::new(gpu, width, height, role.kind()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { buffers })
    }

    fn release_all(&mut self) {
        for buffer in &mut self.buffers {
            buffer.release();
        }
    }

    /// The buffer allocated for `role`.
    pub fn get(&self, role: BufferRole) -> &FrameBuffer {
        &self.buffers[role as usize]
    }
}

/// Top-level pipeline state: buffers, current effect, and the dirty flag
/// that triggers reallocation.
pub struct PipelineController {
    buffers: FrameBufferSet,
    width: u32,
    height: u32,
    effect: Effect,
    dirty: bool,
    current_plan: FramePlan,
    /// The buffer currently bound as the scene target, if any. `None` means
    /// the on-screen target is active.
    active: Option<BufferRole>,
}

impl PipelineController {
    /// Allocates every frame buffer. Failure here is fatal to startup.
    pub fn new(
        gpu: &GpuContext,
        width: u32,
        height: u32,
        effect: Effect,
    ) -> Result<Self, FrameBufferError> {
        let buffers = FrameBufferSet::allocate(gpu, width, height)?;
        log::debug!("allocated {} frame buffers at {}x{}", BufferRole::ALL.len(), width, height);
        Ok(Self {
            buffers,
            width,
            height,
            effect,
            dirty: false,
            current_plan: plan(effect),
            active: None,
        })
    }

    /// The effect selected for the current frame.
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// Marks the buffers stale after a window resize. The next `begin_frame`
    /// releases and reallocates them at the new size.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if (width, height) != (self.width, self.height) {
            self.width = width;
            self.height = height;
            self.dirty = true;
        }
    }

    /// Switches the active effect, scheduling a buffer reallocation like the
    /// resize path does.
    pub fn set_effect(&mut self, effect: Effect) {
        if effect != self.effect {
            log::info!("effect: {}", effect.name());
            self.effect = effect;
            self.dirty = true;
        }
    }

    /// Starts a frame: reallocates if dirty, computes the pass plan, and
    /// activates the effect's scene target.
    pub fn begin_frame(&mut self, gpu: &GpuContext) -> Result<(), FrameBufferError> {
        if self.dirty {
            // Release everything before creating anything; buffers are never
            // resized in place.
            self.buffers.release_all();
            self.buffers = FrameBufferSet::allocate(gpu, self.width, self.height)?;
            log::debug!("reallocated frame buffers at {}x{}", self.width, self.height);
            self.dirty = false;
        }
        self.current_plan = plan(self.effect);
        self.active = self.current_plan.scene_target;
        Ok(())
    }

    /// The scene render pass for the active target, cleared like the
    /// original's `Bind(true)`. `None` when the effect's source kind has no
    /// scene activation path (ping-pong keyed) or the target carries no
    /// color (depth-only).
    pub fn scene_pass(&self) -> Option<ScenePass<'_>> {
        let role = self.active?;
        let buffer = self.buffers.get(role);
        match role.kind() {
            FrameBufferKind::Color => Some(ScenePass::Forward {
                color: buffer.color_view(0),
                depth: buffer.depth_view(),
            }),
            FrameBufferKind::Geometry => Some(ScenePass::GBuffer {
                color: buffer.color_views(),
                depth: buffer.depth_view(),
            }),
            FrameBufferKind::DepthOnly => Some(ScenePass::DepthOnly {
                depth: buffer.depth_view(),
            }),
            FrameBufferKind::PingPong | FrameBufferKind::Occlusion => None,
        }
    }

    /// Runs the effect's post-processing passes.
    pub fn run_effect(&mut self, ctx: &mut ExecuteContext<'_>) {
        execute(&self.current_plan, &self.buffers, ctx);
    }

    /// Restores the on-screen target. Post passes carry no depth attachment,
    /// so depth testing cannot clip the fullscreen quads; the HUD pass that
    /// follows resets the full viewport.
    pub fn end_frame(&mut self) {
        self.active = None;
        debug_assert!(self.on_screen());
    }

    /// True when no offscreen buffer is active.
    pub fn on_screen(&self) -> bool {
        self.active.is_none()
    }
}
