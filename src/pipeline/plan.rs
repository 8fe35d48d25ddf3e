//! Pure pass planning for the post-processing pipeline.
//!
//! Every effect is described by a [`FramePlan`]: the buffer the scene render
//! must target, followed by the ordered list of [`PassStep`]s that turn the
//! captured scene into the final on-screen image. Plans are plain data with
//! no GPU types in them, so every ordering and data-dependency rule in this
//! module is unit-tested without a device; the executor walks the plan and
//! records the actual wgpu passes.
//!
//! # Texture slot contract
//!
//! A fullscreen step's `inputs[i]` is bound at texture slot `i` (`tex0` ..
//! `tex3` in WGSL). The [`slot`] constants name the slots each multi-input
//! program expects; shader sources and plans both follow that table instead
//! of re-deriving positions per call site.

use crate::effects::Effect;
use crate::framebuffer::FrameBufferKind;

/// Iterations for the standalone Gaussian blur effect.
///
/// Deliberately one less than [`BLOOM_BLUR_ITERATIONS`]; the two counts come
/// from different tunings and are kept as separate constants.
pub const BLUR_ITERATIONS: u32 = 9;
/// Iterations for the bright-pass blur feeding bloom and lens flare.
pub const BLOOM_BLUR_ITERATIONS: u32 = 10;

/// Named texture slots for the multi-input programs.
pub mod slot {
    /// The single source image of a one-input pass.
    pub const SOURCE: usize = 0;
    /// The original HDR scene color in composite passes.
    pub const SCENE: usize = 0;
    /// The blurred bright-pass image in the bloom composite.
    pub const BLUR: usize = 1;
    /// The ghost-feature image in the lens flare composite.
    pub const GHOST: usize = 1;
    /// The noise texture of the frosted-glass-noise pass.
    pub const NOISE: usize = 1;
    /// World position in deferred / SSAO passes.
    pub const POSITION: usize = 0;
    /// World normal in deferred / SSAO passes.
    pub const NORMAL: usize = 1;
    /// Albedo in deferred / SSAO lighting passes.
    pub const ALBEDO: usize = 2;
    /// Blurred occlusion in the SSAO lighting pass.
    pub const OCCLUSION: usize = 3;
}

/// The fixed set of frame buffers the pipeline owns, by role.
///
/// The layout mirrors the seven buffers the effects need: a plain scene
/// capture, the geometry buffer, the blur ping-pong pair, a depth-only
/// buffer for depth prepasses, an auxiliary color buffer for lens flare
/// ghosts, and the raw/blurred occlusion pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BufferRole {
    Scene,
    Geometry,
    PingPong,
    Depth,
    Aux,
    OcclusionRaw,
    OcclusionBlur,
}

impl BufferRole {
    /// Every role, in allocation order.
    pub const ALL: [BufferRole; 7] = [
        BufferRole::Scene,
        BufferRole::Geometry,
        BufferRole::PingPong,
        BufferRole::Depth,
        BufferRole::Aux,
        BufferRole::OcclusionRaw,
        BufferRole::OcclusionBlur,
    ];

    /// The frame buffer kind allocated for this role.
    pub const fn kind(self) -> FrameBufferKind {
        match self {
            BufferRole::Scene => FrameBufferKind::Color,
            BufferRole::Geometry => FrameBufferKind::Geometry,
            BufferRole::PingPong => FrameBufferKind::PingPong,
            BufferRole::Depth => FrameBufferKind::DepthOnly,
            BufferRole::Aux => FrameBufferKind::Color,
            BufferRole::OcclusionRaw => FrameBufferKind::Occlusion,
            BufferRole::OcclusionBlur => FrameBufferKind::Occlusion,
        }
    }
}

/// The buffer a scene render activates for a given source kind.
///
/// `PingPong` and `Occlusion` kinds have no direct activation path: ping-pong
/// buffers are only ever intermediate blur targets and occlusion buffers are
/// only written by SSAO passes, so neither is ever the scene target.
pub const fn scene_target_for(kind: FrameBufferKind) -> Option<BufferRole> {
    match kind {
        FrameBufferKind::Color => Some(BufferRole::Scene),
        FrameBufferKind::Geometry => Some(BufferRole::Geometry),
        FrameBufferKind::DepthOnly => Some(BufferRole::Depth),
        FrameBufferKind::PingPong | FrameBufferKind::Occlusion => None,
    }
}

/// A named attachment within a frame buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Attachment {
    /// The HDR scene color (attachment 0 of `Color` and `Geometry` buffers).
    Hdr,
    /// The bright-pass extraction (attachment 1 of the geometry buffer).
    Bright,
    /// World position (attachment 2 of the geometry buffer).
    Position,
    /// World normal (attachment 3 of the geometry buffer).
    Normal,
    /// Albedo (attachment 4 of the geometry buffer).
    Albedo,
    /// The occlusion channel of an `Occlusion` buffer.
    Occlusion,
    /// One half of a ping-pong pair.
    Ping(u8),
}

impl Attachment {
    /// The color attachment index backing this name.
    pub const fn color_index(self) -> usize {
        match self {
            Attachment::Hdr | Attachment::Occlusion => 0,
            Attachment::Bright => 1,
            Attachment::Position => 2,
            Attachment::Normal => 3,
            Attachment::Albedo => 4,
            Attachment::Ping(i) => i as usize,
        }
    }
}

/// One sampled input of a fullscreen pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    /// An attachment of one of the pipeline's frame buffers.
    Buffer(BufferRole, Attachment),
    /// The shader library's procedural noise texture.
    Noise,
}

/// Where a fullscreen pass writes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// The on-screen surface.
    Screen,
    /// Color attachment 0 of the buffer with the given role.
    Buffer(BufferRole),
    /// One half of the ping-pong pair.
    Ping(u8),
}

/// The shader programs the pass executor can run.
///
/// Most effects own exactly one program; the multi-pass effects contribute
/// their intermediate programs here as well. The bright-pass view effect
/// reuses `Passthrough` over the bright attachment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Program {
    Passthrough,
    Invert,
    Grayscale,
    Kernel,
    KernelBlur,
    SobelEdge,
    FreiChenEdge,
    ScreenWave,
    Swirl,
    NightVision,
    LensCircle,
    Posterize,
    DreamVision,
    Pixelate,
    FrostedGlass,
    FrostedGlassNoise,
    Crosshatch,
    ThermalVision,
    Toonify,
    Shockwave,
    FishEye,
    Barrel,
    FishEyeGrid,
    FishEyeLens,
    AntiFishEye,
    GaussianBlur,
    BoxBlur,
    RadialBlur,
    MotionBlur,
    DepthView,
    Vignette,
    BloomCombine,
    ToneMapping,
    LensGhost,
    LensCombine,
    Fxaa,
    Deferred,
    SsaoOcclusion,
    SsaoBlur,
    SsaoLighting,
}

impl Program {
    /// Every program, for shader library construction.
    pub const ALL: [Program; 40] = [
        Program::Passthrough,
        Program::Invert,
        Program::Grayscale,
        Program::Kernel,
        Program::KernelBlur,
        Program::SobelEdge,
        Program::FreiChenEdge,
        Program::ScreenWave,
        Program::Swirl,
        Program::NightVision,
        Program::LensCircle,
        Program::Posterize,
        Program::DreamVision,
        Program::Pixelate,
        Program::FrostedGlass,
        Program::FrostedGlassNoise,
        Program::Crosshatch,
        Program::ThermalVision,
        Program::Toonify,
        Program::Shockwave,
        Program::FishEye,
        Program::Barrel,
        Program::FishEyeGrid,
        Program::FishEyeLens,
        Program::AntiFishEye,
        Program::GaussianBlur,
        Program::BoxBlur,
        Program::RadialBlur,
        Program::MotionBlur,
        Program::DepthView,
        Program::Vignette,
        Program::BloomCombine,
        Program::ToneMapping,
        Program::LensGhost,
        Program::LensCombine,
        Program::Fxaa,
        Program::Deferred,
        Program::SsaoOcclusion,
        Program::SsaoBlur,
        Program::SsaoLighting,
    ];

    /// Number of sampled color inputs (`tex0` .. `texN-1`).
    pub const fn color_inputs(self) -> u32 {
        match self {
            Program::FrostedGlassNoise
            | Program::BloomCombine
            | Program::LensCombine
            | Program::SsaoOcclusion => 2,
            Program::Deferred => 3,
            Program::SsaoLighting => 4,
            _ => 1,
        }
    }

    /// Whether the program samples a depth attachment (`depth_tex`).
    pub const fn samples_depth(self) -> bool {
        matches!(self, Program::MotionBlur | Program::DepthView)
    }

    /// Whether the program evaluates the scene lights.
    pub const fn uses_lights(self) -> bool {
        matches!(self, Program::Deferred | Program::SsaoLighting)
    }
}

/// One step of an effect's frame program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PassStep {
    /// Re-render the scene into a buffer, optionally depth-only.
    Scene { target: BufferRole, depth_only: bool },
    /// Draw one fullscreen pass.
    Fullscreen {
        program: Program,
        target: Target,
        clear: bool,
        inputs: Vec<Binding>,
        /// Depth attachment sampled by the program, if any.
        depth_input: Option<BufferRole>,
        /// Blur direction uniform for separable-blur passes.
        horizontal: Option<bool>,
    },
    /// Copy `from`'s depth attachment into `to`'s depth attachment.
    CopyDepth { from: BufferRole, to: BufferRole },
    /// Forward-render the light markers over the screen, depth-tested
    /// against the scene buffer's (just copied) depth.
    Overlay,
}

/// The full frame program for one effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramePlan {
    /// Buffer the scene render targets at the start of the frame, per the
    /// effect catalog. `None` means no scene activation (ping-pong-keyed).
    pub scene_target: Option<BufferRole>,
    /// Post-processing steps, in execution order.
    pub steps: Vec<PassStep>,
}

/// Where one blur iteration reads from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlurRead {
    /// The effect's seed texture (first iteration only).
    Seed,
    /// A half of the ping-pong pair.
    Ping(u8),
}

/// One iteration of the separable Gaussian blur.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlurStep {
    /// Blur direction for this iteration.
    pub horizontal: bool,
    /// Ping-pong half written this iteration.
    pub write: u8,
    /// Where this iteration samples from.
    pub read: BlurRead,
}

/// The iteration schedule of a separable Gaussian blur.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlurSchedule {
    pub steps: Vec<BlurStep>,
    /// Ping-pong half holding the accepted blurred image after the last step.
    pub output: u8,
    /// Direction state after the final flip, used by the standalone blur's
    /// display pass.
    pub final_horizontal: bool,
}

/// Builds the blur schedule: direction starts horizontal and flips every
/// iteration; iteration 0 reads the seed, iteration `i > 0` reads the half
/// written by iteration `i - 1`.
pub fn blur_schedule(iterations: u32) -> BlurSchedule {
    assert!(iterations > 0, "blur needs at least one iteration");
    let mut steps = Vec::with_capacity(iterations as usize);
    let mut horizontal = true;
    for i in 0..iterations {
        let write = horizontal as u8;
        let read = if i == 0 {
            BlurRead::Seed
        } else {
            BlurRead::Ping(1 - write)
        };
        steps.push(BlurStep {
            horizontal,
            write,
            read,
        });
        horizontal = !horizontal;
    }
    let output = steps.last().unwrap().write;
    BlurSchedule {
        steps,
        output,
        final_horizontal: horizontal,
    }
}

fn blur_steps(seed: Binding, iterations: u32, steps: &mut Vec<PassStep>) -> BlurSchedule {
    let schedule = blur_schedule(iterations);
    for blur in &schedule.steps {
        let input = match blur.read {
            BlurRead::Seed => seed.clone(),
            BlurRead::Ping(i) => Binding::Buffer(BufferRole::PingPong, Attachment::Ping(i)),
        };
        steps.push(PassStep::Fullscreen {
            program: Program::GaussianBlur,
            target: Target::Ping(blur.write),
            clear: true,
            inputs: vec![input],
            depth_input: None,
            horizontal: Some(blur.horizontal),
        });
    }
    schedule
}

fn single(program: Program, inputs: Vec<Binding>) -> Vec<PassStep> {
    vec![PassStep::Fullscreen {
        program,
        target: Target::Screen,
        clear: true,
        inputs,
        depth_input: None,
        horizontal: None,
    }]
}

fn scene_color() -> Vec<Binding> {
    vec![Binding::Buffer(BufferRole::Scene, Attachment::Hdr)]
}

/// Builds the frame program for `effect`.
pub fn plan(effect: Effect) -> FramePlan {
    use Attachment::*;
    use BufferRole::*;

    let scene_target = scene_target_for(effect.source_kind());

    let steps = match effect {
        // Single-pass effects over the captured scene color.
        Effect::Passthrough => single(Program::Passthrough, scene_color()),
        Effect::Invert => single(Program::Invert, scene_color()),
        Effect::Grayscale => single(Program::Grayscale, scene_color()),
        Effect::Kernel => single(Program::Kernel, scene_color()),
        Effect::KernelBlur => single(Program::KernelBlur, scene_color()),
        Effect::SobelEdge => single(Program::SobelEdge, scene_color()),
        Effect::FreiChenEdge => single(Program::FreiChenEdge, scene_color()),
        Effect::ScreenWave => single(Program::ScreenWave, scene_color()),
        Effect::Swirl => single(Program::Swirl, scene_color()),
        Effect::NightVision => single(Program::NightVision, scene_color()),
        Effect::LensCircle => single(Program::LensCircle, scene_color()),
        Effect::Posterize => single(Program::Posterize, scene_color()),
        Effect::DreamVision => single(Program::DreamVision, scene_color()),
        Effect::Pixelate => single(Program::Pixelate, scene_color()),
        Effect::FrostedGlass => single(Program::FrostedGlass, scene_color()),
        Effect::FrostedGlassNoise => single(
            Program::FrostedGlassNoise,
            vec![Binding::Buffer(Scene, Hdr), Binding::Noise],
        ),
        Effect::Crosshatch => single(Program::Crosshatch, scene_color()),
        Effect::ThermalVision => single(Program::ThermalVision, scene_color()),
        Effect::Toonify => single(Program::Toonify, scene_color()),
        Effect::Shockwave => single(Program::Shockwave, scene_color()),
        Effect::FishEye => single(Program::FishEye, scene_color()),
        Effect::Barrel => single(Program::Barrel, scene_color()),
        Effect::FishEyeGrid => single(Program::FishEyeGrid, scene_color()),
        Effect::FishEyeLens => single(Program::FishEyeLens, scene_color()),
        Effect::AntiFishEye => single(Program::AntiFishEye, scene_color()),
        Effect::BoxBlur => single(Program::BoxBlur, scene_color()),
        Effect::RadialBlur => single(Program::RadialBlur, scene_color()),
        Effect::Vignette => single(Program::Vignette, scene_color()),
        Effect::Fxaa => single(Program::Fxaa, scene_color()),

        // Iterative blur of the scene capture, then one display pass.
        Effect::GaussianBlur => {
            let mut steps = Vec::new();
            let schedule = blur_steps(
                Binding::Buffer(Geometry, Hdr),
                BLUR_ITERATIONS,
                &mut steps,
            );
            steps.push(PassStep::Fullscreen {
                program: Program::GaussianBlur,
                target: Target::Screen,
                clear: true,
                inputs: vec![Binding::Buffer(PingPong, Ping(schedule.output))],
                depth_input: None,
                horizontal: Some(schedule.final_horizontal),
            });
            steps
        }

        // Depth-prepass effects: re-render the scene depth-only, then one
        // screen pass sampling scene color and that depth.
        Effect::MotionBlur => vec![
            PassStep::Scene {
                target: Depth,
                depth_only: true,
            },
            PassStep::Fullscreen {
                program: Program::MotionBlur,
                target: Target::Screen,
                clear: true,
                inputs: scene_color(),
                depth_input: Some(Depth),
                horizontal: None,
            },
        ],
        Effect::DepthView => vec![
            PassStep::Scene {
                target: Depth,
                depth_only: true,
            },
            PassStep::Fullscreen {
                program: Program::DepthView,
                target: Target::Screen,
                clear: true,
                inputs: scene_color(),
                depth_input: Some(Depth),
                horizontal: None,
            },
        ],

        // Views over the geometry buffer.
        Effect::BrightPass => single(
            Program::Passthrough,
            vec![Binding::Buffer(Geometry, Bright)],
        ),
        Effect::ToneMapping => {
            single(Program::ToneMapping, vec![Binding::Buffer(Geometry, Hdr)])
        }

        // Bloom: blur the bright pass, then add it onto the HDR scene.
        Effect::Bloom => {
            let mut steps = Vec::new();
            let schedule = blur_steps(
                Binding::Buffer(Geometry, Bright),
                BLOOM_BLUR_ITERATIONS,
                &mut steps,
            );
            steps.push(PassStep::Fullscreen {
                program: Program::BloomCombine,
                target: Target::Screen,
                clear: true,
                inputs: vec![
                    Binding::Buffer(Geometry, Hdr),                // slot::SCENE
                    Binding::Buffer(PingPong, Ping(schedule.output)), // slot::BLUR
                ],
                depth_input: None,
                horizontal: None,
            });
            steps
        }

        // Lens flare: blur the bright pass, generate ghost features into the
        // aux buffer, then composite ghosts over the HDR scene. The ghost
        // pass must consume the blur output and the composite must consume
        // the ghost output; reordering corrupts the layering.
        Effect::LensFlare => {
            let mut steps = Vec::new();
            let schedule = blur_steps(
                Binding::Buffer(Geometry, Bright),
                BLOOM_BLUR_ITERATIONS,
                &mut steps,
            );
            steps.push(PassStep::Fullscreen {
                program: Program::LensGhost,
                target: Target::Buffer(Aux),
                clear: true,
                inputs: vec![Binding::Buffer(PingPong, Ping(schedule.output))],
                depth_input: None,
                horizontal: None,
            });
            steps.push(PassStep::Fullscreen {
                program: Program::LensCombine,
                target: Target::Screen,
                clear: true,
                inputs: vec![
                    Binding::Buffer(Geometry, Hdr), // slot::SCENE
                    Binding::Buffer(Aux, Hdr),      // slot::GHOST
                ],
                depth_input: None,
                horizontal: None,
            });
            steps
        }

        // Deferred shading: one composite from the geometry buffer, then the
        // geometry depth is copied to the scene buffer so the light markers
        // can be forward-rendered with correct depth testing.
        Effect::Deferred => vec![
            PassStep::Fullscreen {
                program: Program::Deferred,
                target: Target::Screen,
                clear: true,
                inputs: vec![
                    Binding::Buffer(Geometry, Position),
                    Binding::Buffer(Geometry, Normal),
                    Binding::Buffer(Geometry, Albedo),
                ],
                depth_input: None,
                horizontal: None,
            },
            PassStep::CopyDepth {
                from: Geometry,
                to: Scene,
            },
            PassStep::Overlay,
        ],

        // SSAO: occlusion, blur, lighting. The lighting pass reads the
        // blurred occlusion, never the raw buffer.
        Effect::Ssao => vec![
            PassStep::Fullscreen {
                program: Program::SsaoOcclusion,
                target: Target::Buffer(OcclusionRaw),
                clear: true,
                inputs: vec![
                    Binding::Buffer(Geometry, Position),
                    Binding::Buffer(Geometry, Normal),
                ],
                depth_input: None,
                horizontal: None,
            },
            PassStep::Fullscreen {
                program: Program::SsaoBlur,
                target: Target::Buffer(OcclusionBlur),
                clear: true,
                inputs: vec![Binding::Buffer(OcclusionRaw, Occlusion)],
                depth_input: None,
                horizontal: None,
            },
            PassStep::Fullscreen {
                program: Program::SsaoLighting,
                target: Target::Screen,
                clear: true,
                inputs: vec![
                    Binding::Buffer(Geometry, Position),
                    Binding::Buffer(Geometry, Normal),
                    Binding::Buffer(Geometry, Albedo),
                    Binding::Buffer(OcclusionBlur, Occlusion),
                ],
                depth_input: None,
                horizontal: None,
            },
        ],
    };

    FramePlan {
        scene_target,
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fullscreen_steps(plan: &FramePlan) -> Vec<&PassStep> {
        plan.steps
            .iter()
            .filter(|s| matches!(s, PassStep::Fullscreen { .. }))
            .collect()
    }

    fn last_target(plan: &FramePlan) -> Target {
        match fullscreen_steps(plan).last().unwrap() {
            PassStep::Fullscreen { target, .. } => *target,
            _ => unreachable!(),
        }
    }

    #[test]
    fn role_kinds_match_original_layout() {
        use FrameBufferKind::*;
        let kinds: Vec<FrameBufferKind> = BufferRole::ALL.iter().map(|r| r.kind()).collect();
        assert_eq!(
            kinds,
            vec![Color, Geometry, PingPong, DepthOnly, Color, Occlusion, Occlusion]
        );
    }

    #[test]
    fn ping_pong_has_no_activation_path() {
        assert_eq!(scene_target_for(FrameBufferKind::PingPong), None);
        assert_eq!(scene_target_for(FrameBufferKind::Occlusion), None);
        assert_eq!(
            scene_target_for(FrameBufferKind::Color),
            Some(BufferRole::Scene)
        );
        assert_eq!(
            scene_target_for(FrameBufferKind::Geometry),
            Some(BufferRole::Geometry)
        );
    }

    #[test]
    fn blur_direction_starts_horizontal_and_alternates() {
        let schedule = blur_schedule(BLUR_ITERATIONS);
        assert_eq!(schedule.steps.len(), 9);
        for (i, step) in schedule.steps.iter().enumerate() {
            assert_eq!(step.horizontal, i % 2 == 0);
        }
        assert!(schedule.steps[0].horizontal);
    }

    #[test]
    fn blur_reads_seed_then_previous_write() {
        let schedule = blur_schedule(BLOOM_BLUR_ITERATIONS);
        assert_eq!(schedule.steps[0].read, BlurRead::Seed);
        for pair in schedule.steps.windows(2) {
            assert_eq!(pair[1].read, BlurRead::Ping(pair[0].write));
            assert_ne!(pair[1].write, pair[0].write);
        }
        assert_eq!(schedule.output, schedule.steps.last().unwrap().write);
    }

    #[test]
    fn blur_output_parity_differs_between_odd_and_even_counts() {
        let odd = blur_schedule(9);
        let even = blur_schedule(10);
        assert_ne!(odd.output, even.output);
        assert_ne!(odd.final_horizontal, even.final_horizontal);
    }

    #[test]
    fn grayscale_is_one_pass_to_screen_from_scene_color() {
        let plan = plan(Effect::Grayscale);
        assert_eq!(plan.scene_target, Some(BufferRole::Scene));
        assert_eq!(plan.steps.len(), 1);
        match &plan.steps[0] {
            PassStep::Fullscreen {
                program,
                target,
                inputs,
                ..
            } => {
                assert_eq!(*program, Program::Grayscale);
                assert_eq!(*target, Target::Screen);
                assert_eq!(
                    inputs[slot::SOURCE],
                    Binding::Buffer(BufferRole::Scene, Attachment::Hdr)
                );
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn bloom_runs_ten_blur_iterations_then_composites() {
        let p = plan(Effect::Bloom);
        assert_eq!(p.scene_target, Some(BufferRole::Geometry));
        assert_eq!(p.steps.len(), BLOOM_BLUR_ITERATIONS as usize + 1);

        let blurs: Vec<&PassStep> = p.steps[..10].iter().collect();
        for step in &blurs {
            match step {
                PassStep::Fullscreen { program, .. } => {
                    assert_eq!(*program, Program::GaussianBlur)
                }
                other => panic!("unexpected step {:?}", other),
            }
        }
        // First blur reads the bright-pass seed.
        match &blurs[0] {
            PassStep::Fullscreen { inputs, .. } => assert_eq!(
                inputs[slot::SOURCE],
                Binding::Buffer(BufferRole::Geometry, Attachment::Bright)
            ),
            _ => unreachable!(),
        }
        // Composite adds the last-written ping-pong half onto the HDR scene.
        let expected_output = blur_schedule(BLOOM_BLUR_ITERATIONS).output;
        match &p.steps[10] {
            PassStep::Fullscreen {
                program,
                target,
                inputs,
                ..
            } => {
                assert_eq!(*program, Program::BloomCombine);
                assert_eq!(*target, Target::Screen);
                assert_eq!(
                    inputs[slot::SCENE],
                    Binding::Buffer(BufferRole::Geometry, Attachment::Hdr)
                );
                assert_eq!(
                    inputs[slot::BLUR],
                    Binding::Buffer(BufferRole::PingPong, Attachment::Ping(expected_output))
                );
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn standalone_blur_uses_nine_iterations() {
        let p = plan(Effect::GaussianBlur);
        let blur_count = p
            .steps
            .iter()
            .filter(|s| {
                matches!(
                    s,
                    PassStep::Fullscreen {
                        target: Target::Ping(_),
                        ..
                    }
                )
            })
            .count();
        assert_eq!(blur_count, BLUR_ITERATIONS as usize);
        assert_eq!(last_target(&p), Target::Screen);
    }

    #[test]
    fn lens_flare_ghosts_consume_blur_and_composite_consumes_ghosts() {
        let p = plan(Effect::LensFlare);
        let n = p.steps.len();
        assert_eq!(n, BLOOM_BLUR_ITERATIONS as usize + 2);

        let blur_output = blur_schedule(BLOOM_BLUR_ITERATIONS).output;
        match &p.steps[n - 2] {
            PassStep::Fullscreen {
                program,
                target,
                inputs,
                ..
            } => {
                assert_eq!(*program, Program::LensGhost);
                assert_eq!(*target, Target::Buffer(BufferRole::Aux));
                assert_eq!(
                    inputs[slot::SOURCE],
                    Binding::Buffer(BufferRole::PingPong, Attachment::Ping(blur_output))
                );
            }
            other => panic!("unexpected step {:?}", other),
        }
        match &p.steps[n - 1] {
            PassStep::Fullscreen {
                program,
                target,
                inputs,
                ..
            } => {
                assert_eq!(*program, Program::LensCombine);
                assert_eq!(*target, Target::Screen);
                assert_eq!(
                    inputs[slot::SCENE],
                    Binding::Buffer(BufferRole::Geometry, Attachment::Hdr)
                );
                assert_eq!(
                    inputs[slot::GHOST],
                    Binding::Buffer(BufferRole::Aux, Attachment::Hdr)
                );
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn motion_blur_renders_depth_prepass_first() {
        let p = plan(Effect::MotionBlur);
        assert_eq!(
            p.steps[0],
            PassStep::Scene {
                target: BufferRole::Depth,
                depth_only: true,
            }
        );
        match &p.steps[1] {
            PassStep::Fullscreen {
                program,
                depth_input,
                target,
                ..
            } => {
                assert_eq!(*program, Program::MotionBlur);
                assert_eq!(*depth_input, Some(BufferRole::Depth));
                assert_eq!(*target, Target::Screen);
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn deferred_copies_depth_exactly_once_right_after_composite() {
        let p = plan(Effect::Deferred);
        assert_eq!(p.steps.len(), 3);
        assert!(matches!(
            p.steps[0],
            PassStep::Fullscreen {
                program: Program::Deferred,
                target: Target::Screen,
                ..
            }
        ));
        assert_eq!(
            p.steps[1],
            PassStep::CopyDepth {
                from: BufferRole::Geometry,
                to: BufferRole::Scene,
            }
        );
        assert_eq!(p.steps[2], PassStep::Overlay);
        let copies = p
            .steps
            .iter()
            .filter(|s| matches!(s, PassStep::CopyDepth { .. }))
            .count();
        assert_eq!(copies, 1);
    }

    #[test]
    fn ssao_lighting_reads_blurred_occlusion_not_raw() {
        let p = plan(Effect::Ssao);
        assert_eq!(p.steps.len(), 3);
        let programs: Vec<Program> = p
            .steps
            .iter()
            .map(|s| match s {
                PassStep::Fullscreen { program, .. } => *program,
                other => panic!("unexpected step {:?}", other),
            })
            .collect();
        assert_eq!(
            programs,
            vec![
                Program::SsaoOcclusion,
                Program::SsaoBlur,
                Program::SsaoLighting,
            ]
        );
        // Blur consumes the raw buffer, lighting consumes the blurred one.
        match &p.steps[1] {
            PassStep::Fullscreen { inputs, target, .. } => {
                assert_eq!(
                    inputs[slot::SOURCE],
                    Binding::Buffer(BufferRole::OcclusionRaw, Attachment::Occlusion)
                );
                assert_eq!(*target, Target::Buffer(BufferRole::OcclusionBlur));
            }
            _ => unreachable!(),
        }
        match &p.steps[2] {
            PassStep::Fullscreen { inputs, .. } => {
                assert_eq!(
                    inputs[slot::OCCLUSION],
                    Binding::Buffer(BufferRole::OcclusionBlur, Attachment::Occlusion)
                );
                assert!(!inputs.contains(&Binding::Buffer(
                    BufferRole::OcclusionRaw,
                    Attachment::Occlusion
                )));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn every_plan_ends_on_screen() {
        for effect in Effect::ALL {
            let p = plan(effect);
            assert!(!p.steps.is_empty(), "{:?} has no steps", effect);
            assert_eq!(last_target(&p), Target::Screen, "{:?}", effect);
        }
    }

    #[test]
    fn plans_never_sample_their_own_target() {
        for effect in Effect::ALL {
            for step in plan(effect).steps {
                if let PassStep::Fullscreen { target, inputs, .. } = step {
                    for input in inputs {
                        if let Binding::Buffer(role, attachment) = input {
                            match target {
                                Target::Buffer(t) => assert_ne!(t, role, "{:?}", effect),
                                Target::Ping(i) => {
                                    if role == BufferRole::PingPong {
                                        assert_ne!(
                                            attachment,
                                            Attachment::Ping(i),
                                            "{:?} reads its own blur target",
                                            effect
                                        );
                                    }
                                }
                                Target::Screen => {}
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn program_input_counts_cover_plan_bindings() {
        for effect in Effect::ALL {
            for step in plan(effect).steps {
                if let PassStep::Fullscreen {
                    program,
                    inputs,
                    depth_input,
                    ..
                } = step
                {
                    assert_eq!(
                        inputs.len(),
                        program.color_inputs() as usize,
                        "{:?}/{:?}",
                        effect,
                        program
                    );
                    assert_eq!(depth_input.is_some(), program.samples_depth());
                }
            }
        }
    }
}
