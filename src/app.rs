//! The demo application and per-frame driver.
//!
//! One frame runs the fixed sequence the pipeline is built around:
//! activate the effect's scene target, render the scene into it, run the
//! effect's post-processing passes, restore the on-screen target, draw the
//! HUD overlay, and present.
//!
//! Controls: Left/Right cycle effects, `[` / `]` move the coverage split,
//! mouse drag orbits, scroll zooms, Esc quits.

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::{MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::camera::Camera;
use crate::effects::Effect;
use crate::gpu::GpuContext;
use crate::hud::Hud;
use crate::input::Input;
use crate::pipeline::{ExecuteContext, PipelineController};
use crate::scene::SceneRenderer;
use crate::screen_pass::PassUniforms;
use crate::shaders::ShaderLibrary;

/// Configuration for the demo window and starting state.
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub effect: Effect,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Afterglow".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            // The original demo boots into its flashiest effect.
            effect: Effect::LensFlare,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.effect = effect;
        self
    }
}

/// Runs the demo until the window closes.
pub fn run(config: AppConfig) {
    let event_loop = EventLoop::new().unwrap();
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::Pending { config };
    event_loop.run_app(&mut app).unwrap();
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    controller: PipelineController,
    library: ShaderLibrary,
    scene: SceneRenderer,
    hud: Hud,
    camera: Camera,
    input: Input,
    coverage: f32,
    prev_view_proj: glam::Mat4,
    start_time: Instant,
    last_frame: Instant,
    fps: f32,
}

enum App {
    Pending { config: AppConfig },
    Running(Box<Running>),
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let App::Pending { config } = self else {
            return;
        };

        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(window_attrs).unwrap());

        let gpu = GpuContext::new(window.clone(), config.vsync);
        let controller = match PipelineController::new(&gpu, gpu.width(), gpu.height(), config.effect)
        {
            Ok(controller) => controller,
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
                return;
            }
        };
        let library = ShaderLibrary::new(&gpu);
        let scene = SceneRenderer::new(&gpu);
        let hud = Hud::new(&gpu);
        let camera = Camera::new();
        let prev_view_proj = camera.view_proj(gpu.aspect());

        log::info!("starting with effect: {}", config.effect.name());

        *self = App::Running(Box::new(Running {
            window,
            gpu,
            controller,
            library,
            scene,
            hud,
            camera,
            input: Input::new(),
            coverage: 1.0,
            prev_view_proj,
            start_time: Instant::now(),
            last_frame: Instant::now(),
            fps: 0.0,
        }));
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let App::Running(state) = self else {
            return;
        };

        state.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                state.gpu.resize(size.width, size.height);
                state.controller.on_resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = state.frame(event_loop) {
                    log::error!("{}", e);
                    event_loop.exit();
                }
                state.input.end_frame();
                state.window.request_redraw();
            }
            _ => {}
        }
    }
}

impl Running {
    fn frame(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Box<dyn std::error::Error>> {
        let now = Instant::now();
        let time = self.start_time.elapsed().as_secs_f32();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        if dt > 0.0 {
            self.fps = self.fps * 0.95 + (1.0 / dt) * 0.05;
        }

        self.handle_controls(event_loop, dt);
        self.camera.update(dt);
        self.scene.update(&self.gpu, &self.camera, time, dt);

        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                return Ok(());
            }
            Err(e) => return Err(Box::new(e)),
        };
        let screen = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        // Activate the effect's scene target and capture the scene.
        self.controller.begin_frame(&self.gpu)?;
        if let Some(pass) = self.controller.scene_pass() {
            self.scene.render(&mut encoder, pass);
        }

        // Post-processing.
        let uniforms = self.pass_uniforms(time);
        {
            let mut ctx = ExecuteContext {
                gpu: &self.gpu,
                encoder: &mut encoder,
                screen: &screen,
                library: &self.library,
                scene: &self.scene,
                uniforms,
            };
            self.controller.run_effect(&mut ctx);
        }

        // Back to the on-screen target for the overlay.
        self.controller.end_frame();
        self.draw_hud();
        self.hud.render(&self.gpu, &mut encoder, &screen);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        self.prev_view_proj = self.camera.view_proj(self.gpu.aspect());
        Ok(())
    }

    fn handle_controls(&mut self, event_loop: &ActiveEventLoop, dt: f32) {
        if self.input.key_pressed(KeyCode::Escape) {
            event_loop.exit();
        }
        if self.input.key_pressed(KeyCode::ArrowRight) {
            self.controller.set_effect(self.controller.effect().next());
        }
        if self.input.key_pressed(KeyCode::ArrowLeft) {
            self.controller.set_effect(self.controller.effect().prev());
        }
        if self.input.key_down(KeyCode::BracketLeft) {
            self.coverage = (self.coverage - dt * 0.8).max(0.0);
        }
        if self.input.key_down(KeyCode::BracketRight) {
            self.coverage = (self.coverage + dt * 0.8).min(1.0);
        }
        if self.input.mouse_down(MouseButton::Left) {
            let delta = self.input.mouse_delta();
            self.camera.drag(delta.x, delta.y);
        }
        let scroll = self.input.scroll();
        if scroll != 0.0 {
            self.camera.zoom(scroll);
        }
    }

    fn pass_uniforms(&self, time: f32) -> PassUniforms {
        let view_proj = self.camera.view_proj(self.gpu.aspect());
        let lights = self.scene.lights();
        PassUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            prev_view_proj: self.prev_view_proj.to_cols_array_2d(),
            camera_pos: self.camera.position().to_array(),
            time,
            resolution: [self.gpu.width() as f32, self.gpu.height() as f32],
            coverage: self.coverage,
            horizontal: 1.0,
            params: [self.camera.znear, self.camera.zfar, 0.0, 0.0],
            light_dir: lights.dir.to_array(),
            _pad0: 0.0,
            light_color: lights.color.to_array(),
            _pad1: 0.0,
            point_positions: lights.points.map(|(p, _)| [p.x, p.y, p.z, 1.0]),
            point_colors: lights.points.map(|(_, c)| [c.x, c.y, c.z, 1.0]),
        }
    }

    fn draw_hud(&mut self) {
        let effect = self.controller.effect();
        let line = self.hud.line_height();
        self.hud.begin();
        self.hud.text(12.0, 10.0, effect.name(), [1.0, 1.0, 1.0, 1.0]);
        self.hud.text(
            12.0,
            10.0 + line,
            &format!("{:.0} fps", self.fps),
            [0.8, 0.8, 0.8, 1.0],
        );
        self.hud.text(
            12.0,
            10.0 + line * 2.0,
            &format!("coverage {:.2}  [ / ] adjust, arrows switch effect", self.coverage),
            [0.6, 0.6, 0.6, 1.0],
        );
    }
}
