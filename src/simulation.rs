//! Simulation builder and runner.

use std::sync::Arc;

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::animation::{bake, AnimationClip, BakedAnimation, SkinnedMesh, Skeleton};
use crate::error::SimulationError;
use crate::flock::{spawn_flock, Boid};
use crate::gpu::GpuState;
use crate::params::FlockParams;
use crate::time::Time;

/// A flock simulation builder.
///
/// Use method chaining to configure, then call `.run()` to start. Setup
/// errors (bad configuration, no adapter, stride mismatch) are returned
/// before the frame loop begins; once the window is up, closing it ends
/// the run cleanly.
pub struct Simulation {
    boid_count: u32,
    predator_count: u32,
    spawn_center: Vec3,
    spawn_radius: f32,
    mesh: SkinnedMesh,
    skeleton: Skeleton,
    clip: AnimationClip,
    params: FlockParams,
    frame_interpolation: bool,
    update: Option<Box<dyn FnMut(&mut FrameContext)>>,
}

impl Simulation {
    /// Create a simulation of `mesh` animated by `clip` over `skeleton`.
    pub fn new(mesh: SkinnedMesh, skeleton: Skeleton, clip: AnimationClip) -> Self {
        Self {
            boid_count: 4096,
            predator_count: 0,
            spawn_center: Vec3::ZERO,
            spawn_radius: 20.0,
            mesh,
            skeleton,
            clip,
            params: FlockParams::default(),
            frame_interpolation: true,
            update: None,
        }
    }

    /// Set the total number of boids (predators included).
    pub fn with_boid_count(mut self, count: u32) -> Self {
        self.boid_count = count;
        self
    }

    /// Set how many of the boids are predators. Must not exceed the total
    /// count; that is rejected when `run` spawns the flock.
    pub fn with_predator_count(mut self, count: u32) -> Self {
        self.predator_count = count;
        self
    }

    /// Set the spawn sphere.
    pub fn with_spawn(mut self, center: Vec3, radius: f32) -> Self {
        self.spawn_center = center;
        self.spawn_radius = radius;
        self
    }

    /// Set the behavior parameters pushed to the kernel every frame.
    pub fn with_params(mut self, params: FlockParams) -> Self {
        self.params = params;
        self
    }

    /// Enable or disable blending between baked animation frames.
    pub fn with_frame_interpolation(mut self, enabled: bool) -> Self {
        self.frame_interpolation = enabled;
        self
    }

    /// Set a per-frame callback, called before the update kernel runs.
    /// The callback can retune parameters, move the target, or toggle
    /// frame interpolation.
    pub fn with_update<F>(mut self, update: F) -> Self
    where
        F: FnMut(&mut FrameContext) + 'static,
    {
        self.update = Some(Box::new(update));
        self
    }

    /// Run the simulation. Blocks until the window is closed.
    pub fn run(self) -> Result<(), SimulationError> {
        let mut rng = SmallRng::from_entropy();
        let boids = spawn_flock(
            self.boid_count,
            self.predator_count,
            self.spawn_center,
            self.spawn_radius,
            &mut rng,
        )?;

        // Bake once, before the loop; the table is immutable afterwards.
        let baked = bake(&self.mesh, &self.skeleton, &self.clip);

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App {
            window: None,
            gpu_state: None,
            boids,
            mesh: self.mesh,
            baked,
            params: self.params,
            frame_interpolation: self.frame_interpolation,
            update: self.update,
            time: Time::new(),
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        };
        event_loop.run_app(&mut app)?;

        match app.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Context passed to the per-frame update callback.
pub struct FrameContext<'a> {
    /// Behavior parameters for this frame, including the flock target.
    pub params: &'a mut FlockParams,
    time: f32,
    delta: f32,
    frame_interpolation: &'a mut bool,
}

impl FrameContext<'_> {
    /// Seconds since the simulation started.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Seconds since the previous frame.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn frame_interpolation(&self) -> bool {
        *self.frame_interpolation
    }

    /// Request frame interpolation on or off. Applied lazily: the bound
    /// state only changes when this differs from it.
    pub fn set_frame_interpolation(&mut self, enabled: bool) {
        *self.frame_interpolation = enabled;
    }
}

struct App {
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    boids: Vec<Boid>,
    mesh: SkinnedMesh,
    baked: BakedAnimation,
    params: FlockParams,
    frame_interpolation: bool,
    update: Option<Box<dyn FnMut(&mut FrameContext)>>,
    time: Time,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    error: Option<SimulationError>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window_attrs = Window::default_attributes()
                .with_title("flockgpu")
                .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

            let window = match event_loop.create_window(window_attrs) {
                Ok(w) => Arc::new(w),
                Err(e) => {
                    self.error = Some(e.into());
                    event_loop.exit();
                    return;
                }
            };
            self.window = Some(window.clone());

            match pollster::block_on(GpuState::new(
                window,
                &self.boids,
                &self.mesh,
                &self.baked,
                self.frame_interpolation,
            )) {
                Ok(state) => self.gpu_state = Some(state),
                Err(e) => {
                    self.error = Some(e);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = position.x - last_x;
                        let dy = position.y - last_y;

                        if let Some(gpu_state) = &mut self.gpu_state {
                            gpu_state.camera.yaw -= dx as f32 * 0.005;
                            gpu_state.camera.pitch += dy as f32 * 0.005;
                            gpu_state.camera.pitch = gpu_state.camera.pitch.clamp(-1.5, 1.5);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.camera.distance -= scroll * 3.0;
                    gpu_state.camera.distance = gpu_state.camera.distance.clamp(5.0, 500.0);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    let (time, delta) = self.time.update();

                    if let Some(update) = &mut self.update {
                        let mut ctx = FrameContext {
                            params: &mut self.params,
                            time,
                            delta,
                            frame_interpolation: &mut self.frame_interpolation,
                        };
                        update(&mut ctx);
                    }
                    gpu_state.set_frame_interpolation(self.frame_interpolation);

                    match gpu_state.step_frame(delta, &self.params) {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost) => {
                            gpu_state.resize(winit::dpi::PhysicalSize {
                                width: gpu_state.config.width,
                                height: gpu_state.config.height,
                            })
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                        Err(e) => eprintln!("Frame error: {:?}", e),
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
