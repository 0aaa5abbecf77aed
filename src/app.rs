use std::sync::Arc;

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::audio::{open_output, AudioOut};
use crate::camera::OrbitCamera;
use crate::clock::FrameClock;
use crate::config::SceneConfig;
use crate::interaction::{dispatch_click, HeartEmotes, PointerTracker};
use crate::overlay::timer::SystemPhase;
use crate::overlay::{ControlPanel, PanelSnapshot};
use crate::render::instance::{build_mesh_instances, build_sprites, FrameUniform};
use crate::render::GpuState;
use crate::scene::asset::{spawn_loader, AssetError, SceneGraph};
use crate::scene::SceneState;

/// Wheel pixels that count as one notch on touchpads.
const PIXELS_PER_NOTCH: f32 = 50.0;

/// Events delivered to the frame loop from other threads.
#[derive(Debug)]
pub enum SceneEvent {
    AssetLoaded(Result<SceneGraph, AssetError>),
}

struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    panel: Option<ControlPanel>,

    scene: SceneState,
    camera: OrbitCamera,
    clock: FrameClock,
    /// Seconds since start as of the last frame.
    elapsed: f32,

    pointer: PointerTracker,
    hearts: HeartEmotes,
    audio: Box<dyn AudioOut>,

    screen_w: u32,
    screen_h: u32,
}

impl App {
    fn new(config: &SceneConfig) -> Self {
        let mut rng = fastrand::Rng::new();
        Self {
            window: None,
            gpu: None,
            panel: None,
            scene: SceneState::new(config, &mut rng),
            camera: OrbitCamera::new(16.0 / 10.0),
            clock: FrameClock::new(),
            elapsed: 0.0,
            pointer: PointerTracker::new(),
            hearts: HeartEmotes::new(),
            audio: open_output(),
            screen_w: 0,
            screen_h: 0,
        }
    }

    fn viewport(&self) -> Vec2 {
        Vec2::new(self.screen_w as f32, self.screen_h as f32)
    }

    fn on_click(&mut self, pointer: Vec2) {
        let targets = self.scene.character_targets();
        dispatch_click(
            pointer,
            self.viewport(),
            &self.camera,
            &targets,
            &mut self.hearts,
            self.audio.as_mut(),
        );
    }

    /// One frame: simulate, build instances, draw scene and overlay.
    fn frame(&mut self) {
        let (Some(window), Some(gpu), Some(panel)) =
            (self.window.as_ref(), self.gpu.as_mut(), self.panel.as_mut())
        else {
            return;
        };

        let (now, delta) = self.clock.tick();
        self.elapsed = now;
        if delta > 0.0 {
            panel.frame_stats.record(delta as f64);
        }

        self.scene.tick(now, delta, &mut panel.system_timers);
        self.camera.update();
        self.hearts.update(delta);

        panel.system_timers.begin();
        let lighting = *self.scene.day_night.lighting();
        let uniform = FrameUniform::new(&self.camera, &lighting);
        let meshes = build_mesh_instances(&self.scene);
        let sprites = build_sprites(&self.scene, &lighting);
        panel.system_timers.end(SystemPhase::BuildInstances);

        panel.system_timers.begin();
        gpu.sync_meshes(&self.scene.meshes, self.scene.mesh_generation);
        gpu.update_frame(&uniform, &meshes, &sprites);

        let Some(mut frame) = gpu.begin_frame() else {
            return;
        };
        gpu.draw_scene(&mut frame.encoder, &frame.view);

        let snapshot = PanelSnapshot::of(&self.scene);
        let (primitives, textures_delta, screen_descriptor, actions) = panel.run_frame(
            window,
            self.screen_w,
            self.screen_h,
            &snapshot,
            &self.hearts,
        );
        let egui_cmds = panel.prepare_egui(
            &gpu.device,
            &gpu.queue,
            &mut frame.encoder,
            &primitives,
            &textures_delta,
            &screen_descriptor,
        );
        {
            let mut pass = GpuState::begin_egui_pass(&mut frame.encoder, &frame.view);
            panel.render_egui(&mut pass, &primitives, &screen_descriptor);
        }
        gpu.finish_frame(frame.encoder, frame.output, egui_cmds);
        panel.free_textures(&textures_delta);
        panel.system_timers.end(SystemPhase::Render);

        if actions.toggle_day_night {
            self.scene.toggle_day_night(now);
        }
    }
}

impl ApplicationHandler<SceneEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title("Frog Cottage")
            .with_inner_size(LogicalSize::new(1280.0, 800.0));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.screen_w = size.width;
        self.screen_h = size.height;
        self.camera.set_aspect(size.width, size.height);
        log::info!("Window created: {}x{}", size.width, size.height);

        let gpu = match GpuState::new(window.clone()) {
            Ok(gpu) => gpu,
            Err(e) => {
                log::error!("GPU init failed: {e}");
                event_loop.exit();
                return;
            }
        };
        self.panel = Some(ControlPanel::new(&window, &gpu));
        self.gpu = Some(gpu);
        log::info!("wgpu + scene pipelines initialized");

        event_loop.set_control_flow(ControlFlow::Poll);
        self.window = Some(window);
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: SceneEvent) {
        match event {
            SceneEvent::AssetLoaded(result) => self.scene.on_asset_loaded(result, self.elapsed),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let consumed = match (&self.window, &mut self.panel) {
            (Some(window), Some(panel)) => panel.on_window_event(window, &event),
            _ => false,
        };
        let over_panel = self.panel.as_ref().is_some_and(|p| p.wants_pointer());

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                }
                self.screen_w = new_size.width;
                self.screen_h = new_size.height;
                self.camera.set_aspect(new_size.width, new_size.height);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => match code {
                KeyCode::F12 => {
                    if let Some(panel) = &mut self.panel {
                        panel.poll_toggle(state == ElementState::Pressed);
                    }
                }
                KeyCode::Escape if state == ElementState::Pressed => {
                    log::info!("ESC pressed, exiting");
                    event_loop.exit();
                }
                _ => {}
            },
            WindowEvent::CursorMoved { position, .. } => {
                let pos = Vec2::new(position.x as f32, position.y as f32);
                if let Some(drag) = self.pointer.moved(pos) {
                    self.camera.orbit(drag, self.screen_h as f32);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed if !consumed && !over_panel => self.pointer.press(),
                ElementState::Released => {
                    if let Some(click) = self.pointer.release() {
                        self.on_click(click);
                    }
                }
                _ => {}
            },
            WindowEvent::MouseWheel { delta, .. } if !consumed => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_NOTCH,
                };
                self.camera.zoom(notches);
            }
            WindowEvent::RedrawRequested => self.frame(),
            _ => {}
        }
    }
}

/// Entry point: start the asset load, then run the event loop.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = SceneConfig::from_env();
    let event_loop = EventLoop::<SceneEvent>::with_user_event().build()?;

    let proxy = event_loop.create_proxy();
    spawn_loader(config.asset_path.clone().into(), move |result| {
        if proxy.send_event(SceneEvent::AssetLoaded(result)).is_err() {
            log::debug!("Event loop closed before the scene finished loading");
        }
    })?;

    let mut app = App::new(&config);
    event_loop.run_app(&mut app)?;
    Ok(())
}
