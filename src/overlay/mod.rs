pub mod stats;
pub mod timer;

use winit::window::Window;

use self::stats::FrameStats;
use self::timer::{SystemPhase, SystemTimers, PHASE_COUNT};
use crate::environment::Environment;
use crate::interaction::HeartEmotes;
use crate::render::GpuState;
use crate::scene::{AssetStatus, SceneState};

const HEART_GLYPH: &str = "❤";
const HEART_SIZE: f32 = 28.0;

/// What the user asked for through the panel this frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PanelActions {
    pub toggle_day_night: bool,
}

/// Read-only view of the scene for one UI frame.
pub struct PanelSnapshot {
    pub environment: Environment,
    pub asset_status: AssetStatus,
    /// (frog label, animation state label)
    pub characters: Vec<(&'static str, &'static str)>,
    pub smoke_count: usize,
    pub fireflies_visible: bool,
}

impl PanelSnapshot {
    pub fn of(scene: &SceneState) -> Self {
        Self {
            environment: scene.environment(),
            asset_status: scene.asset_status.clone(),
            characters: scene
                .characters
                .characters()
                .map(|c| (c.role.label(), c.state.label()))
                .collect(),
            smoke_count: scene.smoke.len(),
            fireflies_visible: scene.fireflies.is_visible(),
        }
    }
}

/// egui overlay: the day/night button, heart markers and an F12 stats panel.
pub struct ControlPanel {
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,

    pub stats_visible: bool,
    f12_was_down: bool,

    pub frame_stats: FrameStats,
    pub system_timers: SystemTimers,
}

impl ControlPanel {
    pub fn new(window: &Window, gpu: &GpuState) -> Self {
        let egui_ctx = egui::Context::default();

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(gpu.device.limits().max_texture_dimension_2d as usize),
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.surface_config.format,
            egui_wgpu::RendererOptions {
                depth_stencil_format: None,
                msaa_samples: 1,
                dithering: true,
                predictable_texture_filtering: false,
            },
        );

        Self {
            egui_ctx,
            egui_state,
            egui_renderer,
            stats_visible: false,
            f12_was_down: false,
            frame_stats: FrameStats::new(),
            system_timers: SystemTimers::new(),
        }
    }

    /// Handle the F12 key. Returns true if the stats panel flipped.
    pub fn poll_toggle(&mut self, f12_down: bool) -> bool {
        let pressed = f12_down && !self.f12_was_down;
        self.f12_was_down = f12_down;
        if pressed {
            self.stats_visible = !self.stats_visible;
        }
        pressed
    }

    /// Forward a winit event to egui. Returns true if egui consumed it.
    pub fn on_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.egui_state.on_window_event(window, event).consumed
    }

    /// True while the pointer is over any panel or button.
    pub fn wants_pointer(&self) -> bool {
        self.egui_ctx.is_pointer_over_area()
    }

    /// Run the egui frame and produce paint output.
    pub fn run_frame(
        &mut self,
        window: &Window,
        screen_w: u32,
        screen_h: u32,
        snapshot: &PanelSnapshot,
        hearts: &HeartEmotes,
    ) -> (
        Vec<egui::epaint::ClippedPrimitive>,
        egui::TexturesDelta,
        egui_wgpu::ScreenDescriptor,
        PanelActions,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);
        let stats = StatsView {
            visible: self.stats_visible,
            fps: self.frame_stats.fps,
            avg: self.frame_stats.avg,
            min: self.frame_stats.min,
            max: self.frame_stats.max,
            history: self.frame_stats.history().collect(),
            durations: self.system_timers.durations_us,
            total_us: self.system_timers.total_us(),
        };

        let mut actions = PanelActions::default();
        let ctx = self.egui_ctx.clone();
        let full_output = ctx.run(raw_input, |ctx| {
            draw_toggle(ctx, snapshot, &mut actions);
            draw_hearts(ctx, hearts);
            draw_stats(ctx, &stats, snapshot);
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let pixels_per_point = full_output.pixels_per_point;
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes, pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [screen_w, screen_h],
            pixels_per_point,
        };

        (
            clipped_primitives,
            full_output.textures_delta,
            screen_descriptor,
            actions,
        )
    }

    /// Upload egui textures and buffers. Call before the egui render pass.
    pub fn prepare_egui(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::epaint::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) -> Vec<wgpu::CommandBuffer> {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor)
    }

    pub fn render_egui(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::epaint::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures after present.
    pub fn free_textures(&mut self, textures_delta: &egui::TexturesDelta) {
        for &id in &textures_delta.free {
            self.egui_renderer.free_texture(&id);
        }
    }
}

struct StatsView {
    visible: bool,
    fps: f64,
    avg: f64,
    min: f64,
    max: f64,
    history: Vec<f64>,
    durations: [f64; PHASE_COUNT],
    total_us: f64,
}

/// Day/night button pinned to the top-right corner. Always on screen.
fn draw_toggle(ctx: &egui::Context, snapshot: &PanelSnapshot, actions: &mut PanelActions) {
    egui::Area::new(egui::Id::new("day_night_toggle"))
        .anchor(egui::Align2::RIGHT_TOP, [-16.0, 16.0])
        .show(ctx, |ui| {
            let label = egui::RichText::new(snapshot.environment.button_label()).size(18.0);
            if ui.add(egui::Button::new(label).corner_radius(8.0)).clicked() {
                actions.toggle_day_night = true;
            }
            match &snapshot.asset_status {
                AssetStatus::Loading => {
                    ui.label("Loading scene…");
                }
                AssetStatus::Failed(reason) => {
                    ui.colored_label(egui::Color32::from_rgb(255, 120, 100), "Scene failed to load")
                        .on_hover_text(reason);
                }
                AssetStatus::Loaded { .. } => {}
            }
        });
}

/// Hearts float up from where the frog was clicked and fade out.
fn draw_hearts(ctx: &egui::Context, hearts: &HeartEmotes) {
    let ppp = ctx.pixels_per_point();
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("hearts"),
    ));
    for heart in hearts.iter() {
        let p = heart.position() / ppp;
        let alpha = (heart.alpha() * 255.0).round() as u8;
        painter.text(
            egui::pos2(p.x, p.y),
            egui::Align2::CENTER_BOTTOM,
            HEART_GLYPH,
            egui::FontId::proportional(HEART_SIZE),
            egui::Color32::from_rgba_unmultiplied(235, 64, 110, alpha),
        );
    }
}

fn draw_stats(ctx: &egui::Context, s: &StatsView, snapshot: &PanelSnapshot) {
    if !s.visible {
        return;
    }

    let panel_frame = egui::Frame::NONE
        .fill(egui::Color32::from_rgba_unmultiplied(20, 20, 20, 220))
        .corner_radius(6.0)
        .inner_margin(10.0);

    egui::Window::new("Stats")
        .default_pos([10.0, 10.0])
        .default_width(300.0)
        .resizable(false)
        .frame(panel_frame)
        .show(ctx, |ui| {
            ui.style_mut().visuals.override_text_color = Some(egui::Color32::from_gray(220));

            ui.heading("Performance");
            ui.label(format!("FPS: {:.1}", s.fps));
            ui.label(format!(
                "Frame: {:.2}ms avg | {:.2} min | {:.2} max",
                s.avg * 1000.0,
                s.min * 1000.0,
                s.max * 1000.0,
            ));
            frame_graph(ui, &s.history);
            ui.add_space(4.0);

            ui.heading("Phases");
            for phase in SystemPhase::ALL {
                ui.label(
                    egui::RichText::new(format!(
                        "{:<12}{:>6.0}us",
                        phase.label(),
                        s.durations[phase as usize]
                    ))
                    .monospace(),
                );
            }
            ui.label(
                egui::RichText::new(format!("{:<12}{:>6.0}us", "Total", s.total_us)).monospace(),
            );
            ui.add_space(4.0);

            ui.heading("Scene");
            ui.label(format!("Environment: {:?}", snapshot.environment));
            if let AssetStatus::Loaded { nodes, characters } = snapshot.asset_status {
                ui.label(format!("Mesh nodes: {nodes} | Frogs bound: {characters}"));
            }
            ui.label(format!(
                "Smoke puffs: {} | Fireflies: {}",
                snapshot.smoke_count,
                if snapshot.fireflies_visible { "on" } else { "off" }
            ));
            if snapshot.characters.is_empty() {
                ui.label("No frogs bound");
            }
            for (frog, state) in &snapshot.characters {
                ui.label(format!("{frog}: {state}"));
            }
            ui.add_space(4.0);
            ui.label("Drag: orbit | Wheel: zoom | Click frog: kiss | F12: stats");
        });
}

fn frame_graph(ui: &mut egui::Ui, history: &[f64]) {
    if history.is_empty() {
        return;
    }
    let max_time = history.iter().copied().fold(0.0f64, f64::max).max(0.020);
    let (response, painter) = ui.allocate_painter(egui::vec2(280.0, 48.0), egui::Sense::hover());
    let rect = response.rect;
    let bar_width = rect.width() / history.len() as f32;

    for (i, &t) in history.iter().enumerate() {
        let h = (t / max_time) as f32 * rect.height();
        let x = rect.left() + i as f32 * bar_width;
        let color = if t > 1.0 / 60.0 {
            egui::Color32::from_rgb(255, 100, 80)
        } else {
            egui::Color32::from_rgb(80, 200, 120)
        };
        painter.rect_filled(
            egui::Rect::from_min_max(
                egui::pos2(x, rect.bottom() - h),
                egui::pos2(x + bar_width, rect.bottom()),
            ),
            0.0,
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::scene::asset::tests::cottage_graph;

    #[test]
    fn snapshot_lists_frogs_and_environment() {
        let mut scene = SceneState::new(&SceneConfig::default(), &mut fastrand::Rng::with_seed(5));
        let before = PanelSnapshot::of(&scene);
        assert_eq!(before.environment.button_label(), "🌙 Night");
        assert_eq!(before.asset_status, AssetStatus::Loading);
        assert!(before.characters.is_empty());

        scene.on_asset_loaded(Ok(cottage_graph()), 0.0);
        scene.toggle_day_night(0.1);
        let after = PanelSnapshot::of(&scene);
        assert_eq!(after.environment.button_label(), "☀️ Day");
        assert!(after.fireflies_visible);
        assert_eq!(after.characters.len(), 2);
        assert!(after.characters.iter().all(|(_, state)| *state == "Hop"));
    }
}
