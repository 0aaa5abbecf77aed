//! Scene tunables. Every animation constant lives here so presets can be
//! swapped without touching the simulation code.

use glam::Vec3;

/// Default location of the diorama asset, relative to the working directory.
pub const DEFAULT_ASSET_PATH: &str = "assets/models/frog_cottage.glb";
/// Environment variable that overrides the asset path.
pub const ASSET_PATH_ENV: &str = "FROG_COTTAGE_ASSET";

/// Timing and speed policy for the character homing animations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPolicy {
    /// Length of the hop that starts every night entrance (seconds).
    pub hop_duration: f32,
    /// Peak height of the hop above the baseline.
    pub hop_height: f32,
    /// Walk speed after a toggle to night (units/second).
    pub night_walk_speed: f32,
    /// Walk length after a toggle to night (seconds).
    pub night_walk_duration: f32,
    /// Walk speed when the asset finishes loading while it is already night.
    pub late_bind_walk_speed: f32,
    /// Walk length when the asset finishes loading while it is already night.
    pub late_bind_walk_duration: f32,
    /// Slide speed back to the rest position on day (units/second).
    pub slide_speed: f32,
    /// Distance under which a slide snaps to its target.
    pub snap_distance: f32,
    /// Lower bound applied to the frame delta for all horizontal motion.
    pub min_delta: f32,
    /// Point the characters walk toward at night (the cottage).
    pub home: Vec3,
}

impl Default for MotionPolicy {
    fn default() -> Self {
        Self {
            hop_duration: 0.6,
            hop_height: 0.15,
            night_walk_speed: 0.4,
            night_walk_duration: 1.8,
            late_bind_walk_speed: 0.8,
            late_bind_walk_duration: 2.0,
            slide_speed: 0.5,
            snap_distance: 0.02,
            min_delta: 0.016,
            home: Vec3::ZERO,
        }
    }
}

/// Chimney smoke pool parameters. Velocities are per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmokeConfig {
    pub count: usize,
    /// Chimney mouth.
    pub emitter: Vec3,
    /// Puffs higher than `emitter.y + ceiling` are recycled.
    pub ceiling: f32,
    /// Per-tick multiplier on horizontal velocity.
    pub lateral_damping: f32,
    /// Horizontal spawn spread around the emitter (full width).
    pub spawn_jitter: f32,
    /// Maximum vertical spawn offset above the emitter.
    pub spawn_lift: f32,
    /// Horizontal spawn velocity spread (full width).
    pub drift: f32,
    pub rise_min: f32,
    pub rise_range: f32,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            count: 80,
            emitter: Vec3::new(0.1, 0.7, -0.1),
            ceiling: 2.0,
            lateral_damping: 0.995,
            spawn_jitter: 0.12,
            spawn_lift: 0.15,
            drift: 0.002,
            rise_min: 0.008,
            rise_range: 0.006,
        }
    }
}

/// Firefly swarm parameters. Speeds are per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireflyConfig {
    pub count: usize,
    /// Width of the square the swarm spawns in, centered on the origin.
    pub spread: f32,
    pub min_height: f32,
    pub height_range: f32,
    /// Full width of the per-axis drift speed distribution.
    pub max_speed: f32,
    /// Half-width of the wander box around each firefly's origin.
    pub wander_range: f32,
    /// Vertical bob amplitude per tick.
    pub bob: f32,
    pub base_intensity: f32,
    pub flicker: f32,
}

impl Default for FireflyConfig {
    fn default() -> Self {
        Self {
            count: 15,
            spread: 6.0,
            min_height: 0.2,
            height_range: 1.5,
            max_speed: 0.02,
            wander_range: 3.0,
            bob: 0.005,
            base_intensity: 1.5,
            flicker: 0.5,
        }
    }
}

/// Everything the scene needs at startup.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub motion: MotionPolicy,
    pub smoke: SmokeConfig,
    pub fireflies: FireflyConfig,
    pub asset_path: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            motion: MotionPolicy::default(),
            smoke: SmokeConfig::default(),
            fireflies: FireflyConfig::default(),
            asset_path: DEFAULT_ASSET_PATH.to_string(),
        }
    }
}

impl SceneConfig {
    /// Defaults with the asset path taken from the environment when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(ASSET_PATH_ENV) {
            if !path.trim().is_empty() {
                log::info!("Asset path overridden by {ASSET_PATH_ENV}: {path}");
                config.asset_path = path;
            }
        }
        config
    }
}
