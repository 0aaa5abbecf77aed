//! Day/night environment: lighting presets and the toggle that drives the
//! frogs and fireflies.

use glam::Vec3;

use crate::character::CharacterMotionController;
use crate::fireflies::FireflySimulator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Day,
    Night,
}

impl Environment {
    pub fn toggled(self) -> Self {
        match self {
            Environment::Day => Environment::Night,
            Environment::Night => Environment::Day,
        }
    }

    pub fn is_night(self) -> bool {
        self == Environment::Night
    }

    /// Toggle button caption: names the mode a click switches to.
    pub fn button_label(self) -> &'static str {
        match self {
            Environment::Day => "🌙 Night",
            Environment::Night => "☀️ Day",
        }
    }
}

/// A directional light. Hidden lights keep their parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Where the light sits; it shines toward the origin.
    pub position: Vec3,
    pub color: [f32; 3],
    pub intensity: f32,
    pub visible: bool,
}

impl DirectionalLight {
    /// Unit vector pointing from the surface toward the light.
    pub fn to_light(&self) -> Vec3 {
        self.position.normalize_or_zero()
    }
}

/// Everything the renderer needs to know about the current environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    /// Clear color and fog color.
    pub sky: [f32; 3],
    pub fog_near: f32,
    pub fog_far: f32,
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    pub sun: DirectionalLight,
    pub moon: DirectionalLight,
    /// Fill light from below.
    pub bottom: DirectionalLight,
    /// Visual moon disc in the sky.
    pub moon_disc_visible: bool,
    pub fireflies_visible: bool,
}

/// Sky-blue day fog.
const DAY_SKY: u32 = 0x87CEEB;
/// Deep-navy night fog.
const NIGHT_SKY: u32 = 0x0A1628;
const NIGHT_AMBIENT: u32 = 0x4A5F8F;
const MOONLIGHT: u32 = 0x9DB4FF;

/// Moon disc placement (low, near the horizon) and radius.
pub const MOON_DISC_POSITION: Vec3 = Vec3::new(-12.0, 8.0, -8.0);
pub const MOON_DISC_RADIUS: f32 = 2.0;

/// Split 0xRRGGBB into [0, 1] channels.
pub fn hex_rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    ]
}

impl Lighting {
    pub fn day() -> Self {
        Self {
            sky: hex_rgb(DAY_SKY),
            fog_near: 50.0,
            fog_far: 200.0,
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.8,
            sun: DirectionalLight {
                position: Vec3::new(10.0, 15.0, 5.0),
                color: [1.0, 1.0, 1.0],
                intensity: 1.2,
                visible: true,
            },
            moon: DirectionalLight {
                position: Vec3::new(-10.0, 15.0, -5.0),
                color: hex_rgb(MOONLIGHT),
                intensity: 0.6,
                visible: false,
            },
            bottom: DirectionalLight {
                position: Vec3::new(0.0, -10.0, 0.0),
                color: [1.0, 1.0, 1.0],
                intensity: 0.5,
                visible: true,
            },
            moon_disc_visible: false,
            fireflies_visible: false,
        }
    }

    pub fn night() -> Self {
        let day = Self::day();
        Self {
            sky: hex_rgb(NIGHT_SKY),
            ambient_color: hex_rgb(NIGHT_AMBIENT),
            ambient_intensity: 0.4,
            sun: DirectionalLight {
                visible: false,
                ..day.sun
            },
            moon: DirectionalLight {
                visible: true,
                ..day.moon
            },
            bottom: DirectionalLight {
                intensity: 0.1,
                ..day.bottom
            },
            moon_disc_visible: true,
            fireflies_visible: true,
            ..day
        }
    }

    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Day => Self::day(),
            Environment::Night => Self::night(),
        }
    }
}

/// Sole owner of the environment mode and its lighting.
pub struct DayNightController {
    environment: Environment,
    lighting: Lighting,
}

impl DayNightController {
    /// Every run starts in daylight.
    pub fn new() -> Self {
        Self {
            environment: Environment::Day,
            lighting: Lighting::day(),
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    /// Flip day/night, apply the new lighting and kick off the frogs.
    /// Returns the new environment.
    pub fn toggle(
        &mut self,
        now: f32,
        characters: &mut CharacterMotionController,
        fireflies: &mut FireflySimulator,
    ) -> Environment {
        self.environment = self.environment.toggled();
        self.lighting = Lighting::for_environment(self.environment);
        fireflies.set_visible(self.lighting.fireflies_visible);

        match self.environment {
            Environment::Night => characters.request_night_entrance(now),
            Environment::Day => characters.request_day_exit(),
        }

        log::info!(
            "Environment is now {:?} ({} characters bound)",
            self.environment,
            characters.bound_count()
        );
        self.environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::animation::AnimationState;
    use crate::character::Role;
    use crate::config::{FireflyConfig, MotionPolicy};

    fn setup() -> (DayNightController, CharacterMotionController, FireflySimulator) {
        let mut characters = CharacterMotionController::new(MotionPolicy::default());
        let node = hecs::World::new().spawn(());
        let rest = Vec3::new(1.5, 0.0, -1.0);
        characters
            .bind_character(Role::Male, node, rest, Vec3::Z, Some(rest))
            .unwrap();
        let fireflies = FireflySimulator::new(FireflyConfig::default(), &mut fastrand::Rng::with_seed(7));
        (DayNightController::new(), characters, fireflies)
    }

    #[test]
    fn hex_colors_split_into_channels() {
        assert_eq!(hex_rgb(0xFF0080), [1.0, 0.0, 128.0 / 255.0]);
    }

    #[test]
    fn starts_in_daylight() {
        let dn = DayNightController::new();
        assert_eq!(dn.environment(), Environment::Day);
        assert_eq!(dn.lighting(), &Lighting::day());
        assert_eq!(dn.environment().button_label(), "🌙 Night");
    }

    #[test]
    fn night_preset_swaps_sun_for_moon() {
        let night = Lighting::night();
        assert!(!night.sun.visible);
        assert!(night.moon.visible);
        assert!(night.moon_disc_visible);
        assert!(night.fireflies_visible);
        assert_eq!(night.bottom.intensity, 0.1);
        assert_eq!(night.fog_far, 200.0);
    }

    #[test]
    fn toggle_to_night_starts_hop_and_shows_fireflies() {
        let (mut dn, mut characters, mut fireflies) = setup();
        let env = dn.toggle(4.0, &mut characters, &mut fireflies);

        assert_eq!(env, Environment::Night);
        assert_eq!(dn.lighting().sky, hex_rgb(NIGHT_SKY));
        assert!(fireflies.is_visible());
        assert!(matches!(
            characters.get(Role::Male).unwrap().state,
            AnimationState::Hop { start_time, .. } if start_time == 4.0
        ));
        assert_eq!(env.button_label(), "☀️ Day");
    }

    #[test]
    fn toggling_back_mid_walk_slides_home() {
        let (mut dn, mut characters, mut fireflies) = setup();
        dn.toggle(0.0, &mut characters, &mut fireflies);
        characters.advance(0.6, 0.02);
        characters.advance(0.8, 0.02);
        assert!(matches!(
            characters.get(Role::Male).unwrap().state,
            AnimationState::WalkIn { .. }
        ));

        let env = dn.toggle(0.9, &mut characters, &mut fireflies);
        assert_eq!(env, Environment::Day);
        assert!(!fireflies.is_visible());
        assert!(matches!(
            characters.get(Role::Male).unwrap().state,
            AnimationState::SlideOut { target, .. } if target == Vec3::new(1.5, 0.0, -1.0)
        ));
    }
}
