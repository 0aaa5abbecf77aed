use glam::{Vec2, Vec3};

use crate::audio::{AudioOut, KISS_CUE};
use crate::camera::OrbitCamera;
use crate::character::Role;

/// How long a heart stays on screen (seconds).
pub const HEART_LIFETIME: f32 = 1.5;
/// Pixels a heart floats upward over its lifetime.
pub const HEART_RISE: f32 = 40.0;
/// Max heart markers on screen at once.
const MAX_HEARTS: usize = 16;
/// Pointer travel (pixels) under which a press/release counts as a click.
const CLICK_SLOP: f32 = 4.0;

/// Viewport pixels (origin top-left) to normalized device coordinates.
pub fn pointer_to_ndc(pointer: Vec2, viewport: Vec2) -> Vec2 {
    Vec2::new(
        pointer.x / viewport.x.max(1.0) * 2.0 - 1.0,
        -(pointer.y / viewport.y.max(1.0)) * 2.0 + 1.0,
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub dir: Vec3,
}

impl Ray {
    /// Distance along the ray to the first sphere intersection, if any.
    pub fn sphere_hit(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.dir);
        let c = oc.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let sq = disc.sqrt();
        let t = if -b - sq >= 0.0 { -b - sq } else { -b + sq };
        (t >= 0.0).then_some(t)
    }
}

/// A clickable character as seen by the hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTarget {
    pub role: Role,
    pub node: hecs::Entity,
    /// World-space bounding sphere.
    pub center: Vec3,
    pub radius: f32,
}

/// Nearest target the ray hits.
pub fn hit_test<'a>(ray: &Ray, targets: &'a [HitTarget]) -> Option<&'a HitTarget> {
    targets
        .iter()
        .filter_map(|t| ray.sphere_hit(t.center, t.radius).map(|d| (d, t)))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, t)| t)
}

/// Transient heart marker at a fixed screen position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeartEmote {
    /// Viewport pixels where the heart appeared.
    pub anchor: Vec2,
    pub age: f32,
}

impl HeartEmote {
    /// 0 when spawned, 1 when about to disappear.
    pub fn progress(&self) -> f32 {
        (self.age / HEART_LIFETIME).clamp(0.0, 1.0)
    }

    /// Current position, floating up from the anchor.
    pub fn position(&self) -> Vec2 {
        self.anchor - Vec2::new(0.0, HEART_RISE * self.progress())
    }

    pub fn alpha(&self) -> f32 {
        1.0 - self.progress()
    }
}

/// Active heart markers. Each one is removed after [`HEART_LIFETIME`].
pub struct HeartEmotes {
    hearts: Vec<HeartEmote>,
}

impl HeartEmotes {
    pub fn new() -> Self {
        Self {
            hearts: Vec::with_capacity(MAX_HEARTS),
        }
    }

    pub fn spawn(&mut self, anchor: Vec2) {
        if self.hearts.len() >= MAX_HEARTS {
            self.hearts.remove(0);
        }
        self.hearts.push(HeartEmote { anchor, age: 0.0 });
    }

    pub fn update(&mut self, dt: f32) {
        for heart in &mut self.hearts {
            heart.age += dt.max(0.0);
        }
        self.hearts.retain(|h| h.age < HEART_LIFETIME);
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeartEmote> {
        self.hearts.iter()
    }

    pub fn len(&self) -> usize {
        self.hearts.len()
    }
}

/// Separates clicks from orbit drags on the primary button.
pub struct PointerTracker {
    cursor: Vec2,
    pressed_at: Option<Vec2>,
    travel: f32,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self {
            cursor: Vec2::ZERO,
            pressed_at: None,
            travel: 0.0,
        }
    }

    pub fn press(&mut self) {
        self.pressed_at = Some(self.cursor);
        self.travel = 0.0;
    }

    /// Record cursor movement. Returns the drag delta while the button is held.
    pub fn moved(&mut self, pos: Vec2) -> Option<Vec2> {
        let delta = pos - self.cursor;
        self.cursor = pos;
        self.pressed_at?;
        self.travel += delta.length();
        Some(delta)
    }

    /// Release the button. Returns the click position when it wasn't a drag.
    pub fn release(&mut self) -> Option<Vec2> {
        self.pressed_at.take()?;
        (self.travel < CLICK_SLOP).then_some(self.cursor)
    }
}

/// Turn a click into feedback: heart above the frog and the kiss sound.
/// Never touches animation state.
pub fn dispatch_click(
    pointer: Vec2,
    viewport: Vec2,
    camera: &OrbitCamera,
    targets: &[HitTarget],
    hearts: &mut HeartEmotes,
    audio: &mut dyn AudioOut,
) -> Option<Role> {
    let ray = camera.ray_from_ndc(pointer_to_ndc(pointer, viewport));
    let hit = hit_test(&ray, targets)?;
    let anchor = camera.project(hit.center, viewport).unwrap_or(pointer);

    log::info!("{} frog clicked (node {:?})", hit.role.label(), hit.node);
    hearts.spawn(anchor);
    audio.play(&KISS_CUE);
    Some(hit.role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SoundCue;

    #[derive(Default)]
    struct RecordingAudio(Vec<&'static str>);

    impl AudioOut for RecordingAudio {
        fn play(&mut self, cue: &SoundCue) {
            self.0.push(cue.path);
        }
    }

    fn target(role: Role, center: Vec3, radius: f32) -> HitTarget {
        HitTarget {
            role,
            node: hecs::World::new().spawn(()),
            center,
            radius,
        }
    }

    #[test]
    fn ndc_maps_corners() {
        let vp = Vec2::new(800.0, 600.0);
        assert_eq!(pointer_to_ndc(Vec2::ZERO, vp), Vec2::new(-1.0, 1.0));
        assert_eq!(pointer_to_ndc(vp, vp), Vec2::new(1.0, -1.0));
        assert_eq!(pointer_to_ndc(vp / 2.0, vp), Vec2::ZERO);
    }

    #[test]
    fn nearest_sphere_wins() {
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 10.0),
            dir: Vec3::NEG_Z,
        };
        let targets = [
            target(Role::Male, Vec3::ZERO, 0.5),
            target(Role::Female, Vec3::new(0.0, 0.0, 4.0), 0.5),
        ];
        assert_eq!(hit_test(&ray, &targets).unwrap().role, Role::Female);
    }

    #[test]
    fn misses_and_spheres_behind_are_ignored() {
        let ray = Ray {
            origin: Vec3::ZERO,
            dir: Vec3::X,
        };
        let targets = [
            target(Role::Male, Vec3::new(0.0, 2.0, 0.0), 0.5),
            target(Role::Female, Vec3::new(-3.0, 0.0, 0.0), 0.5),
        ];
        assert!(hit_test(&ray, &targets).is_none());
        assert!(hit_test(&ray, &[]).is_none());
    }

    #[test]
    fn hearts_expire_after_lifetime() {
        let mut hearts = HeartEmotes::new();
        hearts.spawn(Vec2::new(10.0, 100.0));
        hearts.update(0.75);
        let h = *hearts.iter().next().unwrap();
        assert!((h.position().y - 80.0).abs() < 1e-4);
        assert!((h.alpha() - 0.5).abs() < 1e-6);
        hearts.update(0.8);
        assert_eq!(hearts.len(), 0);
    }

    #[test]
    fn short_press_is_a_click_long_drag_is_not() {
        let mut p = PointerTracker::new();
        p.moved(Vec2::new(50.0, 50.0));
        p.press();
        assert_eq!(p.moved(Vec2::new(51.0, 51.0)), Some(Vec2::ONE));
        assert_eq!(p.release(), Some(Vec2::new(51.0, 51.0)));

        p.press();
        p.moved(Vec2::new(90.0, 51.0));
        assert_eq!(p.release(), None);
        assert_eq!(p.moved(Vec2::new(91.0, 51.0)), None);
        assert_eq!(p.release(), None);
    }

    #[test]
    fn clicking_a_frog_spawns_heart_and_plays_sound() {
        let camera = OrbitCamera::new(1.0);
        let viewport = Vec2::new(800.0, 800.0);
        let frog = camera.target;
        let targets = [target(Role::Male, frog, 0.3)];
        let mut hearts = HeartEmotes::new();
        let mut audio = RecordingAudio::default();

        let hit = dispatch_click(viewport / 2.0, viewport, &camera, &targets, &mut hearts, &mut audio);
        assert_eq!(hit, Some(Role::Male));
        assert_eq!(hearts.len(), 1);
        assert!((hearts.iter().next().unwrap().anchor - viewport / 2.0).length() < 0.1);
        assert_eq!(audio.0, vec![KISS_CUE.path]);

        let miss = dispatch_click(Vec2::ZERO, viewport, &camera, &targets, &mut hearts, &mut audio);
        assert_eq!(miss, None);
        assert_eq!(hearts.len(), 1);
        assert_eq!(audio.0.len(), 1);
    }
}
