pub mod animation;

use glam::Vec3;
use thiserror::Error;

use crate::config::MotionPolicy;
use self::animation::{hop_offset, hop_progress, horizontal_dir, AnimationState, WalkPlan};

/// Which of the two frogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Male,
    Female,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Male, Role::Female];

    /// Node name the role is bound from in the scene asset.
    pub fn node_name(self) -> &'static str {
        match self {
            Role::Male => "ranito",
            Role::Female => "ranita",
        }
    }

    /// Case-insensitive node name match.
    pub fn from_node_name(name: &str) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| name.eq_ignore_ascii_case(role.node_name()))
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Male => "Male",
            Role::Female => "Female",
        }
    }

    fn slot(self) -> usize {
        match self {
            Role::Male => 0,
            Role::Female => 1,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindError {
    #[error("{} character is already bound", .0.label())]
    AlreadyBound(Role),
}

/// Which entrance policy to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entrance {
    /// Toggled to night: walk toward home.
    Toggle,
    /// Bound while already night: walk away from the facing direction.
    LateBind,
}

/// An animated frog bound from the scene asset.
#[derive(Debug, Clone)]
pub struct Character {
    pub role: Role,
    /// Scene node rendering this character.
    pub node: hecs::Entity,
    pub position: Vec3,
    /// Resting height; hops are measured from here.
    pub baseline: f32,
    /// Position captured at bind time; the day-mode homing target.
    pub rest: Option<Vec3>,
    /// World-space +Z axis of the node at bind time.
    pub facing: Vec3,
    pub state: AnimationState,
}

/// Owns the frogs and is the only writer of their position and state.
pub struct CharacterMotionController {
    policy: MotionPolicy,
    slots: [Option<Character>; 2],
}

impl CharacterMotionController {
    pub fn new(policy: MotionPolicy) -> Self {
        Self {
            policy,
            slots: [None, None],
        }
    }

    /// Register a character once its node is available. A role binds once.
    pub fn bind_character(
        &mut self,
        role: Role,
        node: hecs::Entity,
        position: Vec3,
        facing: Vec3,
        rest: Option<Vec3>,
    ) -> Result<(), BindError> {
        let slot = &mut self.slots[role.slot()];
        if slot.is_some() {
            return Err(BindError::AlreadyBound(role));
        }
        *slot = Some(Character {
            role,
            node,
            position,
            baseline: position.y,
            rest,
            facing,
            state: AnimationState::Idle,
        });
        log::info!("Bound {} character at {:?}", role.label(), position);
        Ok(())
    }

    pub fn get(&self, role: Role) -> Option<&Character> {
        self.slots[role.slot()].as_ref()
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.slots.iter().flatten()
    }

    pub fn bound_count(&self) -> usize {
        self.characters().count()
    }

    /// Start the hop-then-walk toward home for every bound character.
    /// Replaces whatever the character was doing.
    pub fn request_night_entrance(&mut self, now: f32) {
        self.start_entrance(now, Entrance::Toggle);
    }

    /// Night entrance for characters bound after night already began.
    pub fn request_entrance_on_bind(&mut self, now: f32) {
        self.start_entrance(now, Entrance::LateBind);
    }

    fn start_entrance(&mut self, now: f32, entrance: Entrance) {
        let policy = self.policy;
        for c in self.slots.iter_mut().flatten() {
            // Hops and walks are measured from the baseline.
            c.position.y = c.baseline;

            let facing_away = horizontal_dir(-c.facing);
            let (direction, speed, duration) = match entrance {
                Entrance::Toggle => (
                    horizontal_dir(policy.home - c.position).or(facing_away),
                    policy.night_walk_speed,
                    policy.night_walk_duration,
                ),
                Entrance::LateBind => (
                    facing_away.or_else(|| horizontal_dir(policy.home - c.position)),
                    policy.late_bind_walk_speed,
                    policy.late_bind_walk_duration,
                ),
            };
            let direction = direction.unwrap_or(Vec3::NEG_Z);

            log::debug!(
                "{} hops toward ({:.3}, {:.3}) from ({:.2}, {:.2})",
                c.role.label(),
                direction.x,
                direction.z,
                c.position.x,
                c.position.z,
            );
            c.state = AnimationState::Hop {
                start_time: now,
                duration: policy.hop_duration,
                walk: WalkPlan {
                    direction,
                    speed,
                    duration,
                },
            };
        }
    }

    /// Send every bound character back to its rest position.
    /// Characters without a rest position just stop.
    pub fn request_day_exit(&mut self) {
        let speed = self.policy.slide_speed;
        for c in self.slots.iter_mut().flatten() {
            c.position.y = c.baseline;
            c.state = match c.rest {
                Some(target) => {
                    log::debug!(
                        "{} slides back from ({:.2}, {:.2}) to ({:.2}, {:.2})",
                        c.role.label(),
                        c.position.x,
                        c.position.z,
                        target.x,
                        target.z,
                    );
                    AnimationState::SlideOut { target, speed }
                }
                None => AnimationState::Idle,
            };
        }
    }

    /// Apply one tick of motion to every animating character.
    pub fn advance(&mut self, now: f32, delta: f32) {
        let policy = self.policy;
        // Guards against a zero or negative frame time from the host clock.
        let step = delta.max(policy.min_delta);

        for c in self.slots.iter_mut().flatten() {
            match c.state {
                AnimationState::Idle => {}
                AnimationState::Hop {
                    start_time,
                    duration,
                    walk,
                } => {
                    let t = hop_progress(now, start_time, duration);
                    c.position.y = c.baseline + hop_offset(t, policy.hop_height);
                    if t >= 1.0 {
                        c.position.y = c.baseline;
                        c.state = AnimationState::WalkIn {
                            start_time: now,
                            duration: walk.duration,
                            speed: walk.speed,
                            direction: walk.direction,
                        };
                        log::debug!("{} starts walking", c.role.label());
                    }
                }
                AnimationState::WalkIn {
                    start_time,
                    duration,
                    speed,
                    direction,
                } => {
                    c.position += direction * speed * step;
                    if now - start_time > duration {
                        c.state = AnimationState::Idle;
                        log::debug!(
                            "{} stops at ({:.2}, {:.2})",
                            c.role.label(),
                            c.position.x,
                            c.position.z,
                        );
                    }
                }
                AnimationState::SlideOut { target, speed } => {
                    let mut to_target = target - c.position;
                    to_target.y = 0.0;
                    let dist = to_target.length();
                    if dist > policy.snap_distance {
                        // Never overshoot, so distance only ever shrinks.
                        let travel = (speed * step).min(dist);
                        c.position += to_target / dist * travel;
                    } else {
                        c.position.x = target.x;
                        c.position.z = target.z;
                        c.position.y = c.baseline;
                        c.state = AnimationState::Idle;
                        log::info!("{} is back at rest", c.role.label());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.02;

    fn node() -> hecs::Entity {
        hecs::World::new().spawn(())
    }

    fn controller_with(role: Role, pos: Vec3) -> CharacterMotionController {
        let mut ctl = CharacterMotionController::new(MotionPolicy::default());
        ctl.bind_character(role, node(), pos, Vec3::Z, Some(pos)).unwrap();
        ctl
    }

    /// Tick from `from` until `until`, returning the time reached.
    fn run(ctl: &mut CharacterMotionController, from: f32, until: f32) -> f32 {
        let mut now = from;
        while now < until {
            now += DT;
            ctl.advance(now, DT);
        }
        now
    }

    #[test]
    fn node_names_match_case_insensitively() {
        assert_eq!(Role::from_node_name("Ranito"), Some(Role::Male));
        assert_eq!(Role::from_node_name("RANITA"), Some(Role::Female));
        assert_eq!(Role::from_node_name("casita"), None);
    }

    #[test]
    fn second_bind_is_rejected() {
        let mut ctl = controller_with(Role::Male, Vec3::new(1.0, 0.0, 1.0));
        let err = ctl
            .bind_character(Role::Male, node(), Vec3::ZERO, Vec3::Z, None)
            .unwrap_err();
        assert_eq!(err, BindError::AlreadyBound(Role::Male));
        assert_eq!(ctl.get(Role::Male).unwrap().position, Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(ctl.bound_count(), 1);
    }

    #[test]
    fn requests_without_characters_are_noops() {
        let mut ctl = CharacterMotionController::new(MotionPolicy::default());
        ctl.request_night_entrance(1.0);
        ctl.request_day_exit();
        ctl.advance(1.1, 0.1);
        assert_eq!(ctl.bound_count(), 0);
    }

    #[test]
    fn hop_rises_to_peak_then_walks() {
        let mut ctl = controller_with(Role::Female, Vec3::new(2.0, 0.3, 0.0));
        ctl.request_night_entrance(10.0);

        ctl.advance(10.0, DT);
        let c = ctl.get(Role::Female).unwrap();
        assert!((c.position.y - 0.3).abs() < 1e-6);

        ctl.advance(10.3, DT);
        let c = ctl.get(Role::Female).unwrap();
        assert!((c.position.y - 0.45).abs() < 1e-4);
        assert!(matches!(c.state, AnimationState::Hop { .. }));

        ctl.advance(10.6, DT);
        let c = ctl.get(Role::Female).unwrap();
        assert_eq!(c.position.y, 0.3);
        match c.state {
            AnimationState::WalkIn {
                start_time,
                direction,
                speed,
                duration,
            } => {
                assert_eq!(start_time, 10.6);
                assert_eq!(speed, 0.4);
                assert_eq!(duration, 1.8);
                assert!((direction - Vec3::NEG_X).length() < 1e-6);
            }
            other => panic!("expected WalkIn, got {other:?}"),
        }
    }

    #[test]
    fn walk_covers_speed_times_elapsed_then_idles() {
        let start = Vec3::new(3.0, 0.0, 4.0);
        let mut ctl = controller_with(Role::Male, start);
        ctl.request_night_entrance(0.0);
        ctl.advance(0.6, DT);

        let mut now = 0.6;
        let mut ticks = 0;
        loop {
            now += DT;
            ctl.advance(now, DT);
            ticks += 1;
            if ctl.get(Role::Male).unwrap().state.is_idle() {
                break;
            }
            assert!(now - 0.6 <= 1.8 + 1e-4, "walked past its duration");
        }
        assert!(now - 0.6 > 1.8 - 1e-4);

        let expected = start + Vec3::new(-0.6, 0.0, -0.8) * 0.4 * DT * ticks as f32;
        let got = ctl.get(Role::Male).unwrap().position;
        assert!((got - expected).length() < 1e-4, "{got:?} vs {expected:?}");
    }

    #[test]
    fn degenerate_delta_still_moves() {
        let mut ctl = controller_with(Role::Male, Vec3::new(1.0, 0.0, 0.0));
        ctl.request_night_entrance(0.0);
        ctl.advance(0.7, 0.0);
        ctl.advance(0.8, 0.0);
        let x = ctl.get(Role::Male).unwrap().position.x;
        assert!((x - (1.0 - 0.4 * 0.016)).abs() < 1e-6);
    }

    #[test]
    fn slide_converges_monotonically_and_snaps_exactly() {
        let rest = Vec3::new(0.731, 0.05, -1.177);
        let mut ctl = controller_with(Role::Female, rest);
        ctl.request_night_entrance(0.0);
        let now = run(&mut ctl, 0.0, 3.0);
        assert!(ctl.get(Role::Female).unwrap().state.is_idle());

        ctl.request_day_exit();
        let dist = |ctl: &CharacterMotionController| {
            let p = ctl.get(Role::Female).unwrap().position;
            Vec3::new(rest.x - p.x, 0.0, rest.z - p.z).length()
        };
        let mut last = dist(&ctl);
        let mut t = now;
        // Include a long hitch frame to exercise the clamp.
        let deltas = std::iter::repeat(DT)
            .take(20)
            .chain(std::iter::once(1.5))
            .chain(std::iter::repeat(DT).take(500));
        for delta in deltas {
            t += delta;
            ctl.advance(t, delta);
            let d = dist(&ctl);
            assert!(d <= last, "distance grew from {last} to {d}");
            last = d;
        }
        let c = ctl.get(Role::Female).unwrap();
        assert!(c.state.is_idle());
        assert_eq!(c.position.x.to_bits(), rest.x.to_bits());
        assert_eq!(c.position.z.to_bits(), rest.z.to_bits());
        assert_eq!(c.position.y, rest.y);
    }

    #[test]
    fn day_exit_without_rest_position_stops() {
        let mut ctl = CharacterMotionController::new(MotionPolicy::default());
        ctl.bind_character(Role::Male, node(), Vec3::X, Vec3::Z, None)
            .unwrap();
        ctl.request_night_entrance(0.0);
        ctl.request_day_exit();
        assert!(ctl.get(Role::Male).unwrap().state.is_idle());
    }

    #[test]
    fn interrupting_a_hop_restores_baseline_and_retargets() {
        let rest = Vec3::new(2.0, 0.1, 2.0);
        let mut ctl = controller_with(Role::Male, rest);
        ctl.request_night_entrance(0.0);
        ctl.advance(0.3, DT);
        assert!(ctl.get(Role::Male).unwrap().position.y > 0.2);

        ctl.request_day_exit();
        let c = ctl.get(Role::Male).unwrap();
        assert_eq!(c.position.y, 0.1);
        assert_eq!(
            c.state,
            AnimationState::SlideOut {
                target: rest,
                speed: 0.5
            }
        );
    }

    #[test]
    fn late_bind_entrance_walks_away_from_facing() {
        let mut ctl = CharacterMotionController::new(MotionPolicy::default());
        ctl.bind_character(Role::Female, node(), Vec3::new(1.0, 0.0, 1.0), Vec3::X, None)
            .unwrap();
        ctl.request_entrance_on_bind(5.0);
        match ctl.get(Role::Female).unwrap().state {
            AnimationState::Hop { walk, .. } => {
                assert_eq!(walk.direction, Vec3::NEG_X);
                assert_eq!(walk.speed, 0.8);
                assert_eq!(walk.duration, 2.0);
            }
            other => panic!("expected Hop, got {other:?}"),
        }
    }

    #[test]
    fn entrance_at_home_falls_back_to_facing() {
        let mut ctl = CharacterMotionController::new(MotionPolicy::default());
        ctl.bind_character(Role::Male, node(), Vec3::ZERO, Vec3::Z, Some(Vec3::ZERO))
            .unwrap();
        ctl.request_night_entrance(0.0);
        match ctl.get(Role::Male).unwrap().state {
            AnimationState::Hop { walk, .. } => assert_eq!(walk.direction, Vec3::NEG_Z),
            other => panic!("expected Hop, got {other:?}"),
        }
    }

    #[test]
    fn repeated_round_trips_do_not_drift() {
        let rest = Vec3::new(-1.4, 0.02, 0.9);
        let mut ctl = controller_with(Role::Male, rest);
        let mut now = 0.0;
        for _ in 0..2 {
            ctl.request_night_entrance(now);
            now = run(&mut ctl, now, now + 3.0);
            ctl.request_day_exit();
            now = run(&mut ctl, now, now + 6.0);
        }
        let c = ctl.get(Role::Male).unwrap();
        assert!(c.state.is_idle());
        assert_eq!(c.position.x, rest.x);
        assert_eq!(c.position.z, rest.z);
        assert_eq!(c.position.y, rest.y);
    }
}
