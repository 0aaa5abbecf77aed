use glam::Vec3;

use crate::config::SmokeConfig;

/// One puff of chimney smoke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmokePuff {
    pub position: Vec3,
    /// Units per tick.
    pub velocity: Vec3,
}

/// Fixed pool of puffs rising from the chimney. Puffs are recycled in
/// place, never added or removed.
pub struct SmokeSimulator {
    puffs: Vec<SmokePuff>,
    config: SmokeConfig,
    rng: fastrand::Rng,
}

impl SmokeSimulator {
    pub fn new(config: SmokeConfig, rng: fastrand::Rng) -> Self {
        let mut sim = Self {
            puffs: Vec::with_capacity(config.count),
            config,
            rng,
        };
        for _ in 0..config.count {
            let puff = sim.spawn_puff();
            sim.puffs.push(puff);
        }
        sim
    }

    /// Fresh puff at the chimney with randomized jitter and upward velocity.
    fn spawn_puff(&mut self) -> SmokePuff {
        let c = &self.config;
        let rng = &mut self.rng;
        SmokePuff {
            position: Vec3::new(
                c.emitter.x + (rng.f32() - 0.5) * c.spawn_jitter,
                c.emitter.y + rng.f32() * c.spawn_lift,
                c.emitter.z + (rng.f32() - 0.5) * c.spawn_jitter,
            ),
            velocity: Vec3::new(
                (rng.f32() - 0.5) * c.drift,
                c.rise_min + rng.f32() * c.rise_range,
                (rng.f32() - 0.5) * c.drift,
            ),
        }
    }

    /// One step: move every puff, damp its sideways drift and recycle the
    /// ones that rose past the ceiling. Frame time is ignored.
    pub fn advance(&mut self) {
        let damping = self.config.lateral_damping;
        let ceiling = self.ceiling();

        for i in 0..self.puffs.len() {
            let puff = &mut self.puffs[i];
            puff.position += puff.velocity;
            puff.velocity.x *= damping;
            puff.velocity.z *= damping;

            if puff.position.y > ceiling {
                self.puffs[i] = self.spawn_puff();
            }
        }
    }

    /// Height above which puffs are recycled.
    pub fn ceiling(&self) -> f32 {
        self.config.emitter.y + self.config.ceiling
    }

    pub fn puffs(&self) -> &[SmokePuff] {
        &self.puffs
    }

    pub fn len(&self) -> usize {
        self.puffs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> SmokeSimulator {
        SmokeSimulator::new(SmokeConfig::default(), fastrand::Rng::with_seed(42))
    }

    #[test]
    fn spawns_full_pool_near_chimney() {
        let s = sim();
        let c = SmokeConfig::default();
        assert_eq!(s.len(), 80);
        for p in s.puffs() {
            assert!((p.position.x - c.emitter.x).abs() <= c.spawn_jitter / 2.0);
            assert!(p.position.y >= c.emitter.y && p.position.y <= c.emitter.y + c.spawn_lift);
            assert!(p.velocity.y >= c.rise_min);
        }
    }

    #[test]
    fn puffs_rise_and_spread_decays() {
        let mut s = sim();
        let before = s.puffs()[3];
        s.advance();
        let after = s.puffs()[3];
        assert_eq!(after.position, before.position + before.velocity);
        assert_eq!(after.velocity.x, before.velocity.x * 0.995);
        assert_eq!(after.velocity.z, before.velocity.z * 0.995);
        assert_eq!(after.velocity.y, before.velocity.y);
    }

    #[test]
    fn pool_is_constant_and_never_escapes_the_ceiling() {
        let mut s = sim();
        let ceiling = s.ceiling();
        let rise_per_tick = SmokeConfig::default().rise_min + SmokeConfig::default().rise_range;
        for _ in 0..2000 {
            s.advance();
            assert_eq!(s.len(), 80);
            for p in s.puffs() {
                assert!(p.position.y <= ceiling + rise_per_tick);
            }
        }
    }

    #[test]
    fn every_puff_gets_recycled() {
        let mut s = sim();
        let starts: Vec<_> = s.puffs().iter().map(|p| p.velocity).collect();
        // Slowest puff needs 2.0 / 0.008 = 250 ticks to clear the ceiling.
        for _ in 0..300 {
            s.advance();
        }
        for (p, v0) in s.puffs().iter().zip(starts) {
            assert_ne!(p.velocity.y, v0.y);
        }
    }

    #[test]
    fn every_tick_is_one_step_regardless_of_frame_time() {
        let mut scene = crate::scene::SceneState::new(
            &crate::config::SceneConfig::default(),
            &mut fastrand::Rng::with_seed(7),
        );
        let mut timers = crate::overlay::timer::SystemTimers::new();
        let before = scene.smoke.puffs()[5];
        scene.tick(1.0, 0.1, &mut timers);
        let after = scene.smoke.puffs()[5];
        assert_eq!(after.velocity.x, before.velocity.x * 0.995);
        assert_eq!(after.position.y, before.position.y + before.velocity.y);
    }
}
