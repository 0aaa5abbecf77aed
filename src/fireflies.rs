use glam::Vec3;

use crate::config::FireflyConfig;

/// A wandering light mote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Firefly {
    pub position: Vec3,
    /// Per-tick drift. Only x and z drive motion.
    pub speed: Vec3,
    /// Center of the wander box.
    pub origin_x: f32,
    pub origin_z: f32,
    /// Current emissive strength.
    pub intensity: f32,
}

/// Fixed swarm of fireflies created once at startup. Visible only at night;
/// the caller only advances it while visible.
pub struct FireflySimulator {
    flies: Vec<Firefly>,
    visible: bool,
    config: FireflyConfig,
}

impl FireflySimulator {
    pub fn new(config: FireflyConfig, rng: &mut fastrand::Rng) -> Self {
        let flies = (0..config.count)
            .map(|_| {
                let position = Vec3::new(
                    (rng.f32() - 0.5) * config.spread,
                    config.min_height + rng.f32() * config.height_range,
                    (rng.f32() - 0.5) * config.spread,
                );
                Firefly {
                    position,
                    speed: Vec3::new(
                        (rng.f32() - 0.5) * config.max_speed,
                        (rng.f32() - 0.5) * config.max_speed * 0.5,
                        (rng.f32() - 0.5) * config.max_speed,
                    ),
                    origin_x: position.x,
                    origin_z: position.z,
                    intensity: config.base_intensity,
                }
            })
            .collect();

        Self {
            flies,
            visible: false,
            config,
        }
    }

    /// One tick of drift, bob and flicker at `elapsed` seconds.
    pub fn advance(&mut self, elapsed: f32) {
        let c = self.config;
        for fly in &mut self.flies {
            fly.position.x += fly.speed.x;
            fly.position.y += (elapsed + fly.position.x * 10.0).sin() * c.bob;
            fly.position.z += fly.speed.z;

            // Turn back toward the origin once outside the box.
            let dx = fly.position.x - fly.origin_x;
            if dx > c.wander_range {
                fly.speed.x = -fly.speed.x.abs();
            } else if dx < -c.wander_range {
                fly.speed.x = fly.speed.x.abs();
            }
            let dz = fly.position.z - fly.origin_z;
            if dz > c.wander_range {
                fly.speed.z = -fly.speed.z.abs();
            } else if dz < -c.wander_range {
                fly.speed.z = fly.speed.z.abs();
            }

            fly.intensity =
                c.base_intensity + (elapsed * 5.0 + fly.position.x * 100.0).sin() * c.flicker;
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn flies(&self) -> &[Firefly] {
        &self.flies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swarm() -> FireflySimulator {
        FireflySimulator::new(FireflyConfig::default(), &mut fastrand::Rng::with_seed(99))
    }

    #[test]
    fn spawns_hidden_inside_the_island() {
        let s = swarm();
        assert!(!s.is_visible());
        assert_eq!(s.flies().len(), 15);
        for f in s.flies() {
            assert!(f.position.x.abs() <= 3.0 && f.position.z.abs() <= 3.0);
            assert!(f.position.y >= 0.2 && f.position.y <= 1.7);
            assert_eq!(f.origin_x, f.position.x);
        }
    }

    #[test]
    fn wander_stays_bounded() {
        let mut s = swarm();
        let max_step = FireflyConfig::default().max_speed / 2.0;
        let mut t = 0.0;
        for _ in 0..20_000 {
            t += 1.0 / 60.0;
            s.advance(t);
            for f in s.flies() {
                assert!((f.position.x - f.origin_x).abs() <= 3.0 + max_step + 1e-5);
                assert!((f.position.z - f.origin_z).abs() <= 3.0 + max_step + 1e-5);
            }
        }
    }

    #[test]
    fn speed_flips_at_the_box_edge() {
        let mut s = swarm();
        let fly = &mut s.flies[0];
        fly.position.x = fly.origin_x + 2.999;
        fly.speed.x = 0.005;
        s.advance(0.0);
        assert_eq!(s.flies()[0].speed.x, -0.005);
        s.advance(0.1);
        assert!(s.flies()[0].position.x - s.flies()[0].origin_x < 3.0);
    }

    #[test]
    fn flicker_oscillates_around_base() {
        let mut s = swarm();
        s.advance(1.0);
        for f in s.flies() {
            assert!(f.intensity >= 1.0 - 1e-6 && f.intensity <= 2.0 + 1e-6);
        }
    }
}
