use instant::Instant;

/// Longest frame delta handed to the simulation (seconds).
const MAX_DELTA: f32 = 0.25;

/// Frame clock: seconds since start plus the time since the last tick.
pub struct FrameClock {
    start: Instant,
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last: None,
        }
    }

    /// Advance one frame. Returns `(elapsed, delta)`; the first delta is 0.
    pub fn tick(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let delta = self
            .last
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last = Some(now);
        (
            now.duration_since(self.start).as_secs_f32(),
            delta.min(MAX_DELTA),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_monotonic_and_delta_bounded() {
        let mut clock = FrameClock::new();
        let (t0, d0) = clock.tick();
        assert_eq!(d0, 0.0);
        std::thread::sleep(std::time::Duration::from_millis(3));
        let (t1, d1) = clock.tick();
        assert!(t1 > t0);
        assert!(d1 > 0.0 && d1 <= MAX_DELTA);
    }
}
