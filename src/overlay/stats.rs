use std::collections::VecDeque;

/// Number of frame times kept for the history graph.
pub const FRAME_HISTORY_LEN: usize = 240;
/// Seconds between FPS log lines.
const LOG_INTERVAL: f64 = 5.0;

/// Rolling frame-time statistics with a periodic log line.
pub struct FrameStats {
    history: VecDeque<f64>,
    pub fps: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub frame_count: u64,
    log_timer: f64,
    log_frames: u32,
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(FRAME_HISTORY_LEN),
            fps: 0.0,
            avg: 0.0,
            min: 0.0,
            max: 0.0,
            frame_count: 0,
            log_timer: 0.0,
            log_frames: 0,
        }
    }

    /// Record one frame time in seconds.
    pub fn record(&mut self, dt: f64) {
        self.frame_count += 1;
        if self.history.len() == FRAME_HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(dt);

        let (sum, min, max) = self
            .history
            .iter()
            .fold((0.0, f64::MAX, 0.0f64), |(s, lo, hi), &t| (s + t, lo.min(t), hi.max(t)));
        self.avg = sum / self.history.len() as f64;
        self.min = min;
        self.max = max;
        self.fps = if self.avg > 0.0 { 1.0 / self.avg } else { 0.0 };

        self.log_frames += 1;
        self.log_timer += dt;
        if self.log_timer >= LOG_INTERVAL {
            log::info!(
                "FPS: {:.0} | avg: {:.2}ms | min: {:.2}ms | max: {:.2}ms | total frames: {}",
                self.log_frames as f64 / self.log_timer,
                self.avg * 1000.0,
                self.min * 1000.0,
                self.max * 1000.0,
                self.frame_count,
            );
            self.log_timer = 0.0;
            self.log_frames = 0;
        }
    }

    /// Oldest to newest.
    pub fn history(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_track_window() {
        let mut stats = FrameStats::new();
        stats.record(0.010);
        stats.record(0.030);
        assert!((stats.avg - 0.020).abs() < 1e-12);
        assert_eq!(stats.min, 0.010);
        assert_eq!(stats.max, 0.030);
        assert!((stats.fps - 50.0).abs() < 1e-9);
    }

    #[test]
    fn history_is_capped() {
        let mut stats = FrameStats::new();
        for i in 0..FRAME_HISTORY_LEN + 10 {
            stats.record(i as f64 * 1e-4);
        }
        assert_eq!(stats.history().count(), FRAME_HISTORY_LEN);
        assert_eq!(stats.history().next(), Some(10.0 * 1e-4));
        assert_eq!(stats.frame_count, (FRAME_HISTORY_LEN + 10) as u64);
    }
}
