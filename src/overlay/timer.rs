use instant::Instant;

/// Which phase of the frame is being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SystemPhase {
    Smoke = 0,
    Fireflies = 1,
    Characters = 2,
    BuildInstances = 3,
    Render = 4,
}

impl SystemPhase {
    pub const ALL: [SystemPhase; 5] = [
        Self::Smoke,
        Self::Fireflies,
        Self::Characters,
        Self::BuildInstances,
        Self::Render,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Smoke => "Smoke",
            Self::Fireflies => "Fireflies",
            Self::Characters => "Characters",
            Self::BuildInstances => "Build Inst.",
            Self::Render => "Render",
        }
    }
}

pub const PHASE_COUNT: usize = SystemPhase::ALL.len();
const EMA_ALPHA: f64 = 0.1;

/// Per-phase timing with exponential moving average smoothing.
pub struct SystemTimers {
    /// EMA-smoothed duration in microseconds per phase.
    pub durations_us: [f64; PHASE_COUNT],
    start: Instant,
}

impl SystemTimers {
    pub fn new() -> Self {
        Self {
            durations_us: [0.0; PHASE_COUNT],
            start: Instant::now(),
        }
    }

    /// Call before a phase runs.
    pub fn begin(&mut self) {
        self.start = Instant::now();
    }

    /// Call after a phase finishes.
    pub fn end(&mut self, phase: SystemPhase) {
        let elapsed_us = self.start.elapsed().as_secs_f64() * 1_000_000.0;
        let slot = &mut self.durations_us[phase as usize];
        *slot = *slot * (1.0 - EMA_ALPHA) + elapsed_us * EMA_ALPHA;
    }

    pub fn total_us(&self) -> f64 {
        self.durations_us.iter().sum()
    }
}
