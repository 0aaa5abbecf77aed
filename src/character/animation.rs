use glam::Vec3;

/// Walk that follows a hop. Captured when the entrance is requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkPlan {
    /// Unit direction in the XZ plane.
    pub direction: Vec3,
    /// Units per second.
    pub speed: f32,
    /// Seconds.
    pub duration: f32,
}

/// Per-character animation phase. Each variant carries everything its motion
/// law needs, so a state never depends on leftovers from an earlier one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationState {
    /// At rest.
    Idle,
    /// Vertical hop in place; always followed by `WalkIn`.
    Hop {
        start_time: f32,
        duration: f32,
        walk: WalkPlan,
    },
    /// Horizontal walk toward the cottage for a fixed time.
    WalkIn {
        start_time: f32,
        duration: f32,
        speed: f32,
        direction: Vec3,
    },
    /// Horizontal slide back to the rest position.
    SlideOut { target: Vec3, speed: f32 },
}

impl AnimationState {
    pub fn is_idle(&self) -> bool {
        matches!(self, AnimationState::Idle)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AnimationState::Idle => "Idle",
            AnimationState::Hop { .. } => "Hop",
            AnimationState::WalkIn { .. } => "WalkIn",
            AnimationState::SlideOut { .. } => "SlideOut",
        }
    }
}

/// Normalized hop progress in [0, 1].
pub fn hop_progress(now: f32, start_time: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return 1.0;
    }
    ((now - start_time) / duration).clamp(0.0, 1.0)
}

/// Height above the baseline at hop progress `t`.
pub fn hop_offset(t: f32, height: f32) -> f32 {
    (t * std::f32::consts::PI).sin() * height
}

/// Flatten onto the XZ plane and normalize. `None` when there is nothing left.
pub fn horizontal_dir(v: Vec3) -> Option<Vec3> {
    Vec3::new(v.x, 0.0, v.z).try_normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hop_starts_and_ends_on_baseline() {
        assert_eq!(hop_offset(hop_progress(2.0, 2.0, 0.6), 0.15), 0.0);
        assert!(hop_offset(hop_progress(2.6, 2.0, 0.6), 0.15).abs() < 1e-6);
    }

    #[test]
    fn hop_peaks_at_half_duration() {
        let t = hop_progress(1.3, 1.0, 0.6);
        assert!((t - 0.5).abs() < 1e-5);
        assert!((hop_offset(t, 0.15) - 0.15).abs() < 1e-6);
    }

    #[test]
    fn progress_clamps() {
        assert_eq!(hop_progress(0.0, 1.0, 0.6), 0.0);
        assert_eq!(hop_progress(10.0, 1.0, 0.6), 1.0);
        assert_eq!(hop_progress(1.0, 1.0, 0.0), 1.0);
    }

    #[test]
    fn horizontal_dir_drops_height() {
        let d = horizontal_dir(Vec3::new(3.0, 7.0, 4.0)).unwrap();
        assert_eq!(d.y, 0.0);
        assert!((d.x - 0.6).abs() < 1e-6);
        assert!((d.z - 0.8).abs() < 1e-6);
        assert!(horizontal_dir(Vec3::new(0.0, 2.0, 0.0)).is_none());
    }
}
