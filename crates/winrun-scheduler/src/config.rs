//! Tuning consumed at scheduler start.

use std::time::Duration;

/// Tuning for one [`crate::FrameStreamingScheduler`].
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Target capture rate, clamped to `1..=120`. Default 30.
    pub target_fps: u32,
    /// Accepted for parity with the host-side configuration surface; the
    /// bundled [`crate::WindowCapture`] implementations are synchronous and
    /// do not honor a deadline, so this value is currently inert here.
    pub capture_timeout_ms: u64,
    /// Consecutive per-window capture failures before reinitialization.
    pub max_consecutive_failures: u32,
    /// Delay observed after reinitializing a capture source.
    pub reinitialization_delay_ms: u64,
    /// When `false`, every tick performs one full-desktop capture instead of
    /// per-window captures.
    pub enable_per_window_capture: bool,
    /// Minimum time between two captures of the same window.
    pub min_window_frame_interval_ms: u64,
    /// Emit a key frame every `n`-th frame per window, in addition to the
    /// first. `0` disables the periodic cadence (only frame 1 is a key frame).
    pub key_frame_cadence: u32,
    /// Interval between `cleanup_stale_window_states` sweeps.
    pub cleanup_interval_ms: u64,
}

impl SchedulerConfig {
    /// The spacing between ticks implied by `target_fps`, per the capture loop's
    /// step 1 (`1000 / target_fps`, integer truncation).
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        let fps = u64::from(self.target_fps.clamp(1, 120));
        Duration::from_millis(1000 / fps)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            capture_timeout_ms: 100,
            max_consecutive_failures: 10,
            reinitialization_delay_ms: 1000,
            enable_per_window_capture: true,
            min_window_frame_interval_ms: 33,
            key_frame_cadence: 0,
            cleanup_interval_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_interval_truncates_like_the_spec_formula() {
        let config = SchedulerConfig { target_fps: 30, ..SchedulerConfig::default() };
        assert_eq!(config.frame_interval().as_millis(), 33);
    }

    #[test]
    fn frame_interval_clamps_target_fps_to_one_through_120() {
        let low = SchedulerConfig { target_fps: 0, ..SchedulerConfig::default() };
        assert_eq!(low.frame_interval(), Duration::from_millis(1000));

        let high = SchedulerConfig { target_fps: 1000, ..SchedulerConfig::default() };
        assert_eq!(high.frame_interval(), Duration::from_millis(1000 / 120));
    }
}
