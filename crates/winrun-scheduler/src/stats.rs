//! Scheduler statistics counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters accumulated across the scheduler's lifetime.
#[derive(Debug, Default)]
pub(crate) struct SchedulerMetrics {
    capture_attempts: AtomicU64,
    frames_captured: AtomicU64,
    frames_written: AtomicU64,
    notifications_sent: AtomicU64,
    capture_errors: AtomicU64,
    buffer_full: AtomicU64,
}

/// Immutable point-in-time copy of [`SchedulerMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStatsSnapshot {
    /// Ticks in which a capture was attempted.
    pub capture_attempts: u64,
    /// Frames successfully captured from [`crate::WindowCapture`].
    pub frames_captured: u64,
    /// Frames successfully written into a slot.
    pub frames_written: u64,
    /// `FrameReady` notifications the outbound queue accepted.
    pub notifications_sent: u64,
    /// Capture attempts that returned [`crate::CaptureError`].
    pub capture_errors: u64,
    /// Frames dropped because the ring had no free slot.
    pub buffer_full: u64,
}

impl SchedulerMetrics {
    pub(crate) fn record_capture_attempt(&self) {
        self.capture_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_frame_captured(&self) {
        self.frames_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_frame_written(&self) {
        self.frames_written.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_notification_sent(&self) {
        self.notifications_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_capture_error(&self) {
        self.capture_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_buffer_full(&self) {
        self.buffer_full.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> SchedulerStatsSnapshot {
        SchedulerStatsSnapshot {
            capture_attempts: self.capture_attempts.load(Ordering::Relaxed),
            frames_captured: self.frames_captured.load(Ordering::Relaxed),
            frames_written: self.frames_written.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent.load(Ordering::Relaxed),
            capture_errors: self.capture_errors.load(Ordering::Relaxed),
            buffer_full: self.buffer_full.load(Ordering::Relaxed),
        }
    }
}
