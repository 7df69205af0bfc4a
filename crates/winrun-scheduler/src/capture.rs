//! Injected capture and window-tracking collaborators.
//!
//! Desktop-duplication primitives and window enumeration are platform
//! specific and out of scope for this crate; the scheduler
//! drives whatever implementation of these traits the production binary
//! supplies and exercises its own logic against the bundled [`NullCapture`]
//! / [`StaticWindowTracker`] test doubles.

use thiserror::Error;
use winrun_core::WindowId;

/// One captured frame's raw pixel payload, prior to compression.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Row stride in bytes.
    pub stride: u32,
    /// Pixel format tag, opaque to this crate.
    pub format: u8,
    /// Raw pixel bytes, `stride * height` long.
    pub pixels: Vec<u8>,
}

/// Failure modes of a [`WindowCapture`] implementation.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The capture source could not produce a frame this attempt.
    #[error("capture source unavailable: {0}")]
    Unavailable(String),
}

/// Out-of-scope collaborator: acquires raw pixels for a window or the
/// full desktop.
pub trait WindowCapture: Send + Sync {
    /// Captures the current contents of `window_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] when the source cannot produce a frame.
    fn capture_window(&self, window_id: WindowId) -> Result<CapturedFrame, CaptureError>;

    /// Captures the full desktop, used when per-window capture is disabled.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] when the source cannot produce a frame.
    fn capture_desktop(&self) -> Result<CapturedFrame, CaptureError>;

    /// Called after `max_consecutive_failures` consecutive errors for one
    /// window, before the scheduler waits out `reinitialization_delay_ms`.
    /// Default no-op; real implementations reset whatever duplication
    /// handle or device context backs the capture source.
    fn reinitialize(&self) {}
}

/// Out-of-scope collaborator: reports which windows are currently live.
pub trait WindowTracker: Send + Sync {
    /// The windows currently eligible for per-window capture.
    fn live_windows(&self) -> Vec<WindowId>;

    /// The identity used to key the buffer and notifications for full-desktop
    /// capture, when per-window capture is disabled. Defaults to `WindowId(0)`.
    fn desktop_window_id(&self) -> WindowId {
        WindowId::new(0)
    }
}

/// Test/placeholder capture source: always succeeds with a fixed 1x1 frame.
#[derive(Debug, Default)]
pub struct NullCapture;

impl WindowCapture for NullCapture {
    fn capture_window(&self, _window_id: WindowId) -> Result<CapturedFrame, CaptureError> {
        Ok(CapturedFrame { width: 1, height: 1, stride: 4, format: 0, pixels: vec![0u8; 4] })
    }

    fn capture_desktop(&self) -> Result<CapturedFrame, CaptureError> {
        self.capture_window(WindowId::new(0))
    }
}

/// Test/placeholder tracker reporting a fixed live-window set.
#[derive(Debug, Clone, Default)]
pub struct StaticWindowTracker {
    windows: Vec<WindowId>,
}

impl StaticWindowTracker {
    /// Builds a tracker that always reports `windows` as live.
    #[must_use]
    pub fn new(windows: Vec<WindowId>) -> Self {
        Self { windows }
    }
}

impl WindowTracker for StaticWindowTracker {
    fn live_windows(&self) -> Vec<WindowId> {
        self.windows.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_capture_always_succeeds() {
        let capture = NullCapture;
        assert!(capture.capture_window(WindowId::new(7)).is_ok());
        assert!(capture.capture_desktop().is_ok());
    }

    #[test]
    fn static_tracker_reports_fixed_set() {
        let tracker = StaticWindowTracker::new(vec![WindowId::new(1), WindowId::new(2)]);
        assert_eq!(tracker.live_windows(), vec![WindowId::new(1), WindowId::new(2)]);
        assert_eq!(tracker.desktop_window_id(), WindowId::new(0));
    }
}
