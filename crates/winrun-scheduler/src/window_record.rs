//! Per-window bookkeeping the scheduler keeps between ticks.

use std::time::Instant;

#[derive(Debug, Clone)]
pub(crate) struct WindowRecord {
    pub(crate) last_capture_at: Option<Instant>,
    pub(crate) last_frame_number: u32,
    pub(crate) consecutive_failures: u32,
}

impl WindowRecord {
    pub(crate) fn new() -> Self {
        Self { last_capture_at: None, last_frame_number: 0, consecutive_failures: 0 }
    }
}
