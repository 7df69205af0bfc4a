//! Window tracking, frame publication, and buffer allocation payloads.

use serde::{Deserialize, Serialize};
use winrun_core::WindowId;

/// Guest announces (or updates) a tracked window's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowMetadata {
    /// The window being described.
    pub window_id: WindowId,
    /// Window title, as currently displayed.
    pub title: String,
    /// Owning process id.
    pub process_id: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Whether the window is currently visible.
    pub is_visible: bool,
}

/// Guest announces a window's DPI scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DpiInfo {
    /// The window being described.
    pub window_id: WindowId,
    /// Horizontal dots-per-inch.
    pub dpi_x: u32,
    /// Vertical dots-per-inch.
    pub dpi_y: u32,
}

/// Guest announces a published frame, for the host to read out of the
/// shared-memory ring buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameReady {
    /// Window the frame belongs to.
    pub window_id: WindowId,
    /// Index of the slot the frame was written to, modulo `slots_per_window`.
    pub slot_index: u32,
    /// Strictly increasing per window.
    pub frame_number: u32,
    /// Whether the host may present this frame without reference to prior
    /// frames. Always `true` for the first frame published for a window.
    pub is_key_frame: bool,
}

/// Guest announces that a per-window frame buffer was (re)allocated, so the
/// host can remap the shared-memory region before reading subsequent slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBufferAllocated {
    /// Window the buffer belongs to.
    pub window_id: WindowId,
    /// Byte offset into the shared-memory region, or the raw pointer value
    /// when the buffer fell back to a local heap allocation.
    pub buffer_pointer_or_offset: u64,
    /// Total size of the buffer region in bytes (`slots_per_window * slot_size`).
    pub buffer_size: u64,
    /// Size of a single slot in bytes.
    pub slot_size: u64,
    /// Number of slots in the ring.
    pub slot_count: u32,
    /// Whether slots in this buffer carry LZ4-compressed payloads.
    pub is_compressed: bool,
    /// `false` on the buffer's first allocation, `true` on every subsequent
    /// reallocation (tranche promotion or dimension change).
    pub is_reallocation: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_ready_round_trips_through_json() {
        let ready =
            FrameReady { window_id: WindowId::new(3), slot_index: 1, frame_number: 42, is_key_frame: false };
        let json = serde_json::to_string(&ready).expect("serialize");
        let back: FrameReady = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(ready, back);
    }
}
