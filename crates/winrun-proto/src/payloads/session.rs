//! Session lifecycle payloads.

use serde::{Deserialize, Serialize};
use winrun_core::WindowId;

/// Mirrors a session's lifecycle state on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStateWire {
    /// Process seen, no window associated yet.
    Starting,
    /// At least one window associated and recently active.
    Active,
    /// Windows associated but no recent activity.
    Idle,
    /// Process has exited. Terminal.
    Exited,
}

/// Host asks for the current session list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSessions {
    /// Correlates the eventual [`SessionList`] response.
    pub message_id: u64,
}

/// Host asks the guest to close a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseSession {
    /// Correlates the eventual `Ack`.
    pub message_id: u64,
    /// The session's process id, as a string (matches host-side identifiers).
    pub session_id: String,
}

/// One entry in a [`SessionList`] response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Owning process id.
    pub process_id: u32,
    /// Path to the session's executable.
    pub executable_path: String,
    /// Current lifecycle state.
    pub state: SessionStateWire,
    /// Windows currently associated with this session.
    pub window_ids: Vec<WindowId>,
}

/// Guest returns the current session list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionList {
    /// Echoes the originating [`ListSessions::message_id`].
    pub message_id: u64,
    /// One entry per tracked session.
    pub sessions: Vec<SessionSummary>,
}
