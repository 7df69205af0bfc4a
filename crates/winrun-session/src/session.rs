//! One tracked guest process and its lifecycle state.

use std::time::Instant;

use winrun_core::WindowId;
use winrun_proto::payloads::SessionStateWire;

/// A session's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Process seen, no window associated yet.
    Starting,
    /// At least one window associated and recently active.
    Active,
    /// Windows associated but no recent activity.
    Idle,
    /// Process has exited. Terminal: later associations are ignored.
    Exited,
}

impl SessionState {
    /// Projects onto the wire representation used by [`SessionStateWire`].
    #[must_use]
    pub fn to_wire(self) -> SessionStateWire {
        match self {
            Self::Starting => SessionStateWire::Starting,
            Self::Active => SessionStateWire::Active,
            Self::Idle => SessionStateWire::Idle,
            Self::Exited => SessionStateWire::Exited,
        }
    }
}

/// One tracked guest process.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) process_id: u32,
    pub(crate) executable_path: String,
    pub(crate) state: SessionState,
    pub(crate) windows: Vec<WindowId>,
    pub(crate) last_activity_at: Instant,
}

impl Session {
    /// Owning process id.
    #[must_use]
    pub fn process_id(&self) -> u32 {
        self.process_id
    }

    /// Path to the session's executable.
    #[must_use]
    pub fn executable_path(&self) -> &str {
        &self.executable_path
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Windows currently associated with this session.
    #[must_use]
    pub fn windows(&self) -> &[WindowId] {
        &self.windows
    }

    /// Timestamp of the last activity observed for this session.
    #[must_use]
    pub fn last_activity_at(&self) -> Instant {
        self.last_activity_at
    }
}
