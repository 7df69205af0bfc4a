//! Pure, action-based session lifecycle state machine.
//!
//! Mirrors the shape of `lockframe_core::connection::Connection`: every
//! method takes the current time explicitly, mutates in-memory state, and
//! returns the actions a caller should perform. Nothing here touches a
//! clock, a channel, or the filesystem directly.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use winrun_core::WindowId;

use crate::heartbeat::{Heartbeat, SystemStats};
use crate::session::{Session, SessionState};

/// Effect emitted by a [`SessionManager`] transition for the driving shell to
/// act on (e.g. publish a wire message, log, or update telemetry).
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// A tracked session moved from `old_state` to `new_state`.
    StateChanged {
        /// The session's process id.
        process_id: u32,
        /// State before the transition.
        old_state: SessionState,
        /// State after the transition.
        new_state: SessionState,
    },
    /// The heartbeat interval elapsed; a heartbeat is ready to be sent.
    HeartbeatDue(Heartbeat),
}

/// Tuning knobs for [`SessionManager`].
#[derive(Debug, Clone)]
pub struct SessionManagerConfig {
    /// How often [`SessionManager::tick`] should emit a heartbeat.
    pub heartbeat_interval: Duration,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(5),
        }
    }
}

/// Tracks the lifecycle of every guest process the agent knows about.
pub struct SessionManager {
    config: SessionManagerConfig,
    sessions: HashMap<u32, Session>,
    started_at: Instant,
    last_heartbeat_at: Option<Instant>,
}

impl SessionManager {
    /// Creates an empty manager. `now` anchors uptime reporting.
    #[must_use]
    pub fn new(config: SessionManagerConfig, now: Instant) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
            started_at: now,
            last_heartbeat_at: None,
        }
    }

    /// Number of sessions currently tracked, in any state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True if no sessions are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Looks up a tracked session by process id.
    #[must_use]
    pub fn session(&self, process_id: u32) -> Option<&Session> {
        self.sessions.get(&process_id)
    }

    /// Iterates over every tracked session.
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Begins tracking a process. A process id already tracked is left
    /// untouched: this is an upsert in name only, since a session's identity
    /// and history belong to its first sighting.
    pub fn track_session(
        &mut self,
        process_id: u32,
        executable_path: impl Into<String>,
        now: Instant,
    ) -> Vec<SessionAction> {
        self.sessions.entry(process_id).or_insert_with(|| Session {
            process_id,
            executable_path: executable_path.into(),
            state: SessionState::Starting,
            windows: Vec::new(),
            last_activity_at: now,
        });
        Vec::new()
    }

    /// Associates a window with a tracked session. Unknown process ids and
    /// exited sessions are ignored. The first association transitions
    /// `Starting` to `Active`; reassociating after `Idle` revives it.
    pub fn associate_window(
        &mut self,
        window_id: WindowId,
        process_id: u32,
        now: Instant,
    ) -> Vec<SessionAction> {
        let Some(session) = self.sessions.get_mut(&process_id) else {
            return Vec::new();
        };
        if session.state == SessionState::Exited {
            return Vec::new();
        }

        if !session.windows.contains(&window_id) {
            session.windows.push(window_id);
        }
        session.last_activity_at = now;

        let old_state = session.state;
        let new_state = match old_state {
            SessionState::Starting | SessionState::Idle => SessionState::Active,
            other => other,
        };
        if new_state == old_state {
            return Vec::new();
        }
        session.state = new_state;
        vec![SessionAction::StateChanged {
            process_id,
            old_state,
            new_state,
        }]
    }

    /// Removes a window from a tracked session. When the last window is
    /// removed from an `Active` session, it becomes `Idle`.
    pub fn disassociate_window(&mut self, window_id: WindowId, process_id: u32) -> Vec<SessionAction> {
        let Some(session) = self.sessions.get_mut(&process_id) else {
            return Vec::new();
        };
        if session.state == SessionState::Exited {
            return Vec::new();
        }
        session.windows.retain(|id| *id != window_id);

        let old_state = session.state;
        let new_state = if session.windows.is_empty() && old_state == SessionState::Active {
            SessionState::Idle
        } else {
            old_state
        };
        if new_state == old_state {
            return Vec::new();
        }
        session.state = new_state;
        vec![SessionAction::StateChanged {
            process_id,
            old_state,
            new_state,
        }]
    }

    /// Marks a session `Exited`. Terminal: later associations or activity for
    /// this process id are ignored. Idempotent for already-exited sessions
    /// and no-ops for unknown process ids.
    pub fn mark_session_exited(&mut self, process_id: u32) -> Vec<SessionAction> {
        let Some(session) = self.sessions.get_mut(&process_id) else {
            return Vec::new();
        };
        let old_state = session.state;
        if old_state == SessionState::Exited {
            return Vec::new();
        }
        session.state = SessionState::Exited;
        vec![SessionAction::StateChanged {
            process_id,
            old_state,
            new_state: SessionState::Exited,
        }]
    }

    /// Refreshes a session's last-activity timestamp. Revives an `Idle`
    /// session back to `Active`.
    pub fn record_activity(&mut self, process_id: u32, now: Instant) -> Vec<SessionAction> {
        let Some(session) = self.sessions.get_mut(&process_id) else {
            return Vec::new();
        };
        if session.state == SessionState::Exited {
            return Vec::new();
        }
        session.last_activity_at = now;

        let old_state = session.state;
        let new_state = if old_state == SessionState::Idle {
            SessionState::Active
        } else {
            old_state
        };
        if new_state == old_state {
            return Vec::new();
        }
        session.state = new_state;
        vec![SessionAction::StateChanged {
            process_id,
            old_state,
            new_state,
        }]
    }

    /// Builds a heartbeat snapshot as of `now`, without touching the
    /// heartbeat timer (see [`Self::tick`] for the timer-driven variant).
    #[must_use]
    pub fn generate_heartbeat(&self, stats: &impl SystemStats, now: Instant) -> Heartbeat {
        Heartbeat {
            tracked_window_count: self.sessions.values().map(|s| s.windows.len()).sum(),
            uptime_ms: u64::try_from(now.saturating_duration_since(self.started_at).as_millis())
                .unwrap_or(u64::MAX),
            cpu_usage_percent: stats.cpu_usage_percent(),
            memory_usage_bytes: stats.memory_usage_bytes(),
        }
    }

    /// Drives the heartbeat timer. Call periodically from the owning shell;
    /// emits [`SessionAction::HeartbeatDue`] once per elapsed interval.
    pub fn tick(&mut self, now: Instant, stats: &impl SystemStats) -> Vec<SessionAction> {
        let due = match self.last_heartbeat_at {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.config.heartbeat_interval,
        };
        if !due {
            return Vec::new();
        }
        self.last_heartbeat_at = Some(now);
        vec![SessionAction::HeartbeatDue(self.generate_heartbeat(stats, now))]
    }
}
