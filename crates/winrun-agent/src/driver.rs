//! Pure, synchronous message dispatch (C10): the `Message` → `Vec<AgentAction>`
//! decision layer [`crate::AgentService`] drives with real I/O.
//!
//! A decision step takes no queue handle, no clock read, and performs no
//! filesystem access beyond what the wrapped session/clipboard/drag-drop
//! components already perform. Every variant `process_inbound` cannot handle
//! falls through to an `ErrorReport` rather than failing the caller's loop.

use std::sync::Arc;
use std::time::Instant;

use winrun_clipboard::ClipboardSync;
use winrun_core::{Capabilities, Environment, ProtocolVersion, WindowId};
use winrun_dragdrop::{DragDropOutcome, DragDropStaging};
use winrun_proto::payloads::{Ack, CapabilityAnnounce, ErrorReport, IconData, SessionList, SessionSummary, ShortcutList};
use winrun_proto::Message;
use winrun_session::{NullSystemStats, SessionAction, SessionManager, SystemStats};

use crate::collaborators::{IconExtractor, InputInjector, ProgramLauncher, ShortcutProvider};

/// One effect [`AgentDriver::process_inbound`] (or a timer-driven method)
/// asks the owning [`crate::AgentService`] to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentAction {
    /// Enqueue `0` onto the outbound channel.
    Send(Message),
    /// A `Shutdown` request was accepted; the owning shell should stop the
    /// dispatch loop after flushing pending sends.
    Shutdown,
}

/// Wires C7 (session manager), C8 (clipboard sync), C9 (drag-and-drop
/// staging), and the out-of-scope collaborators (program launch, icon
/// extraction, input injection, shortcut discovery) behind one
/// `process_inbound` entry point.
pub struct AgentDriver<E: Environment, B: winrun_clipboard::ClipboardBackend> {
    session: SessionManager,
    clipboard: ClipboardSync<B>,
    dragdrop: DragDropStaging<E>,
    launcher: Arc<dyn ProgramLauncher>,
    icon: Arc<dyn IconExtractor>,
    input: Arc<dyn InputInjector>,
    shortcuts: Arc<dyn ShortcutProvider>,
    capabilities: Capabilities,
    version: ProtocolVersion,
}

impl<E: Environment, B: winrun_clipboard::ClipboardBackend> AgentDriver<E, B> {
    /// Builds a driver with `capabilities`/`version` as the values
    /// [`Self::capability_announce`] reports.
    #[must_use]
    pub fn new(
        session: SessionManager,
        clipboard: ClipboardSync<B>,
        dragdrop: DragDropStaging<E>,
        launcher: Arc<dyn ProgramLauncher>,
        icon: Arc<dyn IconExtractor>,
        input: Arc<dyn InputInjector>,
        shortcuts: Arc<dyn ShortcutProvider>,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            session,
            clipboard,
            dragdrop,
            launcher,
            icon,
            input,
            shortcuts,
            capabilities,
            version: ProtocolVersion::CURRENT,
        }
    }

    /// The current [`SessionManager`], for periodic heartbeat/activity
    /// bookkeeping the owning shell drives on its own timer.
    pub fn session_manager_mut(&mut self) -> &mut SessionManager {
        &mut self.session
    }

    /// The current [`DragDropStaging`] engine, for periodic stale-session
    /// cleanup the owning shell drives on its own timer.
    pub fn dragdrop_mut(&mut self) -> &mut DragDropStaging<E> {
        &mut self.dragdrop
    }

    /// The capability announcement sent once, unsolicited, at channel
    /// establishment.
    #[must_use]
    pub fn capability_announce(&self) -> Message {
        Message::CapabilityAnnounce(CapabilityAnnounce { version: self.version, capabilities: self.capabilities })
    }

    /// Maps [`SessionAction`]s emitted by a timer-driven [`SessionManager`]
    /// tick into outbound actions. `StateChanged` is logged, not sent on the
    /// wire; `HeartbeatDue` becomes a presence-only [`Message::Heartbeat`].
    #[must_use]
    pub fn heartbeat_tick(&mut self, now: Instant) -> Vec<AgentAction> {
        self.session
            .tick(now, &NullSystemStats)
            .into_iter()
            .filter_map(|action| match action {
                SessionAction::StateChanged { process_id, old_state, new_state } => {
                    tracing::info!(process_id, ?old_state, ?new_state, "session state changed");
                    None
                }
                SessionAction::HeartbeatDue(_) => Some(AgentAction::Send(Message::Heartbeat)),
            })
            .collect()
    }

    /// Same as [`Self::heartbeat_tick`], but sourcing CPU/memory figures from
    /// a real [`SystemStats`] sampler instead of the always-zero default.
    #[must_use]
    pub fn heartbeat_tick_with_stats(&mut self, now: Instant, stats: &impl SystemStats) -> Vec<AgentAction> {
        self.session
            .tick(now, stats)
            .into_iter()
            .filter_map(|action| match action {
                SessionAction::StateChanged { process_id, old_state, new_state } => {
                    tracing::info!(process_id, ?old_state, ?new_state, "session state changed");
                    None
                }
                SessionAction::HeartbeatDue(_) => Some(AgentAction::Send(Message::Heartbeat)),
            })
            .collect()
    }

    /// Decodes and dispatches one inbound message.
    ///
    /// Every handler that meaningfully acknowledges a request emits an
    /// [`Ack`]; handlers whose wire shape carries no `message_id` (clipboard
    /// pushes, input injection, drag-and-drop events) act silently on
    /// success and surface an [`ErrorReport`] on failure. Unrecognized or
    /// guest-originated kinds received inbound produce an `ErrorReport`
    /// ("unknown message kind") without failing the loop.
    pub fn process_inbound(&mut self, message: Message, now: Instant) -> Vec<AgentAction> {
        match message {
            Message::LaunchProgram(p) => {
                let working_directory = (!p.working_directory.is_empty()).then_some(p.working_directory.as_str());
                match self.launcher.launch(&p.path, &p.arguments, working_directory) {
                    Ok(()) => vec![AgentAction::Send(Message::Ack(Ack::ok(p.message_id)))],
                    Err(reason) => vec![AgentAction::Send(Message::Ack(Ack::failed(p.message_id, reason)))],
                }
            }
            Message::RequestIcon(p) => match self.icon.extract_icon(&p.path) {
                Ok(png_bytes) => {
                    vec![AgentAction::Send(Message::IconData(IconData { message_id: p.message_id, png_bytes }))]
                }
                Err(reason) => vec![AgentAction::Send(Message::Ack(Ack::failed(p.message_id, reason)))],
            },
            Message::ClipboardData(data) => match self.clipboard.set_clipboard(data) {
                Ok(()) => Vec::new(),
                Err(error) => vec![AgentAction::Send(Message::Error(ErrorReport { message: error.to_string() }))],
            },
            Message::MouseInput(input) => {
                if let Err(reason) = self.input.inject_mouse(&input) {
                    return vec![AgentAction::Send(Message::Error(ErrorReport { message: reason }))];
                }
                Vec::new()
            }
            Message::KeyboardInput(input) => {
                if let Err(reason) = self.input.inject_keyboard(&input) {
                    return vec![AgentAction::Send(Message::Error(ErrorReport { message: reason }))];
                }
                Vec::new()
            }
            Message::DragDropEvent(event) => match self.dragdrop.handle_drag_drop(event, now) {
                Ok(DragDropOutcome::Staged(result)) if !result.success => {
                    let message = result.error_message.unwrap_or_else(|| "staging failed".to_string());
                    vec![AgentAction::Send(Message::Error(ErrorReport { message }))]
                }
                Ok(_) => Vec::new(),
                Err(error) => vec![AgentAction::Send(Message::Error(ErrorReport { message: error.to_string() }))],
            },
            Message::ListSessions(req) => {
                let sessions = self
                    .session
                    .sessions()
                    .map(|session| SessionSummary {
                        process_id: session.process_id(),
                        executable_path: session.executable_path().to_string(),
                        state: session.state().to_wire(),
                        window_ids: session.windows().to_vec(),
                    })
                    .collect();
                vec![AgentAction::Send(Message::SessionList(SessionList { message_id: req.message_id, sessions }))]
            }
            Message::CloseSession(req) => match req.session_id.parse::<u32>() {
                Ok(process_id) if self.session.session(process_id).is_some() => {
                    self.session.mark_session_exited(process_id);
                    vec![AgentAction::Send(Message::Ack(Ack::ok(req.message_id)))]
                }
                Ok(_) => {
                    vec![AgentAction::Send(Message::Ack(Ack::failed(req.message_id, "no such session")))]
                }
                Err(_) => {
                    vec![AgentAction::Send(Message::Ack(Ack::failed(req.message_id, "invalid session id")))]
                }
            },
            Message::ListShortcuts(req) => match self.shortcuts.list_shortcuts() {
                Ok(shortcuts) => {
                    vec![AgentAction::Send(Message::ShortcutList(ShortcutList { message_id: req.message_id, shortcuts }))]
                }
                Err(reason) => vec![AgentAction::Send(Message::Ack(Ack::failed(req.message_id, reason)))],
            },
            Message::Shutdown(req) => {
                vec![AgentAction::Send(Message::Ack(Ack::ok(req.message_id))), AgentAction::Shutdown]
            }
            _unexpected => {
                vec![AgentAction::Send(Message::Error(ErrorReport { message: "unknown message kind".to_string() }))]
            }
        }
    }

    /// Removes drag-and-drop staging sessions older than `max_age`,
    /// via `cleanup_stale_sessions`.
    pub fn cleanup_stale_dragdrop(&mut self, max_age: std::time::Duration, now: Instant) -> Vec<WindowId> {
        self.dragdrop.cleanup_stale_sessions(max_age, now)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use winrun_clipboard::NullClipboardBackend;
    use winrun_core::{ManualEnvironment, WindowId};
    use winrun_dragdrop::DragDropConfig;
    use winrun_proto::payloads::{CloseSession, LaunchProgram, ListSessions, Shutdown};
    use winrun_session::SessionManagerConfig;

    use super::*;
    use crate::collaborators::{NullIconExtractor, NullInputInjector, NullProgramLauncher, NullShortcutProvider};

    fn driver(dir: &std::path::Path) -> AgentDriver<ManualEnvironment, NullClipboardBackend> {
        let env = ManualEnvironment::new();
        AgentDriver::new(
            SessionManager::new(SessionManagerConfig::default(), Instant::now()),
            ClipboardSync::new(NullClipboardBackend::new()),
            DragDropStaging::new(DragDropConfig::new(dir.to_path_buf()), env),
            Arc::new(NullProgramLauncher),
            Arc::new(NullIconExtractor),
            Arc::new(NullInputInjector::new()),
            Arc::new(NullShortcutProvider),
            Capabilities::CLIPBOARD_SYNC,
        )
    }

    #[test]
    fn capability_announce_carries_configured_flags() {
        let dir = tempfile::tempdir().expect("tempdir");
        let msg = driver(dir.path()).capability_announce();
        match msg {
            Message::CapabilityAnnounce(a) => {
                assert!(a.capabilities.contains(Capabilities::CLIPBOARD_SYNC));
                assert_eq!(a.version, ProtocolVersion::CURRENT);
            }
            other => panic!("expected CapabilityAnnounce, got {other:?}"),
        }
    }

    #[test]
    fn launch_program_with_null_launcher_acks_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut driver = driver(dir.path());
        let actions = driver.process_inbound(
            Message::LaunchProgram(LaunchProgram {
                message_id: 42,
                path: "C:\\App.exe".to_string(),
                arguments: vec!["--x".to_string()],
                working_directory: "C:\\".to_string(),
            }),
            Instant::now(),
        );
        match actions.as_slice() {
            [AgentAction::Send(Message::Ack(ack))] => {
                assert_eq!(ack.message_id, 42);
                assert!(!ack.success);
            }
            other => panic!("unexpected actions: {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_emits_error_without_failing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut driver = driver(dir.path());
        let actions = driver.process_inbound(Message::Unknown(0x77, vec![]), Instant::now());
        match actions.as_slice() {
            [AgentAction::Send(Message::Error(report))] => assert_eq!(report.message, "unknown message kind"),
            other => panic!("unexpected actions: {other:?}"),
        }
    }

    #[test]
    fn close_session_scenario_s8_acks_and_exits_the_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut driver = driver(dir.path());
        let now = Instant::now();
        driver.session_manager_mut().track_session(1234, "C:\\App.exe", now);
        driver.session_manager_mut().associate_window(WindowId::new(100), 1234, now);

        let actions = driver.process_inbound(
            Message::CloseSession(CloseSession { message_id: 1, session_id: "1234".to_string() }),
            now,
        );
        match actions.as_slice() {
            [AgentAction::Send(Message::Ack(ack))] => assert!(ack.success),
            other => panic!("unexpected actions: {other:?}"),
        }
        assert_eq!(
            driver.session_manager_mut().session(1234).expect("tracked").state(),
            winrun_session::SessionState::Exited
        );
    }

    #[test]
    fn close_session_unknown_id_fails_the_ack() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut driver = driver(dir.path());
        let actions = driver.process_inbound(
            Message::CloseSession(CloseSession { message_id: 2, session_id: "9999".to_string() }),
            Instant::now(),
        );
        match actions.as_slice() {
            [AgentAction::Send(Message::Ack(ack))] => assert!(!ack.success),
            other => panic!("unexpected actions: {other:?}"),
        }
    }

    #[test]
    fn list_sessions_reports_tracked_sessions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut driver = driver(dir.path());
        let now = Instant::now();
        driver.session_manager_mut().track_session(5, "C:\\A.exe", now);

        let actions = driver.process_inbound(Message::ListSessions(ListSessions { message_id: 9 }), now);
        match actions.as_slice() {
            [AgentAction::Send(Message::SessionList(list))] => {
                assert_eq!(list.message_id, 9);
                assert_eq!(list.sessions.len(), 1);
                assert_eq!(list.sessions[0].process_id, 5);
            }
            other => panic!("unexpected actions: {other:?}"),
        }
    }

    #[test]
    fn shutdown_acks_and_requests_stop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut driver = driver(dir.path());
        let actions = driver.process_inbound(Message::Shutdown(Shutdown { message_id: 7 }), Instant::now());
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], AgentAction::Send(Message::Ack(_))));
        assert!(matches!(actions[1], AgentAction::Shutdown));
    }

    #[test]
    fn heartbeat_tick_emits_presence_only_heartbeat_when_due() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut driver = driver(dir.path());
        let now = Instant::now();
        driver.session_manager_mut().track_session(1, "a", now);
        driver.session_manager_mut().associate_window(WindowId::new(1), 1, now);

        let actions = driver.heartbeat_tick(now);
        assert_eq!(actions, vec![AgentAction::Send(Message::Heartbeat)]);
    }
}
