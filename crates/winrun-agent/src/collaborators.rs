//! Out-of-scope collaborators the agent dispatcher delegates to.
//!
//! Program launch, icon extraction, input injection, and start-menu
//! shortcut enumeration are all platform-specific primitives the agent
//! composes over rather than implements. Each trait here is the seam; each
//! `Null*` is the test double that lets [`crate::driver::AgentDriver`] be
//! exercised without touching the real desktop.

use winrun_proto::payloads::{KeyboardInput, MouseInput, ShortcutDescriptor};

/// Starts a guest-side process on behalf of a host-originated
/// `LaunchProgram` request.
pub trait ProgramLauncher: Send + Sync {
    /// Launches `path` with `arguments` in `working_directory` (or the
    /// default if `None`). Returns `Ok(())` if the process was started;
    /// the exit code and lifetime of the launched process are not tracked
    /// here.
    ///
    /// # Errors
    ///
    /// Returns a human-readable failure description on any launch failure.
    fn launch(&self, path: &str, arguments: &[String], working_directory: Option<&str>) -> Result<(), String>;
}

/// Extracts an icon for a host-originated `RequestIcon` request.
pub trait IconExtractor: Send + Sync {
    /// Returns PNG-encoded icon bytes for `path`, or `None` if `path` has
    /// no associated icon.
    ///
    /// # Errors
    ///
    /// Returns a human-readable failure description if extraction fails.
    fn extract_icon(&self, path: &str) -> Result<Option<Vec<u8>>, String>;
}

/// Injects synthetic mouse and keyboard input into the guest desktop.
pub trait InputInjector: Send + Sync {
    /// Injects a mouse event targeting `input.window_id`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable failure description if injection fails.
    fn inject_mouse(&self, input: &MouseInput) -> Result<(), String>;

    /// Injects a keyboard event targeting `input.window_id`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable failure description if injection fails.
    fn inject_keyboard(&self, input: &KeyboardInput) -> Result<(), String>;
}

/// Enumerates start-menu/desktop shortcuts for `ListShortcuts` requests.
pub trait ShortcutProvider: Send + Sync {
    /// Returns every shortcut currently discoverable on the guest.
    ///
    /// # Errors
    ///
    /// Returns a human-readable failure description if enumeration fails.
    fn list_shortcuts(&self) -> Result<Vec<ShortcutDescriptor>, String>;
}

/// A [`ProgramLauncher`] that always fails; for composition without a real
/// process-launch backend wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgramLauncher;

impl ProgramLauncher for NullProgramLauncher {
    fn launch(&self, _path: &str, _arguments: &[String], _working_directory: Option<&str>) -> Result<(), String> {
        Err("program launch is not available in this build".to_string())
    }
}

/// An [`IconExtractor`] that always reports no icon.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullIconExtractor;

impl IconExtractor for NullIconExtractor {
    fn extract_icon(&self, _path: &str) -> Result<Option<Vec<u8>>, String> {
        Ok(None)
    }
}

/// An [`InputInjector`] that accepts every event without injecting
/// anything, recording the last event of each kind for assertions.
#[derive(Debug, Default)]
pub struct NullInputInjector {
    last_mouse: std::sync::Mutex<Option<MouseInput>>,
    last_keyboard: std::sync::Mutex<Option<KeyboardInput>>,
}

impl NullInputInjector {
    /// Creates an injector with no recorded events.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent mouse event accepted, if any.
    #[must_use]
    pub fn last_mouse(&self) -> Option<MouseInput> {
        self.last_mouse.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// The most recent keyboard event accepted, if any.
    #[must_use]
    pub fn last_keyboard(&self) -> Option<KeyboardInput> {
        self.last_keyboard.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl InputInjector for NullInputInjector {
    fn inject_mouse(&self, input: &MouseInput) -> Result<(), String> {
        *self.last_mouse.lock().unwrap_or_else(|p| p.into_inner()) = Some(input.clone());
        Ok(())
    }

    fn inject_keyboard(&self, input: &KeyboardInput) -> Result<(), String> {
        *self.last_keyboard.lock().unwrap_or_else(|p| p.into_inner()) = Some(input.clone());
        Ok(())
    }
}

/// A [`ShortcutProvider`] that always reports an empty shortcut list.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullShortcutProvider;

impl ShortcutProvider for NullShortcutProvider {
    fn list_shortcuts(&self) -> Result<Vec<ShortcutDescriptor>, String> {
        Ok(Vec::new())
    }
}
