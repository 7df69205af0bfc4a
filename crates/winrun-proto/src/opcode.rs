//! Message-kind codes for the framed control protocol.

/// Direction a message kind travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Sent by the host, received by the guest.
    HostToGuest,
    /// Sent by the guest, received by the host.
    GuestToHost,
}

/// One byte identifying the shape of an envelope's JSON payload.
///
/// `kind ∈ [0x01..0x7F]` is host→guest, `[0x80..0xFF]` is guest→host. Hosts
/// and guests built against this table independently must agree on these
/// codes byte-for-byte; changing a value here is a wire-breaking change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Host asks the guest to launch a program.
    LaunchProgram = 0x01,
    /// Host asks the guest for an executable's icon.
    RequestIcon = 0x02,
    /// Host pushes clipboard content down to the guest.
    ClipboardData = 0x03,
    /// Host injects a mouse event.
    MouseInput = 0x04,
    /// Host injects a keyboard event.
    KeyboardInput = 0x05,
    /// Host forwards a drag-and-drop event.
    DragDropEvent = 0x06,
    /// Host asks for the current session list.
    ListSessions = 0x07,
    /// Host asks the guest to close a session.
    CloseSession = 0x08,
    /// Host asks for the discovered shortcut list.
    ListShortcuts = 0x09,
    /// Host asks the guest agent to shut down.
    Shutdown = 0x0A,

    /// Guest announces a tracked window's metadata.
    WindowMetadata = 0x80,
    /// Guest announces a published frame.
    FrameReady = 0x81,
    /// Guest announces its protocol version and capability flags.
    CapabilityAnnounce = 0x82,
    /// Guest announces a window's DPI.
    DpiInfo = 0x83,
    /// Guest returns requested icon data.
    IconData = 0x84,
    /// Guest reports a discovered shortcut.
    ShortcutDetected = 0x85,
    /// Guest reports a local clipboard change.
    ClipboardChanged = 0x86,
    /// Guest liveness heartbeat.
    Heartbeat = 0x87,
    /// Guest telemetry snapshot.
    TelemetryReport = 0x88,
    /// Guest reports provisioning progress.
    ProvisioningProgress = 0x89,
    /// Guest reports a provisioning error.
    ProvisioningError = 0x8A,
    /// Guest reports provisioning completion.
    ProvisioningComplete = 0x8B,
    /// Guest returns the current session list.
    SessionList = 0x8C,
    /// Guest returns the discovered shortcut list.
    ShortcutList = 0x8D,
    /// Guest reports a non-fatal processing error.
    Error = 0x8E,
    /// Guest acknowledges a host request.
    Ack = 0x8F,
    /// Guest announces a (re)allocated per-window frame buffer.
    WindowBufferAllocated = 0x90,
}

impl Opcode {
    /// Maps a raw byte to the opcode it names, if any.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0x01 => Self::LaunchProgram,
            0x02 => Self::RequestIcon,
            0x03 => Self::ClipboardData,
            0x04 => Self::MouseInput,
            0x05 => Self::KeyboardInput,
            0x06 => Self::DragDropEvent,
            0x07 => Self::ListSessions,
            0x08 => Self::CloseSession,
            0x09 => Self::ListShortcuts,
            0x0A => Self::Shutdown,
            0x80 => Self::WindowMetadata,
            0x81 => Self::FrameReady,
            0x82 => Self::CapabilityAnnounce,
            0x83 => Self::DpiInfo,
            0x84 => Self::IconData,
            0x85 => Self::ShortcutDetected,
            0x86 => Self::ClipboardChanged,
            0x87 => Self::Heartbeat,
            0x88 => Self::TelemetryReport,
            0x89 => Self::ProvisioningProgress,
            0x8A => Self::ProvisioningError,
            0x8B => Self::ProvisioningComplete,
            0x8C => Self::SessionList,
            0x8D => Self::ShortcutList,
            0x8E => Self::Error,
            0x8F => Self::Ack,
            0x90 => Self::WindowBufferAllocated,
            _ => return None,
        })
    }

    /// The raw byte this opcode serializes to.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Which side originates messages of this kind.
    #[must_use]
    pub fn direction(self) -> Direction {
        if self.to_u8() < 0x80 { Direction::HostToGuest } else { Direction::GuestToHost }
    }
}
