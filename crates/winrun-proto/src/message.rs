//! The sum type tying [`Opcode`]s to their decoded payload shapes.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Opcode;
use crate::error::ProtocolError;
use crate::payloads::{
    Ack, CapabilityAnnounce, ClipboardChanged, ClipboardData, CloseSession, DpiInfo, DragDropEvent,
    ErrorReport, FrameReady, IconData, KeyboardInput, LaunchProgram, ListSessions, ListShortcuts,
    MouseInput, ProvisioningComplete, ProvisioningError, ProvisioningProgress, RequestIcon,
    SessionList, ShortcutDetected, ShortcutList, Shutdown, TelemetryReport, WindowBufferAllocated,
    WindowMetadata,
};

/// One decoded message, tagged by the opcode it travelled under.
///
/// One variant per entry in the shared protocol table, plus [`Message::Unknown`]
/// for forward compatibility: a guest or host that does not yet recognize a
/// kind can still frame-skip it rather than desynchronize the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// See [`LaunchProgram`].
    LaunchProgram(LaunchProgram),
    /// See [`RequestIcon`].
    RequestIcon(RequestIcon),
    /// See [`ClipboardData`].
    ClipboardData(ClipboardData),
    /// See [`MouseInput`].
    MouseInput(MouseInput),
    /// See [`KeyboardInput`].
    KeyboardInput(KeyboardInput),
    /// See [`DragDropEvent`].
    DragDropEvent(DragDropEvent),
    /// See [`ListSessions`].
    ListSessions(ListSessions),
    /// See [`CloseSession`].
    CloseSession(CloseSession),
    /// See [`ListShortcuts`].
    ListShortcuts(ListShortcuts),
    /// See [`Shutdown`].
    Shutdown(Shutdown),
    /// See [`WindowMetadata`].
    WindowMetadata(WindowMetadata),
    /// See [`FrameReady`].
    FrameReady(FrameReady),
    /// See [`CapabilityAnnounce`].
    CapabilityAnnounce(CapabilityAnnounce),
    /// See [`DpiInfo`].
    DpiInfo(DpiInfo),
    /// See [`IconData`].
    IconData(IconData),
    /// See [`ShortcutDetected`].
    ShortcutDetected(ShortcutDetected),
    /// See [`ClipboardChanged`].
    ClipboardChanged(ClipboardChanged),
    /// Guest liveness heartbeat. Carries no payload fields beyond presence.
    Heartbeat,
    /// See [`TelemetryReport`].
    TelemetryReport(TelemetryReport),
    /// See [`ProvisioningProgress`].
    ProvisioningProgress(ProvisioningProgress),
    /// See [`ProvisioningError`].
    ProvisioningError(ProvisioningError),
    /// See [`ProvisioningComplete`].
    ProvisioningComplete(ProvisioningComplete),
    /// See [`SessionList`].
    SessionList(SessionList),
    /// See [`ShortcutList`].
    ShortcutList(ShortcutList),
    /// See [`ErrorReport`].
    Error(ErrorReport),
    /// See [`Ack`].
    Ack(Ack),
    /// See [`WindowBufferAllocated`].
    WindowBufferAllocated(WindowBufferAllocated),
    /// A recognized opcode byte whose payload this build does not (yet)
    /// decode into a typed variant, or an opcode byte this build does not
    /// recognize at all. Carries the raw bytes so the caller can skip past
    /// the envelope without losing framing sync.
    Unknown(u8, Vec<u8>),
}

impl Message {
    /// The opcode this message encodes under.
    #[must_use]
    pub fn kind(&self) -> u8 {
        match self {
            Self::LaunchProgram(_) => Opcode::LaunchProgram.to_u8(),
            Self::RequestIcon(_) => Opcode::RequestIcon.to_u8(),
            Self::ClipboardData(_) => Opcode::ClipboardData.to_u8(),
            Self::MouseInput(_) => Opcode::MouseInput.to_u8(),
            Self::KeyboardInput(_) => Opcode::KeyboardInput.to_u8(),
            Self::DragDropEvent(_) => Opcode::DragDropEvent.to_u8(),
            Self::ListSessions(_) => Opcode::ListSessions.to_u8(),
            Self::CloseSession(_) => Opcode::CloseSession.to_u8(),
            Self::ListShortcuts(_) => Opcode::ListShortcuts.to_u8(),
            Self::Shutdown(_) => Opcode::Shutdown.to_u8(),
            Self::WindowMetadata(_) => Opcode::WindowMetadata.to_u8(),
            Self::FrameReady(_) => Opcode::FrameReady.to_u8(),
            Self::CapabilityAnnounce(_) => Opcode::CapabilityAnnounce.to_u8(),
            Self::DpiInfo(_) => Opcode::DpiInfo.to_u8(),
            Self::IconData(_) => Opcode::IconData.to_u8(),
            Self::ShortcutDetected(_) => Opcode::ShortcutDetected.to_u8(),
            Self::ClipboardChanged(_) => Opcode::ClipboardChanged.to_u8(),
            Self::Heartbeat => Opcode::Heartbeat.to_u8(),
            Self::TelemetryReport(_) => Opcode::TelemetryReport.to_u8(),
            Self::ProvisioningProgress(_) => Opcode::ProvisioningProgress.to_u8(),
            Self::ProvisioningError(_) => Opcode::ProvisioningError.to_u8(),
            Self::ProvisioningComplete(_) => Opcode::ProvisioningComplete.to_u8(),
            Self::SessionList(_) => Opcode::SessionList.to_u8(),
            Self::ShortcutList(_) => Opcode::ShortcutList.to_u8(),
            Self::Error(_) => Opcode::Error.to_u8(),
            Self::Ack(_) => Opcode::Ack.to_u8(),
            Self::WindowBufferAllocated(_) => Opcode::WindowBufferAllocated.to_u8(),
            Self::Unknown(kind, _) => *kind,
        }
    }

    /// Serializes the payload to JSON bytes. `Heartbeat` has no fields, so it
    /// serializes to an empty JSON object.
    pub(crate) fn encode_payload(&self) -> serde_json::Result<Vec<u8>> {
        fn json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
            serde_json::to_vec(value)
        }

        match self {
            Self::LaunchProgram(p) => json(p),
            Self::RequestIcon(p) => json(p),
            Self::ClipboardData(p) => json(p),
            Self::MouseInput(p) => json(p),
            Self::KeyboardInput(p) => json(p),
            Self::DragDropEvent(p) => json(p),
            Self::ListSessions(p) => json(p),
            Self::CloseSession(p) => json(p),
            Self::ListShortcuts(p) => json(p),
            Self::Shutdown(p) => json(p),
            Self::WindowMetadata(p) => json(p),
            Self::FrameReady(p) => json(p),
            Self::CapabilityAnnounce(p) => json(p),
            Self::DpiInfo(p) => json(p),
            Self::IconData(p) => json(p),
            Self::ShortcutDetected(p) => json(p),
            Self::ClipboardChanged(p) => json(p),
            Self::Heartbeat => Ok(b"{}".to_vec()),
            Self::TelemetryReport(p) => json(p),
            Self::ProvisioningProgress(p) => json(p),
            Self::ProvisioningError(p) => json(p),
            Self::ProvisioningComplete(p) => json(p),
            Self::SessionList(p) => json(p),
            Self::ShortcutList(p) => json(p),
            Self::Error(p) => json(p),
            Self::Ack(p) => json(p),
            Self::WindowBufferAllocated(p) => json(p),
            Self::Unknown(_, bytes) => Ok(bytes.clone()),
        }
    }

    /// Decodes `payload` as the JSON shape registered for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownKind`] if `kind` does not name a
    /// recognized opcode, and [`ProtocolError::MalformedPayload`] if `payload`
    /// does not parse as the shape `kind` expects. [`Message::Unknown`] is
    /// never produced here; it exists for callers that need to carry an
    /// undecoded kind through code that otherwise speaks [`Message`], such as
    /// a pass-through relay.
    pub(crate) fn decode_payload(kind: u8, payload: &[u8]) -> Result<Self, ProtocolError> {
        fn from_json<T: DeserializeOwned>(kind: u8, payload: &[u8]) -> Result<T, ProtocolError> {
            serde_json::from_slice(payload).map_err(|source| ProtocolError::MalformedPayload { kind, source })
        }

        let opcode = Opcode::from_u8(kind).ok_or(ProtocolError::UnknownKind { kind })?;

        Ok(match opcode {
            Opcode::LaunchProgram => Self::LaunchProgram(from_json(kind, payload)?),
            Opcode::RequestIcon => Self::RequestIcon(from_json(kind, payload)?),
            Opcode::ClipboardData => Self::ClipboardData(from_json(kind, payload)?),
            Opcode::MouseInput => Self::MouseInput(from_json(kind, payload)?),
            Opcode::KeyboardInput => Self::KeyboardInput(from_json(kind, payload)?),
            Opcode::DragDropEvent => Self::DragDropEvent(from_json(kind, payload)?),
            Opcode::ListSessions => Self::ListSessions(from_json(kind, payload)?),
            Opcode::CloseSession => Self::CloseSession(from_json(kind, payload)?),
            Opcode::ListShortcuts => Self::ListShortcuts(from_json(kind, payload)?),
            Opcode::Shutdown => Self::Shutdown(from_json(kind, payload)?),
            Opcode::WindowMetadata => Self::WindowMetadata(from_json(kind, payload)?),
            Opcode::FrameReady => Self::FrameReady(from_json(kind, payload)?),
            Opcode::CapabilityAnnounce => Self::CapabilityAnnounce(from_json(kind, payload)?),
            Opcode::DpiInfo => Self::DpiInfo(from_json(kind, payload)?),
            Opcode::IconData => Self::IconData(from_json(kind, payload)?),
            Opcode::ShortcutDetected => Self::ShortcutDetected(from_json(kind, payload)?),
            Opcode::ClipboardChanged => Self::ClipboardChanged(from_json(kind, payload)?),
            Opcode::Heartbeat => Self::Heartbeat,
            Opcode::TelemetryReport => Self::TelemetryReport(from_json(kind, payload)?),
            Opcode::ProvisioningProgress => Self::ProvisioningProgress(from_json(kind, payload)?),
            Opcode::ProvisioningError => Self::ProvisioningError(from_json(kind, payload)?),
            Opcode::ProvisioningComplete => Self::ProvisioningComplete(from_json(kind, payload)?),
            Opcode::SessionList => Self::SessionList(from_json(kind, payload)?),
            Opcode::ShortcutList => Self::ShortcutList(from_json(kind, payload)?),
            Opcode::Error => Self::Error(from_json(kind, payload)?),
            Opcode::Ack => Self::Ack(from_json(kind, payload)?),
            Opcode::WindowBufferAllocated => Self::WindowBufferAllocated(from_json(kind, payload)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::Ack;

    #[test]
    fn kind_round_trips_through_encode_decode() {
        let msg = Message::Ack(Ack::ok(1));
        let payload = msg.encode_payload().expect("encode");
        let decoded = Message::decode_payload(msg.kind(), &payload).expect("decode");
        assert_eq!(msg, decoded);
    }

    #[test]
    fn unrecognized_kind_fails_to_decode() {
        let err = Message::decode_payload(0x77, b"{}").expect_err("should reject unknown kind");
        assert!(matches!(err, ProtocolError::UnknownKind { kind: 0x77 }));
    }

    #[test]
    fn heartbeat_encodes_as_empty_object() {
        let payload = Message::Heartbeat.encode_payload().expect("encode");
        assert_eq!(payload, b"{}");
    }
}
