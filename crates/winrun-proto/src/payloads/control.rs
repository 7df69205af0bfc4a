//! Program launch, icon, capability exchange, and generic acknowledgement payloads.

use serde::{Deserialize, Serialize};
use winrun_core::{Capabilities, ProtocolVersion};

/// Host asks the guest to launch a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchProgram {
    /// Correlates the eventual [`Ack`] with this request.
    pub message_id: u64,
    /// Path to the executable, guest-side.
    pub path: String,
    /// Command-line arguments, in order.
    pub arguments: Vec<String>,
    /// Working directory for the new process.
    pub working_directory: String,
}

/// Host asks the guest for an executable's icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestIcon {
    /// Correlates the eventual [`IconData`] response.
    pub message_id: u64,
    /// Path to the executable whose icon is requested.
    pub path: String,
}

/// Guest returns requested icon data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconData {
    /// Echoes the originating [`RequestIcon::message_id`].
    pub message_id: u64,
    /// PNG-encoded icon bytes, or absent if extraction failed.
    pub png_bytes: Option<Vec<u8>>,
}

/// Host asks the guest agent to shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shutdown {
    /// Correlates the eventual [`Ack`] with this request.
    pub message_id: u64,
}

/// Guest announces its protocol version and capability flags.
///
/// Sent once, unsolicited, immediately after the channel is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityAnnounce {
    /// The protocol version implemented by the sending guest.
    pub version: ProtocolVersion,
    /// The capability flags enabled in the current build.
    pub capabilities: Capabilities,
}

/// Guest acknowledges a host request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Echoes the originating request's `message_id`.
    pub message_id: u64,
    /// Whether the request succeeded.
    pub success: bool,
    /// Human-readable failure detail, present iff `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Ack {
    /// Builds a successful acknowledgement.
    #[must_use]
    pub fn ok(message_id: u64) -> Self {
        Self { message_id, success: true, error_message: None }
    }

    /// Builds a failed acknowledgement carrying `reason`.
    #[must_use]
    pub fn failed(message_id: u64, reason: impl Into<String>) -> Self {
        Self { message_id, success: false, error_message: Some(reason.into()) }
    }
}

/// Guest reports a non-fatal processing error unrelated to a specific request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Human-readable description, e.g. `"unknown message kind"`.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_ok_has_no_error_message() {
        let ack = Ack::ok(7);
        assert!(ack.success);
        assert!(ack.error_message.is_none());
    }

    #[test]
    fn ack_failed_carries_reason() {
        let ack = Ack::failed(7, "no such session");
        assert!(!ack.success);
        assert_eq!(ack.error_message.as_deref(), Some("no such session"));
    }
}
