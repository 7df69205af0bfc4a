//! Clipboard synchronization payloads.

use serde::{Deserialize, Serialize};

/// Clipboard content format, drawn from the shared protocol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipboardFormat {
    /// Plain UTF-8 text.
    PlainText,
    /// Rich Text Format.
    Rtf,
    /// HTML fragment.
    Html,
    /// PNG-encoded image.
    Png,
    /// TIFF-encoded image.
    Tiff,
    /// A `file://` URI list.
    FileUrl,
}

/// Host pushes clipboard content down to the guest, or the guest reports a
/// local change upstream.
///
/// Carries a monotonically-increasing `sequence_number`; the receiver
/// discards any message whose sequence number is less than or equal to the
/// last one it accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardData {
    /// Strictly increasing per sender; used for stale-message rejection.
    pub sequence_number: u64,
    /// The format of `data`.
    pub format: ClipboardFormat,
    /// The clipboard payload itself.
    pub data: Vec<u8>,
}

/// Guest reports that it observed a local clipboard change to propagate
/// upstream. Same shape as [`ClipboardData`]; kept distinct so dispatch can
/// route by direction without inspecting the payload.
pub type ClipboardChanged = ClipboardData;
