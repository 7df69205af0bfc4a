//! Drag-and-drop payloads.

use serde::{Deserialize, Serialize};
use winrun_core::WindowId;

/// A single file or directory participating in a drag-and-drop transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragFile {
    /// Path as seen by the side that owns the original data (host or guest,
    /// depending on drag direction).
    pub host_path: String,
    /// Path as it should appear once staged guest-side.
    pub guest_path: String,
    /// Size in bytes, used for the per-file and total transfer limits.
    pub file_size: u64,
    /// Whether this entry is a directory rather than a regular file.
    pub is_directory: bool,
}

/// The phase of a drag gesture a [`DragDropEvent`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragEventKind {
    /// The drag entered the window; files should be staged eagerly.
    Enter,
    /// The drag moved within the window; no staging action.
    Move,
    /// The drag left the window without dropping; staging should be cancelled.
    Leave,
    /// Files were dropped; stage (if not already staged) then commit.
    Drop,
}

/// Host forwards a drag-and-drop event targeting a tracked window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragDropEvent {
    /// Window the drag is over.
    pub window_id: WindowId,
    /// Which phase of the gesture this is.
    pub kind: DragEventKind,
    /// The files involved. Populated on `Enter` and `Drop`; empty otherwise.
    pub files: Vec<DragFile>,
    /// Destination directory for `Drop`, if the host specified one.
    pub destination: Option<String>,
}
