//! Error types for drag-and-drop staging.

use winrun_core::WindowId;

/// Pure input-validation failures for a proposed file transfer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// No files were offered.
    #[error("no files provided")]
    Empty,
    /// A file's source path was empty.
    #[error("file at index {index} has an empty host path")]
    EmptyHostPath {
        /// Index into the offered file list.
        index: usize,
    },
    /// A file's path attempts to traverse outside the staging root.
    #[error("file at index {index} path traverses outside the staging root")]
    PathTraversal {
        /// Index into the offered file list.
        index: usize,
    },
    /// A single file exceeds the per-file size limit.
    #[error("file at index {index} exceeds the per-file size limit ({size} > {limit} bytes)")]
    FileTooLarge {
        /// Index into the offered file list.
        index: usize,
        /// The file's reported size.
        size: u64,
        /// The configured per-file limit.
        limit: u64,
    },
    /// The combined size of all files exceeds the total transfer limit.
    #[error("total transfer size exceeds the limit ({total} > {limit} bytes)")]
    TotalTooLarge {
        /// Sum of all offered file sizes.
        total: u64,
        /// The configured total limit.
        limit: u64,
    },
}

/// Failures from staging, committing, or cancelling a drag-and-drop
/// transfer.
#[derive(Debug, thiserror::Error)]
pub enum DragDropError {
    /// The offered file list failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A filesystem operation failed while staging or committing.
    #[error("staging I/O failed: {0}")]
    Io(String),
    /// `commit_drop` or `cancel_drag` referenced a window with no active
    /// staging session.
    #[error("no staging session for window {0}")]
    NoStagingSession(WindowId),
}
