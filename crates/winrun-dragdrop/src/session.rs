//! In-memory record of one window's active staging transfer.

use std::path::PathBuf;
use std::time::Instant;

use winrun_core::WindowId;

/// A drag-and-drop transfer currently staged for a window, awaiting commit
/// or cancellation.
#[derive(Debug, Clone)]
pub struct DragSession {
    /// Window the drag targets.
    pub window_id: WindowId,
    /// Fresh subdirectory under the staging root, owned exclusively by this
    /// session.
    pub staging_dir: PathBuf,
    /// Absolute paths of every file or directory materialized under
    /// `staging_dir`.
    pub staged_paths: Vec<PathBuf>,
    /// When staging began, for [`crate::DragDropStaging::cleanup_stale_sessions`].
    pub created_at: Instant,
}
