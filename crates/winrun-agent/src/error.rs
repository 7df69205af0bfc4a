//! Error types for the agent service composition.

use thiserror::Error;

use winrun_clipboard::ClipboardError;
use winrun_dragdrop::DragDropError;

/// Failure surfaced by [`crate::AgentDriver`] or [`crate::AgentService`].
#[derive(Debug, Error)]
pub enum AgentError {
    /// A clipboard write failed.
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    /// A drag-and-drop operation failed.
    #[error(transparent)]
    DragDrop(#[from] DragDropError),

    /// The shared-memory allocator failed to initialize.
    #[error("shared memory allocator failed to initialize at {path}")]
    SharedMemoryInit {
        /// Path the allocator tried to back onto.
        path: String,
    },

    /// `AgentConfig` could not be parsed.
    #[error("failed to parse agent configuration: {0}")]
    Config(String),

    /// The outbound queue closed while the service was still running.
    #[error("outbound queue closed")]
    OutboundClosed,

    /// `AgentService::run` was called a second time on the same service.
    #[error("agent service is already running")]
    AlreadyRunning,
}
