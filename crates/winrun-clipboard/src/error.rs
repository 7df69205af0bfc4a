//! Error types for clipboard synchronization.

/// Failure placing content on the guest clipboard.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    /// The backend rejected or failed to apply the write.
    #[error("clipboard backend failed: {0}")]
    Backend(String),
}
