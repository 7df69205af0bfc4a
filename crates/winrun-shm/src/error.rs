//! Allocator error types.

use thiserror::Error;

/// Failure modes of the shared-memory allocator.
#[derive(Debug, Error)]
pub enum AllocatorError {
    /// An operation was attempted before `initialize()` succeeded, or after
    /// `close()`.
    #[error("allocator not initialized")]
    NotInitialized,

    /// No free block large enough to satisfy a request. Non-fatal: the
    /// frame buffer falls back to a local heap allocation.
    #[error("out of shared-memory space")]
    OutOfSpace,

    /// The mapping could not be created or grown.
    #[error("shared-memory I/O failure: {0}")]
    Io(#[from] std::io::Error),
}
