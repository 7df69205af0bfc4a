//! Frame-buffer and compressor error types.

use thiserror::Error;

/// Failure modes of [`crate::FrameBuffer::write_frame`]. Both are non-fatal:
/// the scheduler records the matching counter and drops the frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    /// The ring has no free slot (`next write index == read index`).
    #[error("frame buffer full")]
    Full,
    /// The payload does not fit in a single slot.
    #[error("frame of {payload_len} bytes exceeds slot capacity {slot_capacity}")]
    OversizedFrame {
        /// Size of the payload that was rejected.
        payload_len: usize,
        /// Usable bytes per slot (`slot_size - header_size`).
        slot_capacity: usize,
    },
}

/// Failure modes of [`crate::FrameCompressor::decompress`].
#[derive(Debug, Error)]
pub enum CompressorError {
    /// The LZ4 block was truncated or corrupt.
    #[error("failed to decompress frame: {0}")]
    Corrupt(#[from] lz4_flex::block::DecompressError),
}
