//! Protocol-layer error types.

use thiserror::Error;

/// Failure modes of the envelope codec.
///
/// Recovery is always the same at the call site: drop the offending
/// envelope, increment `message_processing_errors`, and continue reading.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The payload did not decode as the JSON shape registered for its kind.
    #[error("malformed payload for kind {kind:#04x}: {source}")]
    MalformedPayload {
        /// The opcode byte the envelope claimed.
        kind: u8,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The envelope's `kind` byte does not name a known opcode.
    #[error("unknown message kind {kind:#04x}")]
    UnknownKind {
        /// The unrecognized opcode byte.
        kind: u8,
    },

    /// Fewer than 5 bytes were available to even read the envelope header.
    #[error("truncated envelope: need at least 5 bytes, have {available}")]
    TruncatedEnvelope {
        /// Bytes actually available.
        available: usize,
    },
}

/// Convenience alias for protocol-layer results.
pub type Result<T> = std::result::Result<T, ProtocolError>;
