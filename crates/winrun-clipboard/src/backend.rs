//! Platform clipboard access, injected the same way capture and system
//! statistics are injected elsewhere in this workspace: reading and writing
//! the real OS pasteboard is platform-specific and out of scope here.

use std::sync::Mutex;

use winrun_proto::payloads::ClipboardFormat;

use crate::error::ClipboardError;

/// Applies clipboard writes to the guest OS.
pub trait ClipboardBackend: Send + Sync {
    /// Places `data` on the guest clipboard in the given format.
    ///
    /// # Errors
    ///
    /// Returns [`ClipboardError::Backend`] if the platform clipboard API
    /// rejects the write.
    fn write(&self, format: ClipboardFormat, data: &[u8]) -> Result<(), ClipboardError>;

    /// Releases any backend resources. Called at most meaningfully once;
    /// implementations should tolerate repeat calls.
    fn dispose(&self) {}
}

/// A [`ClipboardBackend`] that records the last write it was asked to make,
/// for use in tests and wherever no real pasteboard is available yet.
#[derive(Debug, Default)]
pub struct NullClipboardBackend {
    last_write: Mutex<Option<(ClipboardFormat, Vec<u8>)>>,
}

impl NullClipboardBackend {
    /// Creates a backend with no recorded writes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the most recent write this backend accepted, if any.
    #[must_use]
    pub fn last_write(&self) -> Option<(ClipboardFormat, Vec<u8>)> {
        #[allow(clippy::unwrap_used)]
        self.last_write.lock().unwrap().clone()
    }
}

impl ClipboardBackend for NullClipboardBackend {
    fn write(&self, format: ClipboardFormat, data: &[u8]) -> Result<(), ClipboardError> {
        #[allow(clippy::unwrap_used)]
        let mut last = self.last_write.lock().unwrap();
        *last = Some((format, data.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_backend_records_writes() {
        let backend = NullClipboardBackend::new();
        assert!(backend.last_write().is_none());
        backend.write(ClipboardFormat::PlainText, b"hi").expect("write");
        assert_eq!(backend.last_write(), Some((ClipboardFormat::PlainText, b"hi".to_vec())));
    }
}
