//! Sequence-guarded clipboard synchronization.
//!
//! Incoming `set_clipboard` messages carry a strictly-increasing sequence
//! number. A message that does not advance the sequence is stale and is
//! silently accepted without touching the pasteboard, mirroring how the
//! teacher's frame sequencer treats an out-of-order frame as a no-op rather
//! than an error.

use winrun_proto::payloads::{ClipboardChanged, ClipboardData, ClipboardFormat};

use crate::backend::ClipboardBackend;
use crate::error::ClipboardError;

/// Owns the guest-side clipboard sequence state and mediates writes through
/// an injected [`ClipboardBackend`].
pub struct ClipboardSync<B> {
    backend: B,
    last_accepted_sequence: Option<u64>,
    next_outbound_sequence: u64,
    disposed: bool,
}

impl<B: ClipboardBackend> ClipboardSync<B> {
    /// Creates a sync with no messages accepted yet.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            last_accepted_sequence: None,
            next_outbound_sequence: 1,
            disposed: false,
        }
    }

    /// The last sequence number accepted from the host, if any.
    #[must_use]
    pub fn last_accepted_sequence(&self) -> Option<u64> {
        self.last_accepted_sequence
    }

    /// Applies an incoming host-to-guest clipboard push.
    ///
    /// A message whose `sequence_number` does not strictly advance the last
    /// accepted one is treated as stale: it is silently accepted (`Ok(())`,
    /// pasteboard left unchanged) rather than rejected as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ClipboardError`] if the backend rejects a non-stale write.
    /// The sequence counter is only advanced on success.
    pub fn set_clipboard(&mut self, msg: ClipboardData) -> Result<(), ClipboardError> {
        if let Some(last) = self.last_accepted_sequence {
            if msg.sequence_number <= last {
                tracing::debug!(
                    sequence_number = msg.sequence_number,
                    last_accepted = last,
                    "dropping stale clipboard update"
                );
                return Ok(());
            }
        }
        self.backend.write(msg.format, &msg.data)?;
        self.last_accepted_sequence = Some(msg.sequence_number);
        Ok(())
    }

    /// Records a local clipboard change observed on the guest side and
    /// returns the event to propagate upstream, stamped with this sync's own
    /// outbound sequence counter.
    pub fn on_local_change(&mut self, format: ClipboardFormat, data: Vec<u8>) -> ClipboardChanged {
        let sequence_number = self.next_outbound_sequence;
        self.next_outbound_sequence += 1;
        ClipboardChanged {
            sequence_number,
            format,
            data,
        }
    }

    /// Releases backend resources. Idempotent: a second call is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.backend.dispose();
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullClipboardBackend;

    fn sync() -> ClipboardSync<NullClipboardBackend> {
        ClipboardSync::new(NullClipboardBackend::new())
    }

    #[test]
    fn first_message_is_accepted_and_applied() {
        let mut s = sync();
        let result = s.set_clipboard(ClipboardData {
            sequence_number: 1,
            format: ClipboardFormat::PlainText,
            data: b"hello".to_vec(),
        });
        assert!(result.is_ok());
        assert_eq!(s.last_accepted_sequence(), Some(1));
    }

    #[test]
    fn stale_message_is_silently_accepted_without_changing_pasteboard() {
        let mut s = sync();
        s.set_clipboard(ClipboardData {
            sequence_number: 5,
            format: ClipboardFormat::PlainText,
            data: b"fresh".to_vec(),
        })
        .expect("accepted");

        let stale = s.set_clipboard(ClipboardData {
            sequence_number: 5,
            format: ClipboardFormat::PlainText,
            data: b"stale-repeat".to_vec(),
        });
        assert!(stale.is_ok());

        let older = s.set_clipboard(ClipboardData {
            sequence_number: 2,
            format: ClipboardFormat::Html,
            data: b"stale-older".to_vec(),
        });
        assert!(older.is_ok());

        assert_eq!(s.last_accepted_sequence(), Some(5));
        assert_eq!(s.backend.last_write(), Some((ClipboardFormat::PlainText, b"fresh".to_vec())));
    }

    #[test]
    fn monotonically_increasing_sequence_numbers_are_all_accepted() {
        let mut s = sync();
        for seq in [1_u64, 2, 3, 10, 11] {
            let result = s.set_clipboard(ClipboardData {
                sequence_number: seq,
                format: ClipboardFormat::PlainText,
                data: vec![],
            });
            assert!(result.is_ok());
            assert_eq!(s.last_accepted_sequence(), Some(seq));
        }
    }

    #[test]
    fn local_change_produces_strictly_increasing_outbound_sequence_numbers() {
        let mut s = sync();
        let first = s.on_local_change(ClipboardFormat::PlainText, b"a".to_vec());
        let second = s.on_local_change(ClipboardFormat::PlainText, b"b".to_vec());
        assert!(second.sequence_number > first.sequence_number);
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut s = sync();
        s.dispose();
        s.dispose();
    }
}
