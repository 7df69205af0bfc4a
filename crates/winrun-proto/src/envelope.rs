//! Envelope framing: the 5-byte header plus JSON payload that wraps every
//! [`Message`] on the wire.
//!
//! The codec is pure: no I/O, no shared state, nothing that blocks. Callers
//! own buffering and retry; this module only ever looks at the bytes it is
//! given.

use crate::Message;
use crate::error::ProtocolError;

/// Minimum bytes needed to read the envelope header (`kind` + `payload_length`).
pub const HEADER_LEN: usize = 5;

/// Attempts to parse one envelope from the front of `buffer`.
///
/// Returns `(0, Ok(None))` when `buffer` does not yet hold a complete
/// envelope (fewer than [`HEADER_LEN`] bytes, or fewer than `payload_length`
/// bytes of payload) — the caller should read more and try again.
///
/// On a complete envelope, returns `(consumed, result)` where `consumed` is
/// always `HEADER_LEN + payload_length`, regardless of whether `result` is
/// `Ok` or `Err`. This lets the caller advance past a malformed or
/// unrecognized envelope without losing framing sync, per the component's
/// "drop the offending envelope and continue" recovery policy.
#[must_use]
pub fn try_read(buffer: &[u8]) -> (usize, Result<Option<Message>, ProtocolError>) {
    if buffer.len() < HEADER_LEN {
        return (0, Ok(None));
    }

    let kind = buffer[0];
    #[allow(clippy::unwrap_used)]
    let payload_length = u32::from_le_bytes(buffer[1..5].try_into().unwrap()) as usize;
    let total_len = HEADER_LEN + payload_length;

    if buffer.len() < total_len {
        return (0, Ok(None));
    }

    let payload = &buffer[HEADER_LEN..total_len];
    (total_len, Message::decode_payload(kind, payload))
}

/// Serializes `message` into its wire form: `kind` byte, little-endian
/// `payload_length`, then the JSON payload bytes.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedPayload`] if the payload fails to
/// serialize to JSON. In practice this only happens for payload types with a
/// custom, fallible `Serialize` impl; the generated derives used throughout
/// this crate never fail.
pub fn encode(message: &Message) -> Result<Vec<u8>, ProtocolError> {
    let kind = message.kind();
    let payload = message
        .encode_payload()
        .map_err(|source| ProtocolError::MalformedPayload { kind, source })?;

    #[allow(clippy::unwrap_used)]
    let payload_length = u32::try_from(payload.len()).unwrap();

    let mut wire = Vec::with_capacity(HEADER_LEN + payload.len());
    wire.push(kind);
    wire.extend_from_slice(&payload_length.to_le_bytes());
    wire.extend_from_slice(&payload);
    Ok(wire)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::payloads::{Ack, LaunchProgram};

    #[test]
    fn short_buffer_reads_nothing() {
        let (consumed, result) = try_read(&[0x8F, 0x00]);
        assert_eq!(consumed, 0);
        assert_eq!(result.expect("no error on short read"), None);
    }

    #[test]
    fn incomplete_payload_reads_nothing() {
        let msg = Message::Ack(Ack::ok(1));
        let wire = encode(&msg).expect("encode");
        let (consumed, result) = try_read(&wire[..wire.len() - 1]);
        assert_eq!(consumed, 0);
        assert_eq!(result.expect("no error on short read"), None);
    }

    #[test]
    fn round_trips_a_known_message() {
        let msg = Message::Ack(Ack::ok(7));
        let wire = encode(&msg).expect("encode");
        let (consumed, result) = try_read(&wire);
        assert_eq!(consumed, wire.len());
        assert_eq!(result.expect("decode"), Some(msg));
    }

    #[test]
    fn unknown_kind_consumes_envelope_and_errors() {
        let mut wire = vec![0x77u8];
        wire.extend_from_slice(&2u32.to_le_bytes());
        wire.extend_from_slice(b"{}");
        let (consumed, result) = try_read(&wire);
        assert_eq!(consumed, wire.len());
        assert!(matches!(result, Err(ProtocolError::UnknownKind { kind: 0x77 })));
    }

    #[test]
    fn malformed_json_consumes_envelope_and_errors() {
        let mut wire = vec![Message::Ack(Ack::ok(1)).kind()];
        wire.extend_from_slice(&3u32.to_le_bytes());
        wire.extend_from_slice(b"not");
        let (consumed, result) = try_read(&wire);
        assert_eq!(consumed, wire.len());
        assert!(matches!(result, Err(ProtocolError::MalformedPayload { .. })));
    }

    /// Scenario S1: chunked delivery of a `LaunchProgram` envelope only
    /// yields a decoded message once the whole envelope has arrived.
    #[test]
    fn launch_program_framing_is_chunk_tolerant() {
        let msg = Message::LaunchProgram(LaunchProgram {
            message_id: 42,
            path: "C:\\App.exe".into(),
            arguments: vec!["--x".into()],
            working_directory: "C:\\".into(),
        });
        let wire = encode(&msg).expect("encode");
        assert!(wire.len() > 7, "fixture should exercise all three chunk boundaries");

        let (consumed, result) = try_read(&wire[..3]);
        assert_eq!((consumed, result.expect("no error")), (0, None));

        let (consumed, result) = try_read(&wire[..7]);
        assert_eq!((consumed, result.expect("no error")), (0, None));

        let (consumed, result) = try_read(&wire);
        assert_eq!(consumed, wire.len());
        let Some(Message::LaunchProgram(decoded)) = result.expect("decode") else {
            panic!("expected LaunchProgram");
        };
        assert_eq!(decoded.message_id, 42);
    }

    proptest! {
        #[test]
        fn ack_round_trips_for_arbitrary_ids(message_id in any::<u64>(), success in any::<bool>()) {
            let msg = if success {
                Message::Ack(Ack::ok(message_id))
            } else {
                Message::Ack(Ack::failed(message_id, "reason"))
            };
            let wire = encode(&msg).expect("encode");
            let (consumed, result) = try_read(&wire);
            prop_assert_eq!(consumed, wire.len());
            prop_assert_eq!(result.expect("decode"), Some(msg));
        }
    }
}
