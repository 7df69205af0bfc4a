//! Property-based tests for envelope encoding/decoding.
//!
//! These verify the codec's round-trip contract (invariant: for every
//! successful `try_read`, re-encoding the decoded message reproduces the
//! consumed bytes) across arbitrary messages, not just fixed examples.

use proptest::prelude::*;
use winrun_core::WindowId;
use winrun_proto::payloads::{ClipboardData, ClipboardFormat, FrameReady, LaunchProgram};
use winrun_proto::{Message, encode, try_read};

fn arbitrary_launch_program() -> impl Strategy<Value = Message> {
    (
        any::<u64>(),
        "[a-zA-Z0-9_:\\\\.]{0,32}",
        prop::collection::vec("[a-zA-Z0-9_-]{0,16}", 0..4),
        "[a-zA-Z0-9_:\\\\.]{0,32}",
    )
        .prop_map(|(message_id, path, arguments, working_directory)| {
            Message::LaunchProgram(LaunchProgram { message_id, path, arguments, working_directory })
        })
}

fn arbitrary_clipboard_data() -> impl Strategy<Value = Message> {
    (any::<u64>(), prop::collection::vec(any::<u8>(), 0..256)).prop_map(|(sequence_number, data)| {
        Message::ClipboardData(ClipboardData { sequence_number, format: ClipboardFormat::PlainText, data })
    })
}

fn arbitrary_frame_ready() -> impl Strategy<Value = Message> {
    (any::<u64>(), any::<u32>(), any::<u32>(), any::<bool>()).prop_map(
        |(window_id, slot_index, frame_number, is_key_frame)| {
            Message::FrameReady(FrameReady {
                window_id: WindowId::new(window_id),
                slot_index,
                frame_number,
                is_key_frame,
            })
        },
    )
}

fn arbitrary_message() -> impl Strategy<Value = Message> {
    prop_oneof![arbitrary_launch_program(), arbitrary_clipboard_data(), arbitrary_frame_ready()]
}

proptest! {
    #[test]
    fn try_read_round_trips_arbitrary_messages(msg in arbitrary_message()) {
        let wire = encode(&msg).expect("encode should succeed");

        let (consumed, result) = try_read(&wire);
        prop_assert_eq!(consumed, wire.len());
        let decoded = result.expect("decode should succeed").expect("envelope should be complete");
        prop_assert_eq!(&decoded, &msg);

        // Re-encoding the decoded message reproduces the original wire bytes.
        let re_encoded = encode(&decoded).expect("re-encode should succeed");
        prop_assert_eq!(re_encoded, wire);
    }

    #[test]
    fn try_read_never_consumes_past_a_partial_envelope(
        msg in arbitrary_message(),
        split_fraction in 0u32..100,
    ) {
        let wire = encode(&msg).expect("encode should succeed");
        #[allow(clippy::arithmetic_side_effects)]
        let split = (wire.len() * split_fraction as usize) / 100;

        let (consumed, result) = try_read(&wire[..split]);
        if split < wire.len() {
            prop_assert_eq!(consumed, 0);
            prop_assert_eq!(result.expect("no error on partial read"), None);
        }
    }
}
