//! The framed JSON control protocol between the WinRun guest agent and host.
//!
//! Every message on the duplex channel is an envelope: one `kind` byte, a
//! little-endian `payload_length`, then that many bytes of UTF-8 JSON. See
//! [`envelope::try_read`] and [`envelope::encode`] for the codec, [`Opcode`]
//! for the kind table, and [`Message`] for the decoded sum type.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod error;
pub mod message;
pub mod opcode;
pub mod payloads;

pub use envelope::{encode, try_read};
pub use error::ProtocolError;
pub use message::Message;
pub use opcode::{Direction, Opcode};
pub use payloads::{TelemetryReport, TelemetrySnapshot};
