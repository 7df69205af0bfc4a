//! JSON payload shapes, one module per concern.
//!
//! Every type here is the decoded body of an [`crate::Envelope`]; the
//! envelope's `kind` byte (an [`crate::Opcode`]) picks which shape a given
//! payload decodes as. See [`crate::message`] for the sum type tying kinds
//! to these shapes.

pub mod clipboard;
pub mod control;
pub mod dragdrop;
pub mod frame;
pub mod provisioning;
pub mod session;
pub mod shortcuts;
pub mod telemetry;

mod input;

pub use clipboard::{ClipboardChanged, ClipboardData, ClipboardFormat};
pub use control::{Ack, CapabilityAnnounce, ErrorReport, IconData, LaunchProgram, RequestIcon, Shutdown};
pub use dragdrop::{DragDropEvent, DragEventKind, DragFile};
pub use frame::{DpiInfo, FrameReady, WindowBufferAllocated, WindowMetadata};
pub use input::{KeyboardInput, MouseAction, MouseButton, MouseInput};
pub use provisioning::{ProvisioningComplete, ProvisioningError, ProvisioningProgress};
pub use session::{CloseSession, ListSessions, SessionList, SessionStateWire, SessionSummary};
pub use shortcuts::{ListShortcuts, ShortcutDescriptor, ShortcutDetected, ShortcutList};
pub use telemetry::{TelemetryReport, TelemetrySnapshot};
