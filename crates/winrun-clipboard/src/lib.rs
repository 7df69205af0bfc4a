//! Clipboard synchronization: sequence-guarded propagation of clipboard
//! content between host and guest.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod sync;

pub use backend::{ClipboardBackend, NullClipboardBackend};
pub use error::ClipboardError;
pub use sync::ClipboardSync;
