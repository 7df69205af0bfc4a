//! Drag-and-drop staging: path validation, per-transfer staging
//! directories, and commit/cancel of files moving between host and guest.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod session;
mod staging;
mod validate;

pub use config::DragDropConfig;
pub use error::{DragDropError, ValidationError};
pub use session::DragSession;
pub use staging::{DragDropOutcome, DragDropStaging, StageResult};
pub use validate::{sanitize_filename, validate_paths};
