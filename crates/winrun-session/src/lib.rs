//! Session lifecycle tracking: a pure, action-based state machine for
//! guest process sessions, plus heartbeat generation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod heartbeat;
mod manager;
mod session;

pub use heartbeat::{Heartbeat, NullSystemStats, SystemStats};
pub use manager::{SessionAction, SessionManager, SessionManagerConfig};
pub use session::{Session, SessionState};
