//! Agent service composition: the guest-side process that wires
//! C1–C9 behind one dispatch loop and owns `main`.
//!
//! [`driver::AgentDriver`] is the pure decision layer; [`service::AgentService`]
//! is the `tokio` shell that drives it against real queues, a real clock,
//! and the scheduler's own background task. `src/bin/winrun-agent.rs` is
//! the only place both come together with a real configuration file and a
//! logger.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod collaborators;
pub mod config;
pub mod driver;
pub mod error;
pub mod service;

pub use collaborators::{IconExtractor, InputInjector, ProgramLauncher, ShortcutProvider};
pub use config::AgentConfig;
pub use driver::{AgentAction, AgentDriver};
pub use error::AgentError;
pub use service::AgentService;
