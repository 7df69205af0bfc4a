//! Shared foundation types for the WinRun guest agent.
//!
//! This crate holds the pieces every other component crate depends on:
//! the [`Environment`] abstraction for deterministic time/randomness, the
//! opaque [`WindowId`] handle, and the protocol version/capability flags
//! announced during capability exchange.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cancellation;
pub mod capabilities;
pub mod env;
pub mod window;

pub use cancellation::CancellationToken;
pub use capabilities::{Capabilities, ProtocolVersion};
pub use env::{Environment, ManualEnvironment, SystemEnvironment};
pub use window::WindowId;
