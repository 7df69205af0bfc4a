//! Memory-mapped free-list allocator backing the guest agent's per-window
//! frame buffers.
//!
//! A single [`ShmAllocator`] owns one memory-mapped file: a fixed header at
//! offset 0 ([`ShmHeader`]) followed by a heap served by a first-fit,
//! offset-sorted, coalescing free list. Every state-mutating call holds one
//! mutex; reads of the base pointer and region size are lock-free once
//! initialized.

#![allow(unsafe_code)]
#![warn(missing_docs)]

mod allocation;
mod allocator;
mod error;
mod freelist;
mod header;

pub use allocation::SharedAllocation;
pub use allocator::{AllocatorConfig, AllocatorStats, ShmAllocator};
pub use error::AllocatorError;
pub use header::ShmHeader;
