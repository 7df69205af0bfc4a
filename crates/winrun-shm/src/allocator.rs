//! The memory-mapped, free-list-backed shared allocator.

#![allow(unsafe_code)]

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicPtr, AtomicU64, Ordering};

use memmap2::MmapMut;

use crate::allocation::SharedAllocation;
use crate::error::AllocatorError;
use crate::freelist::{FreeList, round_up_16};
use crate::header::ShmHeader;

/// Configuration consumed at `initialize()`.
#[derive(Debug, Clone)]
pub struct AllocatorConfig {
    /// Path to the backing file.
    pub path: PathBuf,
    /// Whether to create the file (zero-extended) if it does not exist.
    pub create_if_not_exists: bool,
    /// Size to create the file at, if it must be created.
    pub create_size_bytes: u64,
    /// Floor on the mapped region size regardless of the file's existing length.
    pub minimum_size_bytes: u64,
}

/// Point-in-time snapshot of allocator occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Total mapped region size, including the header.
    pub total: u64,
    /// Free bytes in the heap.
    pub free: u64,
    /// Allocated bytes in the heap (`total - header - free`).
    pub used: u64,
    /// Number of distinct free blocks.
    pub free_block_count: usize,
    /// Whether the allocator is currently initialized.
    pub is_initialized: bool,
}

struct MappedState {
    mmap: MmapMut,
    free_list: FreeList,
}

/// A first-fit-on-offset-order free-list allocator over a memory-mapped file.
///
/// All state-mutating operations (`initialize`, `allocate`, `free`, `close`)
/// hold a single mutex. `offset_to_pointer` and `pointer_to_offset` read the
/// base pointer and region size from atomics and need no lock once
/// initialized, per the single-writer/many-readers concurrency model this
/// allocator is designed into.
pub struct ShmAllocator {
    base_ptr: AtomicPtr<u8>,
    region_size: AtomicU64,
    state: Mutex<Option<MappedState>>,
}

impl ShmAllocator {
    /// Creates an uninitialized allocator. Call [`Self::initialize`] before
    /// using it.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_ptr: AtomicPtr::new(std::ptr::null_mut()),
            region_size: AtomicU64::new(0),
            state: Mutex::new(None),
        }
    }

    /// Maps the backing file, parses or writes the header, and resets the
    /// heap to a single free block. Returns `false` on any I/O failure,
    /// leaving the allocator uninitialized.
    pub fn initialize(&self, config: &AllocatorConfig) -> bool {
        match self.try_initialize(config) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, path = %config.path.display(), "shm allocator initialize failed");
                false
            }
        }
    }

    fn try_initialize(&self, config: &AllocatorConfig) -> Result<(), AllocatorError> {
        let target_size = config.create_size_bytes.max(config.minimum_size_bytes).max(ShmHeader::SIZE as u64);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(config.create_if_not_exists)
            .open(&config.path)?;
        let existing_len = file.metadata()?.len();
        if existing_len < target_size {
            file.set_len(target_size)?;
        }
        let region_size = existing_len.max(target_size);

        // SAFETY: the file is exclusively ours for the lifetime of the
        // mapping; other processes touching it concurrently is a deployment
        // hazard outside this allocator's control, same as any mmap-backed IPC.
        let mut mmap = unsafe { MmapMut::map_mut(&file)? };

        let header = ShmHeader::parse(&mmap[..ShmHeader::SIZE]).unwrap_or(ShmHeader::new(region_size));
        mmap[..ShmHeader::SIZE].copy_from_slice(&ShmHeader::new(header.region_size().max(region_size)).to_bytes());

        let heap_start = ShmHeader::SIZE as u64;
        let free_list = FreeList::new_single_block(heap_start, region_size);

        let base = mmap.as_mut_ptr();
        let mut guard = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(MappedState { mmap, free_list });
        drop(guard);

        self.base_ptr.store(base, Ordering::Release);
        self.region_size.store(region_size, Ordering::Release);
        Ok(())
    }

    /// Requests `size` bytes. Returns [`SharedAllocation::INVALID`] if
    /// uninitialized, `size == 0`, or no free block is large enough. Never
    /// blocks.
    pub fn allocate(&self, size: u64) -> SharedAllocation {
        if size == 0 {
            return SharedAllocation::INVALID;
        }
        let rounded = round_up_16(size);

        let mut guard = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(mapped) = guard.as_mut() else {
            return SharedAllocation::INVALID;
        };

        let Some(offset) = mapped.free_list.allocate(rounded) else {
            return SharedAllocation::INVALID;
        };

        // SAFETY: `offset` was just carved out of this mapping's own heap by
        // the free list above, so it lies within `mmap`'s allocated length.
        let pointer = unsafe { mapped.mmap.as_mut_ptr().add(offset as usize) };
        SharedAllocation { offset, size: rounded, pointer }
    }

    /// Returns `allocation` to the free list, coalescing with touching
    /// neighbours. A no-op on [`SharedAllocation::INVALID`]. A double free
    /// (offset already free) is detected, logged, and ignored.
    pub fn free(&self, allocation: SharedAllocation) {
        if !allocation.is_valid() {
            return;
        }

        let mut guard = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(mapped) = guard.as_mut() else {
            return;
        };

        if mapped.free_list.contains_offset(allocation.offset) {
            tracing::warn!(offset = allocation.offset, "double free detected, ignoring");
            return;
        }

        if !mapped.free_list.free(allocation.offset, allocation.size) {
            tracing::warn!(offset = allocation.offset, "free() overlaps a live region, ignoring");
        }
    }

    /// Computes the address of `offset` within the current mapping, if
    /// initialized and in range.
    #[must_use]
    pub fn offset_to_pointer(&self, offset: u64) -> Option<*mut u8> {
        let base = self.base_ptr.load(Ordering::Acquire);
        if base.is_null() || offset >= self.region_size.load(Ordering::Acquire) {
            return None;
        }
        // SAFETY: `offset` was bounds-checked against `region_size` above,
        // and `base` addresses a mapping of exactly that length.
        Some(unsafe { base.add(offset as usize) })
    }

    /// Computes the offset of `ptr` within the current mapping, if
    /// initialized and `ptr` actually falls inside it.
    #[must_use]
    pub fn pointer_to_offset(&self, ptr: *mut u8) -> Option<u64> {
        let base = self.base_ptr.load(Ordering::Acquire);
        let region_size = self.region_size.load(Ordering::Acquire);
        if base.is_null() {
            return None;
        }
        // SAFETY: both pointers are derived from the same mapping's
        // allocation when `ptr` actually belongs to it; the offset_from
        // result is only trusted after the following bounds check.
        let delta = unsafe { ptr.offset_from(base) };
        if delta < 0 || delta as u64 >= region_size {
            return None;
        }
        Some(delta as u64)
    }

    /// A point-in-time snapshot of occupancy.
    #[must_use]
    pub fn stats(&self) -> AllocatorStats {
        let guard = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(mapped) = guard.as_ref() else {
            return AllocatorStats { total: 0, free: 0, used: 0, free_block_count: 0, is_initialized: false };
        };

        let total = self.region_size.load(Ordering::Acquire);
        let free = mapped.free_list.total_free();
        let used = total.saturating_sub(free).saturating_sub(ShmHeader::SIZE as u64);
        AllocatorStats {
            total,
            free,
            used,
            free_block_count: mapped.free_list.blocks().len(),
            is_initialized: true,
        }
    }

    /// Unmaps the backing file. Every subsequent call behaves as
    /// uninitialized: `allocate` returns invalid, `free` and `offset_to_pointer`
    /// are no-ops, `stats().is_initialized` is `false`.
    pub fn close(&self) {
        let mut guard = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = None;
        drop(guard);
        self.base_ptr.store(std::ptr::null_mut(), Ordering::Release);
        self.region_size.store(0, Ordering::Release);
    }
}

impl Default for ShmAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &tempfile::TempDir, size: u64) -> AllocatorConfig {
        AllocatorConfig {
            path: dir.path().join("winrun-framebuffer"),
            create_if_not_exists: true,
            create_size_bytes: size,
            minimum_size_bytes: size,
        }
    }

    #[test]
    fn allocate_before_initialize_is_invalid() {
        let allocator = ShmAllocator::new();
        assert!(!allocator.allocate(1024).is_valid());
    }

    #[test]
    fn zero_size_allocation_is_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let allocator = ShmAllocator::new();
        assert!(allocator.initialize(&config(&dir, 1 << 20)));
        assert!(!allocator.allocate(0).is_valid());
    }

    /// Scenario S4: allocate/free/allocate reuses the freed offset.
    #[test]
    fn allocate_reuses_freed_block() {
        let dir = tempfile::tempdir().expect("tempdir");
        let allocator = ShmAllocator::new();
        assert!(allocator.initialize(&config(&dir, 1 << 20)));

        let a = allocator.allocate(1024);
        let b = allocator.allocate(1024);
        assert_ne!(a.offset, b.offset);

        allocator.free(a);
        let c = allocator.allocate(1024);
        assert_eq!(c.offset, a.offset);
    }

    #[test]
    fn free_plus_used_plus_header_equals_region_size() {
        let dir = tempfile::tempdir().expect("tempdir");
        let allocator = ShmAllocator::new();
        assert!(allocator.initialize(&config(&dir, 1 << 20)));

        let a = allocator.allocate(1024);
        let _b = allocator.allocate(2048);
        allocator.free(a);

        let stats = allocator.stats();
        assert_eq!(stats.free + stats.used + ShmHeader::SIZE as u64, stats.total);
    }

    #[test]
    fn offset_to_pointer_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let allocator = ShmAllocator::new();
        assert!(allocator.initialize(&config(&dir, 1 << 20)));

        let a = allocator.allocate(1024);
        let ptr = allocator.offset_to_pointer(a.offset).expect("in range");
        assert_eq!(ptr, a.pointer);
        assert_eq!(allocator.pointer_to_offset(ptr), Some(a.offset));
    }

    #[test]
    fn double_free_is_ignored_not_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let allocator = ShmAllocator::new();
        assert!(allocator.initialize(&config(&dir, 1 << 20)));

        let a = allocator.allocate(1024);
        allocator.free(a);
        allocator.free(a);

        let stats = allocator.stats();
        assert!(stats.free_block_count >= 1);
    }

    #[test]
    fn post_close_allocate_returns_invalid_never_panics() {
        let dir = tempfile::tempdir().expect("tempdir");
        let allocator = ShmAllocator::new();
        assert!(allocator.initialize(&config(&dir, 1 << 20)));
        allocator.close();

        assert!(!allocator.allocate(1024).is_valid());
        assert!(!allocator.stats().is_initialized);
        assert!(allocator.offset_to_pointer(16).is_none());
    }
}
