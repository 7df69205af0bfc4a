//! Per-window slot ring: allocation, write/advance, and disposal.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use winrun_shm::ShmAllocator;

use crate::error::BufferError;
use crate::mode::BufferMode;
use crate::slot_header::{FrameSlotHeader, HEADER_SIZE};

/// Tuning for one [`FrameBuffer`].
#[derive(Debug, Clone)]
pub struct FrameBufferConfig {
    /// Number of slots in the ring. Default 3.
    pub slots_per_window: usize,
    /// How slot size is derived from frame dimensions/payload size.
    pub mode: BufferMode,
    /// Minimum frames between tranche downsizes, to avoid oscillation.
    pub shrink_grace_frames: u32,
}

impl Default for FrameBufferConfig {
    fn default() -> Self {
        Self {
            slots_per_window: 3,
            mode: BufferMode::Uncompressed { bytes_per_pixel: 4, headroom: 1.0 },
            shrink_grace_frames: 30,
        }
    }
}

enum Backing {
    Shared(winrun_shm::SharedAllocation),
    Local(Vec<u8>),
}

impl Backing {
    fn as_mut_slice(&mut self, len: usize) -> &mut [u8] {
        match self {
            // SAFETY: `pointer` addresses `size` live bytes in the
            // allocator's mapping for as long as this allocation is held;
            // `len` is always <= the allocation's own size.
            Backing::Shared(alloc) => unsafe { std::slice::from_raw_parts_mut(alloc.pointer, len) },
            Backing::Local(bytes) => &mut bytes[..len],
        }
    }
}

/// A contiguous region of `slots_per_window` fixed-size slots backing one
/// window's captured frames, served either from shared memory or, on
/// allocation failure, a local heap fallback.
pub struct FrameBuffer {
    window_id: u64,
    config: FrameBufferConfig,
    allocator: Arc<ShmAllocator>,
    backing: Option<Backing>,
    slot_size: u64,
    width: u32,
    height: u32,
    write_index: AtomicUsize,
    read_index: AtomicUsize,
    frames_since_shrink: u32,
    uses_shared_memory: bool,
}

impl FrameBuffer {
    /// Builds an unallocated buffer for `window_id`. No backing storage
    /// exists until [`FrameBuffer::ensure_allocated`] succeeds.
    #[must_use]
    pub fn new(window_id: u64, config: FrameBufferConfig, allocator: Arc<ShmAllocator>) -> Self {
        Self {
            window_id,
            config,
            allocator,
            backing: None,
            slot_size: 0,
            width: 0,
            height: 0,
            write_index: AtomicUsize::new(0),
            read_index: AtomicUsize::new(0),
            frames_since_shrink: 0,
            uses_shared_memory: false,
        }
    }

    /// Whether this buffer currently has backing storage.
    #[must_use]
    pub fn is_allocated(&self) -> bool {
        self.backing.is_some()
    }

    /// Whether the current backing storage is the shared-memory mapping
    /// (as opposed to the local-heap fallback).
    #[must_use]
    pub fn uses_shared_memory(&self) -> bool {
        self.uses_shared_memory
    }

    /// Usable payload bytes per slot (`slot_size - header_size`).
    #[must_use]
    pub fn slot_capacity(&self) -> usize {
        (self.slot_size as usize).saturating_sub(HEADER_SIZE)
    }

    /// Byte offset into the shared-memory region of this buffer's backing
    /// allocation, or `None` when unallocated or using the local fallback.
    #[must_use]
    pub fn shared_memory_offset(&self) -> Option<u64> {
        match &self.backing {
            Some(Backing::Shared(alloc)) => Some(alloc.offset),
            _ => None,
        }
    }

    /// Total backing size in bytes (`slots_per_window * slot_size`).
    #[must_use]
    pub fn buffer_size(&self) -> u64 {
        self.slot_size * self.config.slots_per_window as u64
    }

    /// Number of slots in this buffer's ring.
    #[must_use]
    pub fn slots_per_window(&self) -> usize {
        self.config.slots_per_window
    }

    /// Size of a single slot in bytes, header included.
    #[must_use]
    pub fn slot_size(&self) -> u64 {
        self.slot_size
    }

    /// Ensures this buffer has storage sized for a `width`x`height` frame
    /// whose payload is expected to be `expected_payload_len` bytes.
    /// Returns `true` iff a (re)allocation occurred.
    ///
    /// Reallocation frees any prior backing, requests fresh storage from the
    /// shared allocator, and falls back to a local heap buffer of the same
    /// size if the shared allocator cannot satisfy the request.
    pub fn ensure_allocated(&mut self, width: u32, height: u32, expected_payload_len: u64) -> bool {
        let Some(candidate_slot_size) = self.config.mode.slot_size_for(width, height, expected_payload_len) else {
            return false;
        };

        let dims_changed = width != self.width || height != self.height;
        let needs_growth = candidate_slot_size > self.slot_size;
        let needs_initial_allocation = self.backing.is_none();

        let should_reallocate = match &self.config.mode {
            BufferMode::Uncompressed { .. } => needs_initial_allocation || dims_changed,
            BufferMode::Compressed { .. } => {
                if needs_initial_allocation || needs_growth {
                    true
                } else if candidate_slot_size < self.slot_size {
                    self.frames_since_shrink >= self.config.shrink_grace_frames
                } else {
                    false
                }
            }
        };

        if !should_reallocate {
            self.frames_since_shrink += 1;
            return false;
        }

        self.release_backing();

        let total_size = candidate_slot_size * self.config.slots_per_window as u64;
        let allocation = self.allocator.allocate(total_size);
        if allocation.is_valid() {
            self.backing = Some(Backing::Shared(allocation));
            self.uses_shared_memory = true;
        } else {
            self.backing = Some(Backing::Local(vec![0u8; total_size as usize]));
            self.uses_shared_memory = false;
        }

        self.slot_size = candidate_slot_size;
        self.width = width;
        self.height = height;
        self.write_index.store(0, Ordering::Relaxed);
        self.read_index.store(0, Ordering::Relaxed);
        self.frames_since_shrink = 0;
        true
    }

    /// Writes `header` and `payload` into the next slot. Returns the slot
    /// index written, [`BufferError::Full`] if the ring has no free slot, or
    /// [`BufferError::OversizedFrame`] if the payload does not fit a slot.
    pub fn write_frame(&mut self, mut header: FrameSlotHeader, payload: &[u8]) -> Result<usize, BufferError> {
        let capacity = self.slot_capacity();
        if payload.len() > capacity {
            return Err(BufferError::OversizedFrame { payload_len: payload.len(), slot_capacity: capacity });
        }

        let write_index = self.write_index.load(Ordering::Relaxed);
        let slots = self.config.slots_per_window;
        let next = (write_index + 1) % slots;
        if next == self.read_index.load(Ordering::Acquire) {
            return Err(BufferError::Full);
        }

        header.data_size = payload.len() as u32;
        let slot_size = self.slot_size as usize;
        let slot_start = write_index * slot_size;

        let Some(backing) = self.backing.as_mut() else {
            return Err(BufferError::Full);
        };
        let region = backing.as_mut_slice((slots * slot_size).max(slot_start + slot_size));
        let slot = &mut region[slot_start..slot_start + slot_size];
        slot[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
        slot[HEADER_SIZE..HEADER_SIZE + payload.len()].copy_from_slice(payload);

        // Release: the slot's bytes must be visible to any reader that
        // observes the new write_index.
        self.write_index.store(next, Ordering::Release);
        Ok(write_index)
    }

    /// Advances `read_index` by one slot. Exposed for tests; in production
    /// the host advances the consumer side through the shared mapping.
    pub fn advance_read_index(&self) {
        let slots = self.config.slots_per_window;
        self.read_index.fetch_update(Ordering::AcqRel, Ordering::Acquire, |idx| Some((idx + 1) % slots)).ok();
    }

    /// Current write index, for diagnostics and tests.
    #[must_use]
    pub fn write_index(&self) -> usize {
        self.write_index.load(Ordering::Acquire)
    }

    /// Current read index, for diagnostics and tests.
    #[must_use]
    pub fn read_index(&self) -> usize {
        self.read_index.load(Ordering::Acquire)
    }

    /// Window this buffer serves.
    #[must_use]
    pub fn window_id(&self) -> u64 {
        self.window_id
    }

    fn release_backing(&mut self) {
        if let Some(Backing::Shared(allocation)) = self.backing.take() {
            self.allocator.free(allocation);
        }
    }

    /// Frees the backing allocation and marks this buffer unallocated.
    pub fn dispose(&mut self) {
        self.release_backing();
        self.slot_size = 0;
        self.width = 0;
        self.height = 0;
        self.uses_shared_memory = false;
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        self.release_backing();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use winrun_shm::AllocatorConfig;

    /// Returns the allocator alongside its backing `TempDir`; callers must
    /// keep the directory bound for as long as the allocator is in use.
    fn allocator() -> (Arc<ShmAllocator>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let allocator = ShmAllocator::new();
        let initialized = allocator.initialize(&AllocatorConfig {
            path: dir.path().join("frames.shm"),
            create_if_not_exists: true,
            create_size_bytes: 64 * (1 << 20),
            minimum_size_bytes: 0,
        });
        assert!(initialized);
        (Arc::new(allocator), dir)
    }

    fn sample_header(frame_number: u32) -> FrameSlotHeader {
        FrameSlotHeader::new(1, frame_number, 1, 1, 1, 0, 0, false, frame_number == 1)
    }

    /// Scenario S5: compressed-mode tranche promotion.
    #[test]
    fn ensure_allocated_promotes_to_larger_tranche_on_growth() {
        let config = FrameBufferConfig { slots_per_window: 3, mode: BufferMode::compressed_default(), ..Default::default() };
        let (shm, _dir) = allocator();
        let mut buffer = FrameBuffer::new(1, config, shm);

        assert!(buffer.ensure_allocated(1920, 1080, 500 * 1024));
        assert_eq!(buffer.slot_capacity(), 1 << 20);
        let first_offset = buffer.shared_memory_offset();

        assert!(buffer.ensure_allocated(1920, 1080, 2 * (1 << 20)));
        assert_eq!(buffer.slot_capacity(), 5 * (1 << 20));
        assert_ne!(buffer.shared_memory_offset(), first_offset);
    }

    #[test]
    fn ensure_allocated_is_noop_when_size_class_unchanged() {
        let config = FrameBufferConfig { slots_per_window: 3, mode: BufferMode::compressed_default(), ..Default::default() };
        let (shm, _dir) = allocator();
        let mut buffer = FrameBuffer::new(1, config, shm);

        assert!(buffer.ensure_allocated(1920, 1080, 500 * 1024));
        assert!(!buffer.ensure_allocated(1920, 1080, 600 * 1024));
    }

    /// Scenario S6: ring full, advance, reuse.
    #[test]
    fn write_frame_reports_full_ring_until_advanced() {
        let config = FrameBufferConfig { slots_per_window: 3, ..Default::default() };
        let (shm, _dir) = allocator();
        let mut buffer = FrameBuffer::new(1, config, shm);
        buffer.ensure_allocated(4, 4, 0);

        assert_eq!(buffer.write_frame(sample_header(1), b"a").unwrap(), 0);
        assert_eq!(buffer.write_frame(sample_header(2), b"b").unwrap(), 1);
        assert_eq!(buffer.write_frame(sample_header(3), b"c"), Err(BufferError::Full));

        buffer.advance_read_index();
        assert_eq!(buffer.write_frame(sample_header(3), b"c").unwrap(), 2);
    }

    #[test]
    fn write_frame_rejects_oversized_payload() {
        let config = FrameBufferConfig { slots_per_window: 3, ..Default::default() };
        let (shm, _dir) = allocator();
        let mut buffer = FrameBuffer::new(1, config, shm);
        buffer.ensure_allocated(2, 2, 0);

        let capacity = buffer.slot_capacity();
        let oversized = vec![0u8; capacity + 1];
        let result = buffer.write_frame(sample_header(1), &oversized);
        assert_eq!(result, Err(BufferError::OversizedFrame { payload_len: capacity + 1, slot_capacity: capacity }));
    }

    /// Invariant 5: written slots retain their exact content until rewritten.
    #[test]
    fn written_slot_retains_content_until_overwritten() {
        let config = FrameBufferConfig { slots_per_window: 3, ..Default::default() };
        let (shm, _dir) = allocator();
        let mut buffer = FrameBuffer::new(1, config, shm);
        buffer.ensure_allocated(4, 4, 0);

        let header = sample_header(5);
        buffer.write_frame(header, b"payload").unwrap();

        let Some(backing) = buffer.backing.as_mut() else { panic!("expected backing") };
        let slot = &backing.as_mut_slice(buffer.slot_size as usize * 3)[..buffer.slot_size as usize];
        let parsed = FrameSlotHeader::parse(slot).unwrap();
        assert_eq!(parsed.frame_number, 5);
        assert_eq!(&slot[HEADER_SIZE..HEADER_SIZE + 7], b"payload");
    }

    #[test]
    fn falls_back_to_local_heap_when_shared_allocation_fails() {
        let config = FrameBufferConfig { slots_per_window: 2, ..Default::default() };
        let (shm, _dir) = allocator();
        let mut buffer = FrameBuffer::new(1, config, shm);

        // 3000x3000x4 bytes/slot * 2 slots exceeds the 64 MiB backing file.
        assert!(buffer.ensure_allocated(3000, 3000, 0));
        assert!(!buffer.uses_shared_memory());
        assert!(buffer.write_frame(sample_header(1), b"x").is_ok());
    }

    #[test]
    fn dispose_frees_backing_and_marks_unallocated() {
        let (shm, _dir) = allocator();
        let mut buffer = FrameBuffer::new(1, FrameBufferConfig::default(), shm);
        buffer.ensure_allocated(4, 4, 0);
        assert!(buffer.is_allocated());

        buffer.dispose();
        assert!(!buffer.is_allocated());
    }
}
