//! `WindowId -> FrameBuffer` map driven by the streaming scheduler.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use winrun_core::WindowId;
use winrun_shm::ShmAllocator;

use crate::buffer::{FrameBuffer, FrameBufferConfig};

/// Buffer counts and byte totals summed across every tracked window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManagerStats {
    /// Number of windows with a live buffer.
    pub window_count: usize,
    /// Sum of `buffer_size()` across tracked buffers.
    pub total_bytes: u64,
    /// Number of tracked buffers currently backed by the shared-memory
    /// mapping rather than the local-heap fallback.
    pub shared_memory_buffers: usize,
}

/// Owns one [`FrameBuffer`] per window, lazily allocated on first use.
pub struct FrameBufferManager {
    allocator: Arc<ShmAllocator>,
    config: FrameBufferConfig,
    buffers: HashMap<WindowId, FrameBuffer>,
}

impl FrameBufferManager {
    /// Builds a manager that allocates new buffers from `allocator` with
    /// `config` as the per-buffer template.
    #[must_use]
    pub fn new(allocator: Arc<ShmAllocator>, config: FrameBufferConfig) -> Self {
        Self { allocator, config, buffers: HashMap::new() }
    }

    /// Returns the buffer for `window_id`, creating an unallocated one on
    /// first reference.
    pub fn get_or_create(&mut self, window_id: WindowId) -> &mut FrameBuffer {
        self.buffers
            .entry(window_id)
            .or_insert_with(|| FrameBuffer::new(window_id.raw(), self.config.clone(), Arc::clone(&self.allocator)))
    }

    /// The buffer for `window_id`, if one has already been created.
    #[must_use]
    pub fn get(&self, window_id: WindowId) -> Option<&FrameBuffer> {
        self.buffers.get(&window_id)
    }

    /// Frees `window_id`'s backing allocation and drops its entry.
    pub fn remove(&mut self, window_id: WindowId) {
        if let Some(mut buffer) = self.buffers.remove(&window_id) {
            buffer.dispose();
        }
    }

    /// Removes and disposes every tracked window absent from `live_set`.
    pub fn cleanup_stale(&mut self, live_set: &HashSet<WindowId>) {
        let stale: Vec<WindowId> = self.buffers.keys().copied().filter(|id| !live_set.contains(id)).collect();
        for window_id in stale {
            self.remove(window_id);
        }
    }

    /// Number of windows currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether no windows are currently tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Totals summed across every tracked buffer.
    #[must_use]
    pub fn stats(&self) -> ManagerStats {
        let mut stats = ManagerStats { window_count: self.buffers.len(), ..ManagerStats::default() };
        for buffer in self.buffers.values() {
            if buffer.is_allocated() {
                stats.total_bytes += buffer.buffer_size();
            }
            if buffer.uses_shared_memory() {
                stats.shared_memory_buffers += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (FrameBufferManager, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let allocator = ShmAllocator::new();
        assert!(allocator.initialize(&winrun_shm::AllocatorConfig {
            path: dir.path().join("frames.shm"),
            create_if_not_exists: true,
            create_size_bytes: 8 * (1 << 20),
            minimum_size_bytes: 0,
        }));
        (FrameBufferManager::new(Arc::new(allocator), FrameBufferConfig::default()), dir)
    }

    #[test]
    fn get_or_create_lazily_allocates_one_buffer_per_window() {
        let (mut manager, _dir) = manager();
        manager.get_or_create(WindowId::new(1));
        manager.get_or_create(WindowId::new(1));
        manager.get_or_create(WindowId::new(2));
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn remove_disposes_backing_allocation() {
        let (mut manager, _dir) = manager();
        let buffer = manager.get_or_create(WindowId::new(1));
        buffer.ensure_allocated(4, 4, 0);

        manager.remove(WindowId::new(1));
        assert!(manager.is_empty());
    }

    #[test]
    fn cleanup_stale_removes_windows_outside_the_live_set() {
        let (mut manager, _dir) = manager();
        manager.get_or_create(WindowId::new(1));
        manager.get_or_create(WindowId::new(2));

        let live: HashSet<WindowId> = [WindowId::new(2)].into_iter().collect();
        manager.cleanup_stale(&live);

        assert_eq!(manager.len(), 1);
        assert!(manager.get(WindowId::new(2)).is_some());
    }

    #[test]
    fn stats_sum_across_tracked_buffers() {
        let (mut manager, _dir) = manager();
        manager.get_or_create(WindowId::new(1)).ensure_allocated(4, 4, 0);
        manager.get_or_create(WindowId::new(2)).ensure_allocated(4, 4, 0);

        let stats = manager.stats();
        assert_eq!(stats.window_count, 2);
        assert!(stats.total_bytes > 0);
        assert_eq!(stats.shared_memory_buffers, 2);
    }
}
