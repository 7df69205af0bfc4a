//! A single live (or invalid) allocation handle.

/// A region of the shared-memory heap returned by [`crate::ShmAllocator::allocate`].
///
/// `offset == 0` is the invalid sentinel: it is returned whenever the
/// allocator is uninitialized, the request was for zero bytes, or no free
/// block was large enough. `offset == 0` can never be a valid allocation
/// offset because the heap begins past the reserved header.
#[derive(Debug, Clone, Copy)]
pub struct SharedAllocation {
    /// Byte offset into the shared-memory region.
    pub offset: u64,
    /// Size in bytes, rounded up to the allocator's 16-byte granularity.
    pub size: u64,
    /// Address of `offset` within the current mapping. Null for an invalid
    /// allocation.
    pub pointer: *mut u8,
}

// SAFETY: `pointer` only ever addresses the allocator's own mmap, which
// outlives every allocation handle drawn from it (the allocator frees the
// mapping only from `close`, after which callers are expected to have
// released their allocations). All mutation through `pointer` is guarded by
// the allocator's single mutex, so handing the value across threads carries
// no more risk than handing across the allocator reference itself.
unsafe impl Send for SharedAllocation {}
unsafe impl Sync for SharedAllocation {}

impl SharedAllocation {
    /// The invalid allocation: zero offset, zero size, null pointer.
    pub const INVALID: Self = Self { offset: 0, size: 0, pointer: std::ptr::null_mut() };

    /// Whether this handle refers to a real allocation.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.offset != 0
    }
}

impl Default for SharedAllocation {
    fn default() -> Self {
        Self::INVALID
    }
}

impl PartialEq for SharedAllocation {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.size == other.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allocation_is_invalid() {
        assert!(!SharedAllocation::default().is_valid());
        assert!(!SharedAllocation::INVALID.is_valid());
    }
}
