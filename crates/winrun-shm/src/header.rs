//! The fixed-layout header written at offset 0 of the mapped file.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Fixed 16-byte header: magic, version, and the region's total size.
///
/// All multi-byte integers are little-endian. The allocator does not persist
/// its free list to disk; on every `initialize()` the heap past this header
/// is reset to a single free block, so the header only needs to carry enough
/// to validate that a reopened file is one of ours and of the expected size.
#[repr(C)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct ShmHeader {
    magic: [u8; 4],
    version: u8,
    reserved: [u8; 3],
    region_size: [u8; 8],
}

impl ShmHeader {
    /// Size of the serialized header in bytes. Also the heap's starting
    /// offset (`header_reserved` in the allocator's terms), already a
    /// multiple of the 16-byte allocation alignment.
    pub const SIZE: usize = 16;

    /// Magic number identifying a WinRun frame-buffer region: "WRFB".
    pub const MAGIC: u32 = 0x5752_4642;

    /// Current on-disk layout version.
    pub const VERSION: u8 = 1;

    /// Builds a fresh header for a region of `region_size` bytes.
    #[must_use]
    pub fn new(region_size: u64) -> Self {
        Self {
            magic: Self::MAGIC.to_le_bytes(),
            version: Self::VERSION,
            reserved: [0; 3],
            region_size: region_size.to_le_bytes(),
        }
    }

    /// Reads a header from the front of `bytes`, if it validates.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let header = Self::read_from_prefix(bytes).ok()?.0;
        if u32::from_le_bytes(header.magic) != Self::MAGIC || header.version != Self::VERSION {
            return None;
        }
        Some(header)
    }

    /// Serializes the header to its on-disk bytes.
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        self.as_bytes().try_into().unwrap_or_else(|_| unreachable!("ShmHeader is exactly SIZE bytes"))
    }

    /// The region size recorded in this header.
    #[must_use]
    pub fn region_size(&self) -> u64 {
        u64::from_le_bytes(self.region_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_bytes() {
        let header = ShmHeader::new(1 << 20);
        let bytes = header.to_bytes();
        let parsed = ShmHeader::parse(&bytes).expect("should validate");
        assert_eq!(parsed.region_size(), 1 << 20);
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut bytes = ShmHeader::new(4096).to_bytes();
        bytes[0] = 0;
        assert!(ShmHeader::parse(&bytes).is_none());
    }
}
