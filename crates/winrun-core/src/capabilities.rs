//! Protocol version and capability flags.

use serde::{Deserialize, Serialize};

/// Protocol version, announced during capability exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolVersion {
    /// Major version. Bumped on incompatible wire changes.
    pub major: u16,
    /// Minor version. Bumped on backwards-compatible additions.
    pub minor: u16,
}

impl ProtocolVersion {
    /// The version implemented by this crate.
    pub const CURRENT: Self = Self { major: 1, minor: 0 };

    /// Combined 32-bit representation: `(major << 16) | minor`.
    #[must_use]
    pub fn combined(self) -> u32 {
        (u32::from(self.major) << 16) | u32::from(self.minor)
    }

    /// Whether `self` can interoperate with `other` (same major version).
    #[must_use]
    pub fn is_compatible_with(self, other: Self) -> bool {
        self.major == other.major
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// A 32-bit capability flag set. Each named capability is a distinct
/// power of two; capabilities combine by bitwise OR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(pub u32);

impl Capabilities {
    /// No capabilities announced.
    pub const NONE: Self = Self(0);
    /// Agent can stream frames through the shared-memory ring buffer.
    pub const FRAME_STREAMING: Self = Self(1 << 0);
    /// Agent can compress frames with LZ4 before publication.
    pub const FRAME_COMPRESSION: Self = Self(1 << 1);
    /// Agent supports per-window (rather than full-desktop) capture.
    pub const PER_WINDOW_CAPTURE: Self = Self(1 << 2);
    /// Agent supports clipboard synchronization.
    pub const CLIPBOARD_SYNC: Self = Self(1 << 3);
    /// Agent supports drag-and-drop staging.
    pub const DRAG_AND_DROP: Self = Self(1 << 4);
    /// Agent supports shortcut discovery.
    pub const SHORTCUT_DISCOVERY: Self = Self(1 << 5);

    /// Whether `self` includes every bit set in `other`.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::NONE
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_packs_major_and_minor() {
        let v = ProtocolVersion { major: 1, minor: 2 };
        assert_eq!(v.combined(), (1u32 << 16) | 2);
    }

    #[test]
    fn compatibility_only_checks_major() {
        let a = ProtocolVersion { major: 1, minor: 0 };
        let b = ProtocolVersion { major: 1, minor: 9 };
        let c = ProtocolVersion { major: 2, minor: 0 };
        assert!(a.is_compatible_with(b));
        assert!(!a.is_compatible_with(c));
    }

    #[test]
    fn capabilities_combine_by_or() {
        let caps = Capabilities::FRAME_STREAMING | Capabilities::CLIPBOARD_SYNC;
        assert!(caps.contains(Capabilities::FRAME_STREAMING));
        assert!(caps.contains(Capabilities::CLIPBOARD_SYNC));
        assert!(!caps.contains(Capabilities::DRAG_AND_DROP));
    }
}
