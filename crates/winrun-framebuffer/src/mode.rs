//! Slot-sizing policy: exact uncompressed allocation vs. tranche classes.

use crate::slot_header::HEADER_SIZE;

/// Default tranche ladder in bytes: 1 MiB, 5 MiB, 20 MiB.
pub const DEFAULT_COMPRESSED_TRANCHES: [u64; 3] = [1 << 20, 5 * (1 << 20), 20 * (1 << 20)];

/// How a [`crate::FrameBuffer`] sizes its slots.
#[derive(Debug, Clone)]
pub enum BufferMode {
    /// `slot_size = header + width*height*bytes_per_pixel`, scaled by
    /// `headroom`. Reallocation only on a `width*height` change.
    Uncompressed {
        /// Bytes per pixel of the captured format.
        bytes_per_pixel: u32,
        /// Multiplier applied to the exact pixel size, `>= 1.0`.
        headroom: f64,
    },
    /// `slot_size` is the smallest tranche `>= expected_payload`.
    /// Reallocation only when the current tranche can no longer hold the
    /// payload.
    Compressed {
        /// Monotonically increasing slot-size classes, in bytes.
        tranches: Vec<u64>,
    },
}

impl BufferMode {
    /// Builds the default compressed mode with the standard tranche ladder.
    #[must_use]
    pub fn compressed_default() -> Self {
        Self::Compressed { tranches: DEFAULT_COMPRESSED_TRANCHES.to_vec() }
    }

    /// Whether this mode is [`BufferMode::Compressed`].
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Compressed { .. })
    }

    /// Computes the slot size (header included) for a frame of `width` by
    /// `height` pixels whose encoded payload is expected to be
    /// `expected_payload_len` bytes.
    ///
    /// Returns `None` for `Compressed` mode when `expected_payload_len`
    /// exceeds every configured tranche.
    #[must_use]
    pub fn slot_size_for(&self, width: u32, height: u32, expected_payload_len: u64) -> Option<u64> {
        match self {
            Self::Uncompressed { bytes_per_pixel, headroom } => {
                let exact = u64::from(width) * u64::from(height) * u64::from(*bytes_per_pixel);
                #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let scaled = (exact as f64 * headroom.max(1.0)).ceil() as u64;
                Some(HEADER_SIZE as u64 + scaled)
            }
            Self::Compressed { tranches } => tranches
                .iter()
                .find(|&&tranche| tranche >= expected_payload_len)
                .map(|&tranche| HEADER_SIZE as u64 + tranche),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncompressed_mode_scales_by_headroom() {
        let mode = BufferMode::Uncompressed { bytes_per_pixel: 4, headroom: 1.5 };
        let size = mode.slot_size_for(100, 100, 0).unwrap();
        assert_eq!(size, HEADER_SIZE as u64 + (100 * 100 * 4 * 3 / 2));
    }

    #[test]
    fn compressed_mode_picks_smallest_sufficient_tranche() {
        let mode = BufferMode::compressed_default();
        let size = mode.slot_size_for(1920, 1080, 500 * 1024).unwrap();
        assert_eq!(size, HEADER_SIZE as u64 + (1 << 20));

        let size = mode.slot_size_for(1920, 1080, 2 * (1 << 20)).unwrap();
        assert_eq!(size, HEADER_SIZE as u64 + 5 * (1 << 20));
    }

    #[test]
    fn compressed_mode_rejects_payload_larger_than_every_tranche() {
        let mode = BufferMode::compressed_default();
        assert!(mode.slot_size_for(7680, 4320, 100 * (1 << 20)).is_none());
    }
}
