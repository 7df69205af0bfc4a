//! LZ4 frame compression with a skip-if-not-useful policy.

use crate::error::CompressorError;

/// Compression tuning, consumed at agent start.
#[derive(Debug, Clone, Copy)]
pub struct CompressionConfig {
    /// Master switch. When `false`, `compress` always skips.
    pub enabled: bool,
    /// Accepted for parity with the host-side configuration surface;
    /// `lz4_flex`'s block compressor has a single fixed effort level, so this
    /// field is currently inert.
    pub level: i32,
    /// Buffers shorter than this are never worth compressing.
    pub min_size_to_compress: usize,
    /// Skip the compressed result when `compressed_size / original_size`
    /// exceeds this ratio — the frame didn't shrink enough to be worth it.
    pub max_compression_ratio: f64,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self { enabled: true, level: 0, min_size_to_compress: 1024, max_compression_ratio: 0.95 }
    }
}

/// Outcome of a [`FrameCompressor::compress`] call.
#[derive(Debug, Clone)]
pub struct CompressResult {
    /// The frame bytes: LZ4-compressed if `is_compressed`, the input
    /// unchanged otherwise.
    pub data: Vec<u8>,
    /// Whether `data` is LZ4-compressed.
    pub is_compressed: bool,
    /// Length of the input.
    pub original_size: usize,
    /// Length of `data`.
    pub compressed_size: usize,
}

/// Running totals across every `compress` call made through one compressor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompressorStats {
    /// Frames passed to `compress`.
    pub total_frames: u64,
    /// Frames actually kept compressed (not skipped).
    pub compressed_frames: u64,
    /// Sum of `original_size - compressed_size` over compressed frames.
    pub bytes_saved: u64,
    running_ratio_sum: f64,
}

impl CompressorStats {
    /// Mean of `compressed_size / original_size` over frames actually kept
    /// compressed. `1.0` (no savings) when none have been compressed yet.
    #[must_use]
    pub fn average_ratio(&self) -> f64 {
        if self.compressed_frames == 0 {
            1.0
        } else {
            self.running_ratio_sum / self.compressed_frames as f64
        }
    }
}

/// Compresses frame payloads with LZ4, skipping frames where compression
/// isn't worth the cost.
#[derive(Debug, Default)]
pub struct FrameCompressor {
    config: CompressionConfig,
    stats: CompressorStats,
}

impl FrameCompressor {
    /// Builds a compressor with the given tuning.
    #[must_use]
    pub fn new(config: CompressionConfig) -> Self {
        Self { config, stats: CompressorStats::default() }
    }

    /// Compresses `bytes`, or returns them unchanged when compression is
    /// disabled, the input is below `min_size_to_compress`, or the
    /// compressed form doesn't clear `max_compression_ratio`.
    pub fn compress(&mut self, bytes: &[u8]) -> CompressResult {
        self.stats.total_frames += 1;
        let original_size = bytes.len();

        let skip = !self.config.enabled || original_size < self.config.min_size_to_compress;
        if skip {
            return CompressResult {
                data: bytes.to_vec(),
                is_compressed: false,
                original_size,
                compressed_size: original_size,
            };
        }

        let compressed = lz4_flex::block::compress(bytes);
        let compressed_size = compressed.len();
        #[allow(clippy::cast_precision_loss)]
        let ratio = compressed_size as f64 / original_size.max(1) as f64;

        if ratio > self.config.max_compression_ratio {
            return CompressResult {
                data: bytes.to_vec(),
                is_compressed: false,
                original_size,
                compressed_size: original_size,
            };
        }

        self.stats.compressed_frames += 1;
        self.stats.bytes_saved += (original_size - compressed_size) as u64;
        self.stats.running_ratio_sum += ratio;

        CompressResult { data: compressed, is_compressed: true, original_size, compressed_size }
    }

    /// Decompresses an LZ4 block back to exactly `expected_uncompressed_size`
    /// bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CompressorError::Corrupt`] if `bytes` is not a valid LZ4
    /// block for that expected size.
    pub fn decompress(bytes: &[u8], expected_uncompressed_size: usize) -> Result<Vec<u8>, CompressorError> {
        Ok(lz4_flex::block::decompress(bytes, expected_uncompressed_size)?)
    }

    /// Snapshot of totals accumulated so far.
    #[must_use]
    pub fn stats(&self) -> CompressorStats {
        self.stats
    }
}
