//! Tuning knobs for drag-and-drop staging.

use std::path::PathBuf;

const MEBIBYTE: u64 = 1024 * 1024;
const GIBIBYTE: u64 = 1024 * MEBIBYTE;

/// Limits and locations governing a [`crate::DragDropStaging`].
#[derive(Debug, Clone)]
pub struct DragDropConfig {
    /// Directory under which per-transfer staging subdirectories are created.
    pub staging_root: PathBuf,
    /// Maximum size of any single file.
    pub per_file_limit_bytes: u64,
    /// Maximum combined size of all files in one transfer.
    pub total_limit_bytes: u64,
    /// Maximum length, in characters, of a sanitized filename.
    pub max_filename_len: usize,
}

impl DragDropConfig {
    /// Builds a config rooted at `staging_root` with spec-default limits:
    /// 500 MiB per file, ~2 GiB total, 255-character filenames.
    #[must_use]
    pub fn new(staging_root: PathBuf) -> Self {
        Self {
            staging_root,
            per_file_limit_bytes: 500 * MEBIBYTE,
            total_limit_bytes: 2 * GIBIBYTE,
            max_filename_len: 255,
        }
    }
}
