//! Pure validation and filename sanitization. No I/O.

use winrun_proto::payloads::DragFile;

use crate::config::DragDropConfig;
use crate::error::ValidationError;

/// Checks a proposed file list against the staging limits, without touching
/// the filesystem.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered: an empty file list, an
/// empty `host_path`, a `..`-traversing path, a single file over the
/// per-file limit, or a total size over the transfer limit.
pub fn validate_paths(files: &[DragFile], config: &DragDropConfig) -> Result<(), ValidationError> {
    if files.is_empty() {
        return Err(ValidationError::Empty);
    }

    let mut total: u64 = 0;
    for (index, file) in files.iter().enumerate() {
        if file.host_path.is_empty() {
            return Err(ValidationError::EmptyHostPath { index });
        }
        if file.host_path.contains("..") || file.guest_path.contains("..") {
            return Err(ValidationError::PathTraversal { index });
        }
        if file.file_size > config.per_file_limit_bytes {
            return Err(ValidationError::FileTooLarge {
                index,
                size: file.file_size,
                limit: config.per_file_limit_bytes,
            });
        }
        total = total.saturating_add(file.file_size);
    }

    if total > config.total_limit_bytes {
        return Err(ValidationError::TotalTooLarge {
            total,
            limit: config.total_limit_bytes,
        });
    }

    Ok(())
}

/// Sanitizes a filename for use inside a staging directory: path separators
/// become underscores, control characters are dropped, trailing dots and
/// spaces are trimmed, and the result is truncated to `max_len` characters.
#[must_use]
pub fn sanitize_filename(name: &str, max_len: usize) -> String {
    let replaced: String = name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    let trimmed = replaced.trim_end_matches(['.', ' ']);
    let truncated: String = trimmed.chars().take(max_len).collect();
    if truncated.is_empty() {
        "_".to_string()
    } else {
        truncated
    }
}
