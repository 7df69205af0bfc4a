//! Staging directory lifecycle: stage, commit, cancel, and the
//! [`DragDropEvent`] dispatcher that drives them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use winrun_core::{Environment, WindowId};
use winrun_proto::payloads::{DragDropEvent, DragEventKind, DragFile};

use crate::config::DragDropConfig;
use crate::error::DragDropError;
use crate::session::DragSession;
use crate::validate::{sanitize_filename, validate_paths};

/// Outcome of [`DragDropStaging::stage_files`].
#[derive(Debug, Clone)]
pub struct StageResult {
    /// Whether every file was validated and materialized successfully.
    pub success: bool,
    /// Absolute paths written under the staging directory, in offered order.
    /// Empty on failure.
    pub staged_paths: Vec<PathBuf>,
    /// Human-readable failure reason, set iff `success` is false.
    pub error_message: Option<String>,
}

impl StageResult {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            staged_paths: Vec::new(),
            error_message: Some(message.into()),
        }
    }
}

/// What happened in response to a dispatched [`DragDropEvent`].
#[derive(Debug, Clone)]
pub enum DragDropOutcome {
    /// `Enter`: files were staged.
    Staged(StageResult),
    /// `Move`: no staging action was taken.
    Ignored,
    /// `Leave`: the in-progress staging session was cancelled.
    Cancelled,
    /// `Drop`: files were staged (if not already) and then committed.
    Committed(Vec<PathBuf>),
}

/// Formats 16 random bytes as a lowercase GUID-style string.
fn random_guid(env: &impl Environment) -> String {
    let mut bytes = [0u8; 16];
    env.random_bytes(&mut bytes);
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        bytes[6], bytes[7],
        bytes[8], bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
    )
}

/// Materializes one validated [`DragFile`] under `staging_dir`, returning the
/// absolute path written.
fn materialize(staging_dir: &Path, file: &DragFile, max_filename_len: usize) -> Result<PathBuf, DragDropError> {
    let source = Path::new(&file.host_path);
    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(&file.host_path);
    let sanitized = sanitize_filename(name, max_filename_len);
    let destination = staging_dir.join(&sanitized);

    if file.is_directory {
        std::fs::create_dir_all(&destination).map_err(|e| DragDropError::Io(e.to_string()))?;
    } else {
        std::fs::copy(source, &destination).map_err(|e| DragDropError::Io(e.to_string()))?;
    }
    Ok(destination)
}

/// Moves `source` into `destination`, using an atomic rename where possible
/// and falling back to copy-then-delete across filesystem/device boundaries.
fn move_into(source: &Path, destination: &Path) -> Result<(), DragDropError> {
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DragDropError::Io(e.to_string()))?;
    }
    match std::fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(_) => {
            if source.is_dir() {
                copy_dir_recursive(source, destination)?;
                std::fs::remove_dir_all(source).map_err(|e| DragDropError::Io(e.to_string()))?;
            } else {
                std::fs::copy(source, destination).map_err(|e| DragDropError::Io(e.to_string()))?;
                std::fs::remove_file(source).map_err(|e| DragDropError::Io(e.to_string()))?;
            }
            Ok(())
        }
    }
}

fn copy_dir_recursive(source: &Path, destination: &Path) -> Result<(), DragDropError> {
    std::fs::create_dir_all(destination).map_err(|e| DragDropError::Io(e.to_string()))?;
    for entry in std::fs::read_dir(source).map_err(|e| DragDropError::Io(e.to_string()))? {
        let entry = entry.map_err(|e| DragDropError::Io(e.to_string()))?;
        let dest_entry = destination.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| DragDropError::Io(e.to_string()))?;
        if file_type.is_dir() {
            copy_dir_recursive(&entry.path(), &dest_entry)?;
        } else {
            std::fs::copy(entry.path(), &dest_entry).map_err(|e| DragDropError::Io(e.to_string()))?;
        }
    }
    Ok(())
}

/// Drives staging-directory creation, file materialization, commit, and
/// cancellation for in-flight drag-and-drop transfers.
pub struct DragDropStaging<E> {
    config: DragDropConfig,
    env: E,
    sessions: HashMap<WindowId, DragSession>,
}

impl<E: Environment> DragDropStaging<E> {
    /// Creates a staging engine with no active sessions.
    pub fn new(config: DragDropConfig, env: E) -> Self {
        Self {
            config,
            env,
            sessions: HashMap::new(),
        }
    }

    /// True if `window_id` has an in-progress staging session.
    #[must_use]
    pub fn has_session(&self, window_id: WindowId) -> bool {
        self.sessions.contains_key(&window_id)
    }

    /// Number of in-progress staging sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Validates and materializes `files` into a fresh staging subdirectory
    /// for `window_id`. On any failure, no partial staging directory is left
    /// behind and the returned [`StageResult::success`] is `false`.
    pub fn stage_files(&mut self, window_id: WindowId, files: &[DragFile], now: Instant) -> StageResult {
        if let Err(e) = validate_paths(files, &self.config) {
            return StageResult::failed(e.to_string());
        }

        let staging_dir = self.config.staging_root.join(random_guid(&self.env));
        if let Err(e) = std::fs::create_dir_all(&staging_dir) {
            return StageResult::failed(e.to_string());
        }

        let mut staged_paths = Vec::with_capacity(files.len());
        for file in files {
            match materialize(&staging_dir, file, self.config.max_filename_len) {
                Ok(path) => staged_paths.push(path),
                Err(e) => {
                    let _ = std::fs::remove_dir_all(&staging_dir);
                    return StageResult::failed(e.to_string());
                }
            }
        }

        self.sessions.insert(
            window_id,
            DragSession {
                window_id,
                staging_dir,
                staged_paths: staged_paths.clone(),
                created_at: now,
            },
        );

        StageResult {
            success: true,
            staged_paths,
            error_message: None,
        }
    }

    /// Moves a window's staged files into `destination` if provided, or
    /// leaves them in the staging directory otherwise. Either way, the
    /// session is forgotten on success.
    ///
    /// # Errors
    ///
    /// Returns [`DragDropError::NoStagingSession`] if no staging session is
    /// active for `window_id`, or [`DragDropError::Io`] if a move fails.
    pub fn commit_drop(
        &mut self,
        window_id: WindowId,
        destination: Option<&Path>,
    ) -> Result<Vec<PathBuf>, DragDropError> {
        let session = self
            .sessions
            .remove(&window_id)
            .ok_or(DragDropError::NoStagingSession(window_id))?;

        let Some(destination) = destination else {
            return Ok(session.staged_paths);
        };

        let mut committed = Vec::with_capacity(session.staged_paths.len());
        for staged in &session.staged_paths {
            let Some(name) = staged.file_name() else {
                continue;
            };
            let target = destination.join(name);
            move_into(staged, &target)?;
            committed.push(target);
        }
        let _ = std::fs::remove_dir_all(&session.staging_dir);
        Ok(committed)
    }

    /// Removes a window's staging directory and forgets its session.
    ///
    /// # Errors
    ///
    /// Returns [`DragDropError::NoStagingSession`] if no staging session is
    /// active for `window_id`.
    pub fn cancel_drag(&mut self, window_id: WindowId) -> Result<(), DragDropError> {
        let session = self
            .sessions
            .remove(&window_id)
            .ok_or(DragDropError::NoStagingSession(window_id))?;
        let _ = std::fs::remove_dir_all(&session.staging_dir);
        Ok(())
    }

    /// Dispatches a host-forwarded drag gesture: `Enter` stages, `Move` is a
    /// no-op, `Leave` cancels, `Drop` stages (unless already staged by a
    /// prior `Enter`) and then commits.
    ///
    /// # Errors
    ///
    /// Returns [`DragDropError`] if `Leave`/`Drop` reference a window with no
    /// active session where one is required, or if staging/commit fails.
    pub fn handle_drag_drop(&mut self, msg: DragDropEvent, now: Instant) -> Result<DragDropOutcome, DragDropError> {
        match msg.kind {
            DragEventKind::Enter => {
                let result = self.stage_files(msg.window_id, &msg.files, now);
                Ok(DragDropOutcome::Staged(result))
            }
            DragEventKind::Move => Ok(DragDropOutcome::Ignored),
            DragEventKind::Leave => {
                self.cancel_drag(msg.window_id)?;
                Ok(DragDropOutcome::Cancelled)
            }
            DragEventKind::Drop => {
                if !self.has_session(msg.window_id) {
                    let result = self.stage_files(msg.window_id, &msg.files, now);
                    if !result.success {
                        return Ok(DragDropOutcome::Staged(result));
                    }
                }
                let destination = msg.destination.as_deref().map(Path::new);
                let committed = self.commit_drop(msg.window_id, destination)?;
                Ok(DragDropOutcome::Committed(committed))
            }
        }
    }

    /// Removes every staging session older than `max_age`, deleting its
    /// staging directory. Returns the window ids that were cleaned up.
    pub fn cleanup_stale_sessions(&mut self, max_age: Duration, now: Instant) -> Vec<WindowId> {
        let stale: Vec<WindowId> = self
            .sessions
            .iter()
            .filter(|(_, s)| now.saturating_duration_since(s.created_at) >= max_age)
            .map(|(id, _)| *id)
            .collect();

        for window_id in &stale {
            if let Some(session) = self.sessions.remove(window_id) {
                let _ = std::fs::remove_dir_all(&session.staging_dir);
            }
        }
        stale
    }
}
