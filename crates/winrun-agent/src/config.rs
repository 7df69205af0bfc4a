//! `AgentConfig`: the single serde-deserializable (TOML or JSON) surface
//! the binary loads at startup, composed of one section per component.
//!
//! None of the component crates' own config types (`SchedulerConfig`,
//! `AllocatorConfig`, ...) derive `Serialize`/`Deserialize` themselves —
//! they are built from plain Rust values, not deserialized directly from a
//! config file. This module is the serde-friendly configuration boundary: one section
//! per component, each field defaulted to its documented production value,
//! converted into the concrete component config a crate's constructor
//! expects.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use winrun_dragdrop::DragDropConfig;
use winrun_framebuffer::{BufferMode, CompressionConfig, FrameBufferConfig, DEFAULT_COMPRESSED_TRANCHES};
use winrun_scheduler::SchedulerConfig;
use winrun_session::SessionManagerConfig;
use winrun_shm::AllocatorConfig;
use winrun_telemetry::RetryPolicy;

/// Named retry budget, selecting one of [`winrun_telemetry::RetryPolicy`]'s
/// presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPreset {
    /// 500ms/1.8x/15s/5 attempts.
    Default,
    /// 100ms/1.5x/5s/10 attempts.
    Critical,
    /// Collapses to one attempt.
    NoRetry,
}

impl RetryPreset {
    /// Resolves this preset into the concrete retry policy it names.
    #[must_use]
    pub fn resolve(self) -> RetryPolicy {
        match self {
            Self::Default => RetryPolicy::default_policy(),
            Self::Critical => RetryPolicy::critical(),
            Self::NoRetry => RetryPolicy::no_retry(),
        }
    }
}

impl Default for RetryPreset {
    fn default() -> Self {
        Self::Default
    }
}

/// `buffer_mode` selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferModeKind {
    /// Exact pixel-sized slots, scaled by headroom.
    Uncompressed,
    /// Tranche-classed slots for LZ4-compressed payloads.
    Compressed,
}

impl Default for BufferModeKind {
    fn default() -> Self {
        Self::Compressed
    }
}

/// `scheduler.*` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    /// See [`SchedulerConfig::target_fps`].
    pub target_fps: u32,
    /// See [`SchedulerConfig::capture_timeout_ms`].
    pub capture_timeout_ms: u64,
    /// See [`SchedulerConfig::max_consecutive_failures`].
    pub max_consecutive_failures: u32,
    /// See [`SchedulerConfig::reinitialization_delay_ms`].
    pub reinitialization_delay_ms: u64,
    /// See [`SchedulerConfig::enable_per_window_capture`].
    pub enable_per_window_capture: bool,
    /// See [`SchedulerConfig::min_window_frame_interval_ms`].
    pub min_window_frame_interval_ms: u64,
    /// See [`SchedulerConfig::key_frame_cadence`].
    pub key_frame_cadence: u32,
    /// See [`SchedulerConfig::cleanup_interval_ms`].
    pub cleanup_interval_ms: u64,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        let d = SchedulerConfig::default();
        Self {
            target_fps: d.target_fps,
            capture_timeout_ms: d.capture_timeout_ms,
            max_consecutive_failures: d.max_consecutive_failures,
            reinitialization_delay_ms: d.reinitialization_delay_ms,
            enable_per_window_capture: d.enable_per_window_capture,
            min_window_frame_interval_ms: d.min_window_frame_interval_ms,
            key_frame_cadence: d.key_frame_cadence,
            cleanup_interval_ms: d.cleanup_interval_ms,
        }
    }
}

impl SchedulerSection {
    /// Converts to the concrete config [`winrun_scheduler::FrameStreamingScheduler`] expects.
    #[must_use]
    pub fn to_scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            target_fps: self.target_fps,
            capture_timeout_ms: self.capture_timeout_ms,
            max_consecutive_failures: self.max_consecutive_failures,
            reinitialization_delay_ms: self.reinitialization_delay_ms,
            enable_per_window_capture: self.enable_per_window_capture,
            min_window_frame_interval_ms: self.min_window_frame_interval_ms,
            key_frame_cadence: self.key_frame_cadence,
            cleanup_interval_ms: self.cleanup_interval_ms,
        }
    }
}

/// `shared_memory.*` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedMemorySection {
    /// See [`AllocatorConfig::path`]. Default tag `winrun-framebuffer`.
    pub path: PathBuf,
    /// See [`AllocatorConfig::create_if_not_exists`].
    pub create_if_not_exists: bool,
    /// See [`AllocatorConfig::create_size_bytes`].
    pub create_size_bytes: u64,
    /// See [`AllocatorConfig::minimum_size_bytes`].
    pub minimum_size_bytes: u64,
}

impl Default for SharedMemorySection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("winrun-framebuffer"),
            create_if_not_exists: true,
            create_size_bytes: 64 * 1024 * 1024,
            minimum_size_bytes: 1024 * 1024,
        }
    }
}

impl SharedMemorySection {
    /// Converts to the concrete config [`winrun_shm::ShmAllocator::initialize`] expects.
    #[must_use]
    pub fn to_allocator_config(&self) -> AllocatorConfig {
        AllocatorConfig {
            path: self.path.clone(),
            create_if_not_exists: self.create_if_not_exists,
            create_size_bytes: self.create_size_bytes,
            minimum_size_bytes: self.minimum_size_bytes,
        }
    }
}

/// `frame_buffer.*` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameBufferSection {
    /// See [`FrameBufferConfig::slots_per_window`].
    pub slots_per_window: usize,
    /// See [`FrameBufferConfig::shrink_grace_frames`].
    pub shrink_grace_frames: u32,
    /// Selects [`BufferMode::Uncompressed`] vs [`BufferMode::Compressed`].
    pub buffer_mode: BufferModeKind,
    /// [`BufferMode::Uncompressed`]'s `bytes_per_pixel`.
    pub bytes_per_pixel: u32,
    /// [`BufferMode::Uncompressed`]'s `headroom`.
    pub exact_allocation_headroom: f64,
    /// [`BufferMode::Compressed`]'s tranche ladder, in bytes. Must be
    /// monotonically increasing.
    pub compressed_tranches: Vec<u64>,
}

impl Default for FrameBufferSection {
    fn default() -> Self {
        let d = FrameBufferConfig::default();
        Self {
            slots_per_window: d.slots_per_window,
            shrink_grace_frames: d.shrink_grace_frames,
            buffer_mode: BufferModeKind::Compressed,
            bytes_per_pixel: 4,
            exact_allocation_headroom: 1.0,
            compressed_tranches: DEFAULT_COMPRESSED_TRANCHES.to_vec(),
        }
    }
}

impl FrameBufferSection {
    /// Converts to the concrete config [`winrun_framebuffer::FrameBufferManager`] expects.
    #[must_use]
    pub fn to_frame_buffer_config(&self) -> FrameBufferConfig {
        let mode = match self.buffer_mode {
            BufferModeKind::Uncompressed => BufferMode::Uncompressed {
                bytes_per_pixel: self.bytes_per_pixel,
                headroom: self.exact_allocation_headroom,
            },
            BufferModeKind::Compressed => BufferMode::Compressed { tranches: self.compressed_tranches.clone() },
        };
        FrameBufferConfig {
            slots_per_window: self.slots_per_window,
            mode,
            shrink_grace_frames: self.shrink_grace_frames,
        }
    }
}

/// `compression.*` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionSection {
    /// See [`CompressionConfig::enabled`].
    pub enabled: bool,
    /// See [`CompressionConfig::level`].
    pub level: i32,
    /// See [`CompressionConfig::min_size_to_compress`].
    pub min_size_to_compress: usize,
    /// See [`CompressionConfig::max_compression_ratio`].
    pub max_compression_ratio: f64,
}

impl Default for CompressionSection {
    fn default() -> Self {
        let d = CompressionConfig::default();
        Self {
            enabled: d.enabled,
            level: d.level,
            min_size_to_compress: d.min_size_to_compress,
            max_compression_ratio: d.max_compression_ratio,
        }
    }
}

impl CompressionSection {
    /// Converts to the concrete config [`winrun_framebuffer::FrameCompressor`] expects.
    #[must_use]
    pub fn to_compression_config(&self) -> CompressionConfig {
        CompressionConfig {
            enabled: self.enabled,
            level: self.level,
            min_size_to_compress: self.min_size_to_compress,
            max_compression_ratio: self.max_compression_ratio,
        }
    }
}

/// `drag_drop.*` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DragDropSection {
    /// See [`DragDropConfig::staging_root`].
    pub staging_root: PathBuf,
    /// See [`DragDropConfig::per_file_limit_bytes`].
    pub per_file_limit_bytes: u64,
    /// See [`DragDropConfig::total_limit_bytes`].
    pub total_limit_bytes: u64,
    /// See [`DragDropConfig::max_filename_len`].
    pub max_filename_len: usize,
}

impl Default for DragDropSection {
    fn default() -> Self {
        let d = DragDropConfig::new(std::env::temp_dir().join("winrun-dragdrop"));
        Self {
            staging_root: d.staging_root,
            per_file_limit_bytes: d.per_file_limit_bytes,
            total_limit_bytes: d.total_limit_bytes,
            max_filename_len: d.max_filename_len,
        }
    }
}

impl DragDropSection {
    /// Converts to the concrete config [`winrun_dragdrop::DragDropStaging`] expects.
    #[must_use]
    pub fn to_dragdrop_config(&self) -> DragDropConfig {
        DragDropConfig {
            staging_root: self.staging_root.clone(),
            per_file_limit_bytes: self.per_file_limit_bytes,
            total_limit_bytes: self.total_limit_bytes,
            max_filename_len: self.max_filename_len,
        }
    }
}

/// The full, file-loadable agent configuration. Every field is defaulted to
/// its documented production value; a config file need only override what it
/// changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Frame streaming scheduler tuning (C5).
    pub scheduler: SchedulerSection,
    /// Shared-memory backing file (C2).
    pub shared_memory: SharedMemorySection,
    /// Per-window slot ring sizing (C4).
    pub frame_buffer: FrameBufferSection,
    /// LZ4 frame compression policy (C3).
    pub compression: CompressionSection,
    /// Drag-and-drop staging limits and location (C9).
    pub drag_drop: DragDropSection,
    /// Outbound send retry budget, selected by name (C6).
    pub retry_preset: RetryPreset,
    /// Session heartbeat cadence, in milliseconds (C7).
    pub session_heartbeat_interval_ms: u64,
    /// Interval between `TelemetryReport` emissions, in milliseconds.
    pub telemetry_report_interval_ms: u64,
}

impl AgentConfig {
    /// Parses an [`AgentConfig`] from TOML source text.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error if `source` is not valid TOML or does not
    /// match this config's shape.
    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Parses an [`AgentConfig`] from JSON source text.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error if `source` is not valid JSON or does not
    /// match this config's shape.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Builds the [`SessionManagerConfig`] this config implies.
    #[must_use]
    pub fn session_manager_config(&self) -> SessionManagerConfig {
        SessionManagerConfig {
            heartbeat_interval: std::time::Duration::from_millis(self.session_heartbeat_interval_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = AgentConfig::default();
        let text = toml::to_string(&config).expect("serialize");
        let back = AgentConfig::from_toml(&text).expect("deserialize");
        assert_eq!(back.scheduler.target_fps, config.scheduler.target_fps);
        assert_eq!(back.shared_memory.path, config.shared_memory.path);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = AgentConfig::from_toml("[scheduler]\ntarget_fps = 60\n").expect("deserialize");
        assert_eq!(config.scheduler.target_fps, 60);
        assert_eq!(config.scheduler.min_window_frame_interval_ms, SchedulerSection::default().min_window_frame_interval_ms);
        assert_eq!(config.compression.min_size_to_compress, 1024);
    }

    #[test]
    fn defaults_match_spec_documented_values() {
        let config = AgentConfig::default();
        assert_eq!(config.scheduler.target_fps, 30);
        assert_eq!(config.scheduler.min_window_frame_interval_ms, 33);
        assert_eq!(config.scheduler.max_consecutive_failures, 10);
        assert_eq!(config.frame_buffer.slots_per_window, 3);
        assert_eq!(config.drag_drop.per_file_limit_bytes, 500 * 1024 * 1024);
        assert_eq!(config.drag_drop.total_limit_bytes, 2 * 1024 * 1024 * 1024);
        assert_eq!(config.retry_preset, RetryPreset::Default);
    }
}
