//! Channel telemetry reporting payload.

use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of the channel telemetry counters.
///
/// Mirrors the metrics tracked by the telemetry layer; see that crate for
/// the definitions of `success_rate` and the retry-related counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Outbound sends attempted.
    pub send_attempts: u64,
    /// Outbound sends that ultimately succeeded.
    pub send_successes: u64,
    /// Outbound sends that ultimately failed after exhausting retries.
    pub send_failures: u64,
    /// Individual retry attempts across all sends.
    pub send_retries: u64,
    /// Inbound reads attempted.
    pub receive_attempts: u64,
    /// Inbound reads that succeeded.
    pub receive_successes: u64,
    /// Inbound reads that failed.
    pub receive_failures: u64,
    /// Envelopes dropped due to codec errors.
    pub message_processing_errors: u64,
}

/// Guest telemetry snapshot, reported periodically on its own timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryReport {
    /// The counters at report time.
    pub snapshot: TelemetrySnapshot,
    /// Milliseconds since the agent started.
    pub uptime_ms: u64,
}
