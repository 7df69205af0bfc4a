//! Atomic channel counters and point-in-time snapshots.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use winrun_proto::TelemetrySnapshot;

/// Immutable copy of [`ChannelMetrics`] taken at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
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
    /// The most recent error message recorded, if any.
    pub last_error_message: Option<String>,
}

impl MetricsSnapshot {
    /// The wire-format counters carried in a `TelemetryReport`.
    #[must_use]
    pub fn to_wire(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            send_attempts: self.send_attempts,
            send_successes: self.send_successes,
            send_failures: self.send_failures,
            send_retries: self.send_retries,
            receive_attempts: self.receive_attempts,
            receive_successes: self.receive_successes,
            receive_failures: self.receive_failures,
            message_processing_errors: self.message_processing_errors,
        }
    }

    /// `100%` when no sends have been attempted yet; otherwise
    /// `successes / (successes + failures) * 100`.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        let denominator = self.send_successes + self.send_failures;
        if denominator == 0 {
            100.0
        } else {
            (self.send_successes as f64 / denominator as f64) * 100.0
        }
    }
}

#[derive(Debug, Default)]
struct LastError {
    message: Option<String>,
    /// Milliseconds since the agent started, per [`winrun_core::Environment`].
    timestamp_ms: Option<u64>,
}

/// Atomically-updated counters for one outbound/inbound channel pair.
///
/// Every counter is a plain [`AtomicU64`]; readers take a consistent
/// [`MetricsSnapshot`] via [`ChannelMetrics::snapshot`] rather than reading
/// fields individually.
#[derive(Debug, Default)]
pub struct ChannelMetrics {
    send_attempts: AtomicU64,
    send_successes: AtomicU64,
    send_failures: AtomicU64,
    send_retries: AtomicU64,
    receive_attempts: AtomicU64,
    receive_successes: AtomicU64,
    receive_failures: AtomicU64,
    message_processing_errors: AtomicU64,
    last_error: Mutex<LastError>,
}

impl ChannelMetrics {
    /// Creates a zeroed counter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_send_attempt(&self) {
        self.send_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_send_success(&self) {
        self.send_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_send_retry(&self) {
        self.send_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_send_failure(&self, error_message: &str, timestamp_ms: u64) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
        self.record_error(error_message, timestamp_ms);
    }

    /// Records one inbound read attempt.
    pub fn record_receive_attempt(&self) {
        self.receive_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one inbound read success.
    pub fn record_receive_success(&self) {
        self.receive_successes.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one inbound read failure.
    pub fn record_receive_failure(&self, error_message: &str, timestamp_ms: u64) {
        self.receive_failures.fetch_add(1, Ordering::Relaxed);
        self.record_error(error_message, timestamp_ms);
    }

    /// Records one envelope dropped due to a codec or dispatch error.
    pub fn record_processing_error(&self, error_message: &str, timestamp_ms: u64) {
        self.message_processing_errors.fetch_add(1, Ordering::Relaxed);
        self.record_error(error_message, timestamp_ms);
    }

    fn record_error(&self, error_message: &str, timestamp_ms: u64) {
        #[allow(clippy::unwrap_used)]
        let mut last_error = self.last_error.lock().unwrap();
        last_error.message = Some(error_message.to_string());
        last_error.timestamp_ms = Some(timestamp_ms);
    }

    /// Takes an immutable, consistent copy of the current counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        #[allow(clippy::unwrap_used)]
        let last_error_message = self.last_error.lock().unwrap().message.clone();
        MetricsSnapshot {
            send_attempts: self.send_attempts.load(Ordering::Relaxed),
            send_successes: self.send_successes.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            send_retries: self.send_retries.load(Ordering::Relaxed),
            receive_attempts: self.receive_attempts.load(Ordering::Relaxed),
            receive_successes: self.receive_successes.load(Ordering::Relaxed),
            receive_failures: self.receive_failures.load(Ordering::Relaxed),
            message_processing_errors: self.message_processing_errors.load(Ordering::Relaxed),
            last_error_message,
        }
    }

    /// The millisecond timestamp of the last recorded error, if any.
    #[must_use]
    pub fn last_error_timestamp_ms(&self) -> Option<u64> {
        #[allow(clippy::unwrap_used)]
        self.last_error.lock().unwrap().timestamp_ms
    }

    /// Zeroes every counter and clears the last-error record.
    pub fn reset(&self) {
        self.send_attempts.store(0, Ordering::Relaxed);
        self.send_successes.store(0, Ordering::Relaxed);
        self.send_failures.store(0, Ordering::Relaxed);
        self.send_retries.store(0, Ordering::Relaxed);
        self.receive_attempts.store(0, Ordering::Relaxed);
        self.receive_successes.store(0, Ordering::Relaxed);
        self.receive_failures.store(0, Ordering::Relaxed);
        self.message_processing_errors.store(0, Ordering::Relaxed);
        #[allow(clippy::unwrap_used)]
        {
            *self.last_error.lock().unwrap() = LastError::default();
        }
    }
}
