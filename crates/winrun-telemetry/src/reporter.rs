//! Periodic `TelemetryReport` emission.

use winrun_core::Environment;
use winrun_proto::Message;
use winrun_proto::TelemetryReport;

use crate::metrics::ChannelMetrics;
use crate::sink::QueueWriter;

/// Builds and enqueues a [`TelemetryReport`] from `metrics`, stamped with
/// `uptime_ms` elapsed since `started_at`.
///
/// Returns `true` if a queue writer was bound and accepted the write
/// (best-effort, not retried); `false` if `writer` is `None` or the queue
/// rejected the write. Per spec this call "emits nothing when no outbound
/// queue is bound" — `None` is the expected steady state before the agent's
/// telemetry timer is wired up.
pub fn report_telemetry<E: Environment>(
    writer: Option<&impl QueueWriter>,
    metrics: &ChannelMetrics,
    env: &E,
    started_at: std::time::Instant,
) -> bool {
    let Some(writer) = writer else {
        return false;
    };

    let uptime_ms = env.now().saturating_duration_since(started_at).as_millis() as u64;
    let report = TelemetryReport { snapshot: metrics.snapshot().to_wire(), uptime_ms };

    writer.try_write(Message::TelemetryReport(report)).is_ok()
}
