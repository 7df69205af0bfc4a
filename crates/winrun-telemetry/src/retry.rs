//! Bounded-retry outbound writes.

use winrun_core::{CancellationToken, Environment};
use winrun_proto::Message;

use crate::metrics::ChannelMetrics;
use crate::policy::RetryPolicy;
use crate::sink::{recover_message, QueueWriter};

/// Writes `message` onto `writer`, retrying transient failures under
/// `policy` until it succeeds, the queue closes, `cancel` fires, or the
/// attempt budget is exhausted.
///
/// Every attempt and its outcome are recorded on `metrics`. `env` supplies
/// the clock used to wait out the backoff delay between attempts and the
/// timestamp attached to any recorded failure.
pub async fn send_with_retry<E: Environment>(
    writer: &impl QueueWriter,
    message: Message,
    policy: RetryPolicy,
    env: &E,
    cancel: &CancellationToken,
    metrics: &ChannelMetrics,
) -> bool {
    metrics.record_send_attempt();

    let started_at = env.now();
    let mut pending = message;
    let mut attempt = 1u32;

    loop {
        if cancel.is_cancelled() {
            metrics.record_send_failure("cancelled before send", uptime_ms(env, started_at));
            return false;
        }

        match writer.try_write(pending) {
            Ok(()) => {
                metrics.record_send_success();
                return true;
            }
            Err(error) => {
                let description = error.describe();
                let (message, closed) = recover_message(error);
                pending = message;

                if closed {
                    metrics.record_send_failure(description, uptime_ms(env, started_at));
                    return false;
                }

                if attempt >= policy.max_attempts {
                    metrics.record_send_failure(description, uptime_ms(env, started_at));
                    return false;
                }

                metrics.record_send_retry();
                let delay = policy.delay_for_retry(attempt);

                tokio::select! {
                    () = env.sleep(delay) => {}
                    () = cancel.cancelled() => {
                        metrics.record_send_failure("cancelled during backoff", uptime_ms(env, started_at));
                        return false;
                    }
                }

                attempt += 1;
            }
        }
    }
}

fn uptime_ms<E: Environment>(env: &E, started_at: std::time::Instant) -> u64 {
    env.now().saturating_duration_since(started_at).as_millis() as u64
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use winrun_core::ManualEnvironment;
    use winrun_proto::Message;

    use super::*;
    use crate::sink::SendError;

    struct FlakyWriter {
        failures_remaining: AtomicUsize,
    }

    impl QueueWriter for FlakyWriter {
        fn try_write(&self, message: Message) -> Result<(), SendError> {
            if self.failures_remaining.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                if n == 0 {
                    None
                } else {
                    Some(n - 1)
                }
            }).is_ok()
            {
                Err(SendError::Full(message))
            } else {
                Ok(())
            }
        }
    }

    struct AlwaysClosed;

    impl QueueWriter for AlwaysClosed {
        fn try_write(&self, message: Message) -> Result<(), SendError> {
            Err(SendError::Closed(message))
        }
    }

    fn ack(message_id: u64) -> Message {
        Message::Ack(winrun_proto::payloads::Ack { message_id, success: true, error_message: None })
    }

    #[tokio::test]
    async fn succeeds_immediately_when_the_queue_accepts_the_first_write() {
        let writer = FlakyWriter { failures_remaining: AtomicUsize::new(0) };
        let env = ManualEnvironment::new();
        let cancel = CancellationToken::new();
        let metrics = ChannelMetrics::new();

        let ok = send_with_retry(&writer, ack(1), RetryPolicy::default_policy(), &env, &cancel, &metrics).await;

        assert!(ok);
        assert_eq!(metrics.snapshot().send_successes, 1);
        assert_eq!(metrics.snapshot().send_retries, 0);
    }

    #[tokio::test]
    async fn retries_transient_failures_until_the_queue_accepts() {
        let writer = FlakyWriter { failures_remaining: AtomicUsize::new(2) };
        let env = ManualEnvironment::new();
        let cancel = CancellationToken::new();
        let metrics = ChannelMetrics::new();

        let ok = send_with_retry(&writer, ack(1), RetryPolicy::default_policy(), &env, &cancel, &metrics).await;

        assert!(ok);
        assert_eq!(metrics.snapshot().send_retries, 2);
    }

    #[tokio::test]
    async fn no_retry_policy_fails_fast_on_one_transient_failure() {
        let writer = FlakyWriter { failures_remaining: AtomicUsize::new(1) };
        let env = ManualEnvironment::new();
        let cancel = CancellationToken::new();
        let metrics = ChannelMetrics::new();

        let ok = send_with_retry(&writer, ack(1), RetryPolicy::no_retry(), &env, &cancel, &metrics).await;

        assert!(!ok);
        assert_eq!(metrics.snapshot().send_retries, 0);
        assert_eq!(metrics.snapshot().send_failures, 1);
    }

    #[tokio::test]
    async fn closed_queue_fails_without_retrying() {
        let env = ManualEnvironment::new();
        let cancel = CancellationToken::new();
        let metrics = ChannelMetrics::new();

        let ok = send_with_retry(&AlwaysClosed, ack(1), RetryPolicy::default_policy(), &env, &cancel, &metrics).await;

        assert!(!ok);
        assert_eq!(metrics.snapshot().send_retries, 0);
        assert_eq!(metrics.snapshot().send_failures, 1);
    }

    #[tokio::test]
    async fn cancellation_aborts_before_the_first_attempt() {
        let writer = FlakyWriter { failures_remaining: AtomicUsize::new(0) };
        let env = ManualEnvironment::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let metrics = ChannelMetrics::new();

        let ok = send_with_retry(&writer, ack(1), RetryPolicy::default_policy(), &env, &cancel, &metrics).await;

        assert!(!ok);
        assert_eq!(metrics.snapshot().send_attempts, 1);
    }

    #[tokio::test]
    async fn exhausting_the_attempt_budget_fails() {
        let writer = FlakyWriter { failures_remaining: AtomicUsize::new(100) };
        let env = ManualEnvironment::new();
        let cancel = CancellationToken::new();
        let metrics = ChannelMetrics::new();

        let ok = send_with_retry(&writer, ack(1), RetryPolicy::critical(), &env, &cancel, &metrics).await;

        assert!(!ok);
        assert_eq!(metrics.snapshot().send_retries, u64::from(RetryPolicy::critical().max_attempts) - 1);
    }
}
