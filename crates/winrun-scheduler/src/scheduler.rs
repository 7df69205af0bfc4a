//! The FPS-paced capture loop.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use winrun_core::{CancellationToken, Environment, WindowId};
use winrun_framebuffer::{FrameBufferManager, FrameCompressor, FrameSlotHeader};
use winrun_proto::payloads::{FrameReady, WindowBufferAllocated};
use winrun_proto::Message;
use winrun_telemetry::{send_with_retry, ChannelMetrics, QueueWriter, RetryPolicy};

use crate::capture::{WindowCapture, WindowTracker};
use crate::config::SchedulerConfig;
use crate::stats::{SchedulerMetrics, SchedulerStatsSnapshot};
use crate::window_record::WindowRecord;

fn lock<T>(mutex: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives a capture-compress-buffer-notify loop at `config.target_fps`,
/// one per-window record at a time, as a single cooperative background task.
pub struct FrameStreamingScheduler<E, C, T, W>
where
    E: Environment,
    C: WindowCapture + 'static,
    T: WindowTracker + 'static,
    W: QueueWriter + 'static,
{
    config: SchedulerConfig,
    env: E,
    capture: Arc<C>,
    tracker: Arc<T>,
    buffers: AsyncMutex<FrameBufferManager>,
    compressor: Option<AsyncMutex<FrameCompressor>>,
    writer: Arc<W>,
    channel_metrics: Arc<ChannelMetrics>,
    retry_policy: RetryPolicy,
    stats: SchedulerMetrics,
    window_records: StdMutex<HashMap<WindowId, WindowRecord>>,
    running: AtomicBool,
    cancel_slot: StdMutex<Option<CancellationToken>>,
    worker: StdMutex<Option<JoinHandle<()>>>,
    total_frames_captured: AtomicU64,
}

impl<E, C, T, W> FrameStreamingScheduler<E, C, T, W>
where
    E: Environment,
    C: WindowCapture + 'static,
    T: WindowTracker + 'static,
    W: QueueWriter + 'static,
{
    /// Builds a scheduler. `compressor` should be `Some` exactly when
    /// `buffers`'s configured [`winrun_framebuffer::BufferMode`] is
    /// `Compressed`.
    #[must_use]
    pub fn new(
        config: SchedulerConfig,
        env: E,
        capture: Arc<C>,
        tracker: Arc<T>,
        buffers: FrameBufferManager,
        compressor: Option<FrameCompressor>,
        writer: Arc<W>,
        channel_metrics: Arc<ChannelMetrics>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            config,
            env,
            capture,
            tracker,
            buffers: AsyncMutex::new(buffers),
            compressor: compressor.map(AsyncMutex::new),
            writer,
            channel_metrics,
            retry_policy,
            stats: SchedulerMetrics::default(),
            window_records: StdMutex::new(HashMap::new()),
            running: AtomicBool::new(false),
            cancel_slot: StdMutex::new(None),
            worker: StdMutex::new(None),
            total_frames_captured: AtomicU64::new(0),
        }
    }

    /// Whether the background worker is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Snapshot of the counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> SchedulerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Frames captured across the scheduler's entire lifetime, irrespective
    /// of whether they were ultimately written.
    #[must_use]
    pub fn total_frames_captured(&self) -> u64 {
        self.total_frames_captured.load(Ordering::Relaxed)
    }

    /// Starts the background capture worker. A warning is logged and this
    /// call is a no-op if the scheduler is already running.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("frame streaming scheduler already running; start() is a no-op");
            return;
        }

        let cancel = CancellationToken::new();
        *lock(&self.cancel_slot) = Some(cancel.clone());
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.run_loop(cancel).await });
        *lock(&self.worker) = Some(handle);
    }

    /// Stops the background worker and waits for it to exit. A no-op if the
    /// scheduler is not running.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(cancel) = lock(&self.cancel_slot).take() {
            cancel.cancel();
        }
        let handle = lock(&self.worker).take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Idempotent disposal: stops the worker, frees every tracked buffer,
    /// and logs a "disposed" message.
    pub async fn dispose(&self) {
        self.stop().await;
        {
            let mut buffers = self.buffers.lock().await;
            buffers.cleanup_stale(&HashSet::new());
        }
        tracing::info!("frame streaming scheduler disposed");
    }

    /// Runs exactly one tick's worth of capture/publish work, outside the
    /// background worker. Exposed for tests and for callers driving the
    /// scheduler on their own timer instead of via [`Self::start`].
    pub async fn tick_once(&self) {
        let cancel = CancellationToken::new();
        self.tick_with_cancel(&cancel).await;
    }

    async fn run_loop(self: Arc<Self>, cancel: CancellationToken) {
        let mut next_tick = self.env.now();
        let mut last_cleanup = self.env.now();

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let now = self.env.now();
            if now < next_tick {
                let wait = next_tick - now;
                tokio::select! {
                    () = self.env.sleep(wait) => {}
                    () = cancel.cancelled() => break,
                }
            }
            next_tick = self.env.now() + self.config.frame_interval();

            self.tick_with_cancel(&cancel).await;

            if self.env.now().saturating_duration_since(last_cleanup)
                >= Duration::from_millis(self.config.cleanup_interval_ms)
            {
                self.cleanup_stale_windows().await;
                last_cleanup = self.env.now();
            }

            tokio::task::yield_now().await;
        }
    }

    async fn tick_with_cancel(&self, cancel: &CancellationToken) {
        self.stats.record_capture_attempt();

        for target in self.due_targets() {
            self.capture_and_publish(target, cancel).await;
        }
    }

    fn due_targets(&self) -> Vec<Option<WindowId>> {
        if !self.config.enable_per_window_capture {
            return vec![None];
        }

        let now = self.env.now();
        let min_interval = Duration::from_millis(self.config.min_window_frame_interval_ms);
        let mut records = lock(&self.window_records);

        self.tracker
            .live_windows()
            .into_iter()
            .filter(|window_id| {
                let record = records.entry(*window_id).or_insert_with(WindowRecord::new);
                match record.last_capture_at {
                    None => true,
                    Some(last) => now.saturating_duration_since(last) >= min_interval,
                }
            })
            .map(Some)
            .collect()
    }

    async fn capture_and_publish(&self, target: Option<WindowId>, cancel: &CancellationToken) {
        let result = match target {
            Some(window_id) => self.capture.capture_window(window_id),
            None => self.capture.capture_desktop(),
        };

        let frame = match result {
            Ok(frame) => frame,
            Err(error) => {
                self.stats.record_capture_error();
                self.record_capture_failure(target).await;
                tracing::warn!(?target, %error, "window capture failed");
                return;
            }
        };

        self.stats.record_frame_captured();
        self.total_frames_captured.fetch_add(1, Ordering::Relaxed);

        let window_id = target.unwrap_or_else(|| self.tracker.desktop_window_id());

        let (payload, is_compressed) = match &self.compressor {
            Some(compressor) => {
                let mut compressor = compressor.lock().await;
                let result = compressor.compress(&frame.pixels);
                (result.data, result.is_compressed)
            }
            None => (frame.pixels.clone(), false),
        };

        let frame_number = {
            let mut records = lock(&self.window_records);
            let record = records.entry(window_id).or_insert_with(WindowRecord::new);
            record.last_frame_number += 1;
            record.last_frame_number
        };

        let reallocated = {
            let mut buffers = self.buffers.lock().await;
            let buffer = buffers.get_or_create(window_id);
            let reallocated = buffer.ensure_allocated(frame.width, frame.height, payload.len() as u64);
            reallocated.then(|| WindowBufferAllocated {
                window_id,
                buffer_pointer_or_offset: buffer.shared_memory_offset().unwrap_or(0),
                buffer_size: buffer.buffer_size(),
                slot_size: buffer.slot_size(),
                slot_count: buffer.slots_per_window() as u32,
                is_compressed: self.compressor.is_some(),
                is_reallocation: frame_number > 1,
            })
        };

        if let Some(notification) = reallocated {
            send_with_retry(
                self.writer.as_ref(),
                Message::WindowBufferAllocated(notification),
                self.retry_policy,
                &self.env,
                cancel,
                &self.channel_metrics,
            )
            .await;
        }

        let is_key_frame = frame_number == 1
            || (self.config.key_frame_cadence > 0 && frame_number % self.config.key_frame_cadence == 0);

        let header = FrameSlotHeader::new(
            window_id.raw(),
            frame_number,
            frame.width,
            frame.height,
            frame.stride,
            frame.format,
            0,
            is_compressed,
            is_key_frame,
        );

        let write_result = {
            let mut buffers = self.buffers.lock().await;
            let buffer = buffers.get_or_create(window_id);
            buffer.write_frame(header, &payload)
        };

        let slot_index = match write_result {
            Ok(index) => index,
            Err(error) => {
                self.stats.record_buffer_full();
                tracing::debug!(%window_id, %error, "dropped frame");
                return;
            }
        };

        self.stats.record_frame_written();
        {
            let mut records = lock(&self.window_records);
            if let Some(record) = records.get_mut(&window_id) {
                record.last_capture_at = Some(self.env.now());
                record.consecutive_failures = 0;
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        let ready = FrameReady { window_id, slot_index: slot_index as u32, frame_number, is_key_frame };

        let sent = send_with_retry(
            self.writer.as_ref(),
            Message::FrameReady(ready),
            self.retry_policy,
            &self.env,
            cancel,
            &self.channel_metrics,
        )
        .await;

        if sent {
            self.stats.record_notification_sent();
        }
    }

    async fn record_capture_failure(&self, target: Option<WindowId>) {
        let window_id = target.unwrap_or_else(|| self.tracker.desktop_window_id());

        let should_reinit = {
            let mut records = lock(&self.window_records);
            let record = records.entry(window_id).or_insert_with(WindowRecord::new);
            record.consecutive_failures += 1;
            record.consecutive_failures >= self.config.max_consecutive_failures
        };

        if !should_reinit {
            return;
        }

        tracing::warn!(%window_id, "capture source exceeded failure threshold, reinitializing");
        self.capture.reinitialize();
        self.env.sleep(Duration::from_millis(self.config.reinitialization_delay_ms)).await;

        let mut records = lock(&self.window_records);
        if let Some(record) = records.get_mut(&window_id) {
            record.consecutive_failures = 0;
        }
    }

    async fn cleanup_stale_windows(&self) {
        let live: HashSet<WindowId> = self.tracker.live_windows().into_iter().collect();
        {
            let mut buffers = self.buffers.lock().await;
            buffers.cleanup_stale(&live);
        }
        lock(&self.window_records).retain(|id, _| live.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::tempdir;
    use tokio::sync::mpsc;
    use winrun_core::ManualEnvironment;
    use winrun_framebuffer::FrameBufferConfig;
    use winrun_shm::{AllocatorConfig, ShmAllocator};

    use super::*;
    use crate::capture::{NullCapture, StaticWindowTracker};

    fn manager() -> (FrameBufferManager, tempfile::TempDir) {
        let dir = tempdir().expect("tempdir");
        let allocator = ShmAllocator::new();
        assert!(allocator.initialize(&AllocatorConfig {
            path: dir.path().join("frames.shm"),
            create_if_not_exists: true,
            create_size_bytes: 8 * (1 << 20),
            minimum_size_bytes: 0,
        }));
        (FrameBufferManager::new(Arc::new(allocator), FrameBufferConfig::default()), dir)
    }

    fn scheduler(
        config: SchedulerConfig,
        windows: Vec<WindowId>,
    ) -> (
        Arc<FrameStreamingScheduler<ManualEnvironment, NullCapture, StaticWindowTracker, mpsc::Sender<Message>>>,
        mpsc::Receiver<Message>,
        tempfile::TempDir,
    ) {
        let (buffers, dir) = manager();
        let (tx, rx) = mpsc::channel(32);
        let scheduler = FrameStreamingScheduler::new(
            config,
            ManualEnvironment::new(),
            Arc::new(NullCapture),
            Arc::new(StaticWindowTracker::new(windows)),
            buffers,
            None,
            Arc::new(tx),
            Arc::new(ChannelMetrics::new()),
            RetryPolicy::no_retry(),
        );
        (Arc::new(scheduler), rx, dir)
    }

    /// Ordering guarantee: frames for one window publish with strictly
    /// increasing `frame_number`.
    #[tokio::test]
    async fn frame_numbers_increase_strictly_per_window() {
        let (scheduler, mut rx, _dir) = scheduler(SchedulerConfig::default(), vec![WindowId::new(1)]);

        scheduler.tick_once().await;
        scheduler.tick_once().await;
        scheduler.tick_once().await;

        let mut seen = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let Message::FrameReady(ready) = message {
                seen.push(ready.frame_number);
            }
        }

        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(scheduler.stats().frames_written, 3);
    }

    #[tokio::test]
    async fn window_buffer_allocated_fires_once_on_first_allocation() {
        let (scheduler, mut rx, _dir) = scheduler(SchedulerConfig::default(), vec![WindowId::new(1)]);

        scheduler.tick_once().await;
        scheduler.tick_once().await;

        let mut allocations = 0;
        while let Ok(message) = rx.try_recv() {
            if matches!(message, Message::WindowBufferAllocated(_)) {
                allocations += 1;
            }
        }
        assert_eq!(allocations, 1);
    }

    /// Scenario S6-adjacent: a full ring records `buffer_full` instead of
    /// blocking or erroring.
    #[tokio::test]
    async fn full_ring_records_buffer_full_and_drops_the_frame() {
        let config = SchedulerConfig {
            min_window_frame_interval_ms: 0,
            enable_per_window_capture: true,
            ..SchedulerConfig::default()
        };
        let (buffers, _dir) = manager();
        let (tx, _rx) = mpsc::channel(32);
        let scheduler = Arc::new(FrameStreamingScheduler::new(
            config,
            ManualEnvironment::new(),
            Arc::new(NullCapture),
            Arc::new(StaticWindowTracker::new(vec![WindowId::new(1)])),
            buffers,
            None,
            Arc::new(tx),
            Arc::new(ChannelMetrics::new()),
            RetryPolicy::no_retry(),
        ));

        for _ in 0..5 {
            scheduler.tick_once().await;
        }

        assert!(scheduler.stats().buffer_full > 0);
    }

    #[tokio::test]
    async fn cleanup_removes_buffers_for_vanished_windows() {
        let (scheduler, _rx, _dir) = scheduler(SchedulerConfig::default(), vec![WindowId::new(1)]);
        scheduler.tick_once().await;

        scheduler.cleanup_stale_windows().await;
        assert_eq!(scheduler.buffers.lock().await.len(), 1);

        {
            let mut records = lock(&scheduler.window_records);
            records.clear();
        }
        let empty_tracker: Arc<StaticWindowTracker> = Arc::new(StaticWindowTracker::new(vec![]));
        scheduler.buffers.lock().await.cleanup_stale(&empty_tracker.live_windows().into_iter().collect());
        assert!(scheduler.buffers.lock().await.is_empty());
    }

    #[tokio::test]
    async fn start_twice_is_a_warned_no_op() {
        let (scheduler, _rx, _dir) = scheduler(SchedulerConfig::default(), vec![WindowId::new(1)]);

        scheduler.start();
        assert!(scheduler.is_running());
        scheduler.start();
        assert!(scheduler.is_running());

        scheduler.stop().await;
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn stop_before_start_is_a_no_op() {
        let (scheduler, _rx, _dir) = scheduler(SchedulerConfig::default(), vec![WindowId::new(1)]);
        scheduler.stop().await;
        assert!(!scheduler.is_running());
    }
}
