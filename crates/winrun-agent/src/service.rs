//! Async runtime shell (C10): owns the inbound/outbound `tokio::mpsc`
//! queues, spawns the three long-lived threads (the
//! inbound dispatcher, the capture scheduler, and the session-heartbeat
//! timer), optionally a telemetry-report timer, and is the only place
//! `tokio::spawn` appears in this crate.
//!
//! [`AgentDriver`] decides; [`AgentService`] is the part that has a clock,
//! a channel, and a background task to drive them with — the same split
//! `lockframe_server::Server` keeps over `ServerDriver`.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use winrun_clipboard::{ClipboardBackend, ClipboardSync};
use winrun_core::{CancellationToken, Capabilities, Environment};
use winrun_dragdrop::DragDropStaging;
use winrun_framebuffer::{FrameBufferManager, FrameCompressor};
use winrun_proto::Message;
use winrun_scheduler::{FrameStreamingScheduler, WindowCapture, WindowTracker};
use winrun_session::SessionManager;
use winrun_shm::ShmAllocator;
use winrun_telemetry::{report_telemetry, send_with_retry, ChannelMetrics, RetryPolicy};

use crate::collaborators::{IconExtractor, InputInjector, ProgramLauncher, ShortcutProvider};
use crate::config::{AgentConfig, BufferModeKind};
use crate::driver::{AgentAction, AgentDriver};
use crate::error::AgentError;

/// Capacity of the inbound and outbound `tokio::mpsc` channels.
const QUEUE_CAPACITY: usize = 256;

/// How long a drag-and-drop staging session may sit untouched before
/// [`AgentService`]'s heartbeat timer sweeps it via
/// "cleanup_stale_sessions" without a spec-mandated default.
const DRAGDROP_STALE_AGE: Duration = Duration::from_secs(300);

/// Owns the composed agent: [`AgentDriver`] plus the scheduler, queues, and
/// background tasks that drive it against real I/O.
///
/// Generic over the four out-of-scope collaborators the core crates leave
/// injected: the clock/RNG (`E`), window capture (`C`), window tracking
/// (`T`), and the clipboard backend (`B`).
pub struct AgentService<E, C, T, B>
where
    E: Environment,
    C: WindowCapture + 'static,
    T: WindowTracker + 'static,
    B: ClipboardBackend + 'static,
{
    env: E,
    driver: Arc<AsyncMutex<AgentDriver<E, B>>>,
    scheduler: Arc<FrameStreamingScheduler<E, C, T, mpsc::Sender<Message>>>,
    inbound_tx: mpsc::Sender<Message>,
    inbound_rx: AsyncMutex<Option<mpsc::Receiver<Message>>>,
    outbound_tx: mpsc::Sender<Message>,
    outbound_rx: StdMutex<Option<mpsc::Receiver<Message>>>,
    channel_metrics: Arc<ChannelMetrics>,
    retry_policy: RetryPolicy,
    heartbeat_interval: Duration,
    dragdrop_max_age: Duration,
    telemetry_report_interval: Option<Duration>,
    cancel: CancellationToken,
    running: std::sync::atomic::AtomicBool,
}

impl<E, C, T, B> AgentService<E, C, T, B>
where
    E: Environment,
    C: WindowCapture + 'static,
    T: WindowTracker + 'static,
    B: ClipboardBackend + 'static,
{
    /// Composes every component crate behind one service. Allocator
    /// initialization failure is logged and non-fatal: frame
    /// buffers silently fall back to their local-heap path.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &AgentConfig,
        env: E,
        capture: Arc<C>,
        tracker: Arc<T>,
        clipboard_backend: B,
        launcher: Arc<dyn ProgramLauncher>,
        icon: Arc<dyn IconExtractor>,
        input: Arc<dyn InputInjector>,
        shortcuts: Arc<dyn ShortcutProvider>,
        capabilities: Capabilities,
    ) -> Self {
        let allocator = Arc::new(ShmAllocator::new());
        if !allocator.initialize(&config.shared_memory.to_allocator_config()) {
            tracing::warn!(
                path = %config.shared_memory.path.display(),
                "shared memory allocator failed to initialize; frame buffers will use the local heap fallback"
            );
        }

        let buffers = FrameBufferManager::new(Arc::clone(&allocator), config.frame_buffer.to_frame_buffer_config());
        let compressor = matches!(config.frame_buffer.buffer_mode, BufferModeKind::Compressed)
            .then(|| FrameCompressor::new(config.compression.to_compression_config()));

        let (inbound_tx, inbound_rx) = mpsc::channel(QUEUE_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::channel(QUEUE_CAPACITY);

        let channel_metrics = Arc::new(ChannelMetrics::new());
        let retry_policy = config.retry_preset.resolve();

        let scheduler = Arc::new(FrameStreamingScheduler::new(
            config.scheduler.to_scheduler_config(),
            env.clone(),
            capture,
            tracker,
            buffers,
            compressor,
            Arc::new(outbound_tx.clone()),
            Arc::clone(&channel_metrics),
            retry_policy,
        ));

        let dragdrop = DragDropStaging::new(config.drag_drop.to_dragdrop_config(), env.clone());
        let session = SessionManager::new(config.session_manager_config(), env.now());
        let clipboard = ClipboardSync::new(clipboard_backend);
        let driver =
            AgentDriver::new(session, clipboard, dragdrop, launcher, icon, input, shortcuts, capabilities);

        Self {
            env,
            driver: Arc::new(AsyncMutex::new(driver)),
            scheduler,
            inbound_tx,
            inbound_rx: AsyncMutex::new(Some(inbound_rx)),
            outbound_tx,
            outbound_rx: StdMutex::new(Some(outbound_rx)),
            channel_metrics,
            retry_policy,
            heartbeat_interval: Duration::from_millis(config.session_heartbeat_interval_ms.max(1)),
            dragdrop_max_age: DRAGDROP_STALE_AGE,
            telemetry_report_interval: (config.telemetry_report_interval_ms > 0)
                .then(|| Duration::from_millis(config.telemetry_report_interval_ms)),
            cancel: CancellationToken::new(),
            running: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// A sender the channel-reader (out of scope for this crate) uses
    /// to push decoded messages onto the inbound queue.
    #[must_use]
    pub fn inbound_sender(&self) -> mpsc::Sender<Message> {
        self.inbound_tx.clone()
    }

    /// A sender any ad-hoc caller can enqueue an outbound message through,
    /// alongside the three long-lived threads ("the outbound
    /// queue has many producers").
    #[must_use]
    pub fn outbound_sender(&self) -> mpsc::Sender<Message> {
        self.outbound_tx.clone()
    }

    /// Takes the outbound queue's consuming half, for the channel writer
    /// (out of scope here) to serialize and transmit. Returns `None` if
    /// already taken.
    pub fn take_outbound_receiver(&self) -> Option<mpsc::Receiver<Message>> {
        self.outbound_rx.lock().unwrap_or_else(std::sync::PoisonError::into_inner).take()
    }

    /// A clone of this service's cancellation token, for wiring an external
    /// shutdown signal (e.g. `Ctrl-C`) to [`Self::run`]'s exit.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// A snapshot of the channel telemetry accumulated so far.
    #[must_use]
    pub fn metrics(&self) -> winrun_telemetry::MetricsSnapshot {
        self.channel_metrics.snapshot()
    }

    /// Sends the capability announcement, starts the capture scheduler,
    /// spawns the inbound dispatcher and session-heartbeat threads (plus
    /// the telemetry-report thread if configured), and blocks until
    /// [`Self::cancellation_token`] is cancelled — either externally, or
    /// from within by a dispatched `Shutdown` request.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AlreadyRunning`] if called more than once on
    /// the same service.
    pub async fn run(self: &Arc<Self>) -> Result<(), AgentError> {
        if self.running.swap(true, std::sync::atomic::Ordering::SeqCst) {
            return Err(AgentError::AlreadyRunning);
        }

        let Some(inbound_rx) = self.inbound_rx.lock().await.take() else {
            return Err(AgentError::AlreadyRunning);
        };

        let announce = self.driver.lock().await.capability_announce();
        send_with_retry(&self.outbound_tx, announce, self.retry_policy, &self.env, &self.cancel, &self.channel_metrics)
            .await;

        self.scheduler.start();

        let mut handles: Vec<JoinHandle<()>> =
            vec![tokio::spawn(Self::dispatch_loop(Arc::clone(self), inbound_rx)), tokio::spawn(Self::heartbeat_loop(Arc::clone(self)))];
        if self.telemetry_report_interval.is_some() {
            handles.push(tokio::spawn(Self::telemetry_loop(Arc::clone(self))));
        }

        self.cancel.cancelled().await;
        self.scheduler.dispose().await;

        for handle in handles {
            let _ = handle.await;
        }

        Ok(())
    }

    /// Requests a clean shutdown, equivalent to receiving a `Shutdown`
    /// message: cancels every long-lived thread and lets [`Self::run`]
    /// return once they finish draining.
    pub fn request_shutdown(&self) {
        self.cancel.cancel();
    }

    async fn dispatch_loop(self: Arc<Self>, mut inbound_rx: mpsc::Receiver<Message>) {
        loop {
            tokio::select! {
                received = inbound_rx.recv() => {
                    let Some(message) = received else { break };
                    self.handle_inbound(message).await;
                }
                () = self.cancel.cancelled() => {
                    while let Ok(message) = inbound_rx.try_recv() {
                        self.handle_inbound(message).await;
                    }
                    break;
                }
            }
        }
    }

    async fn handle_inbound(&self, message: Message) {
        self.channel_metrics.record_receive_attempt();
        let actions = {
            let mut driver = self.driver.lock().await;
            driver.process_inbound(message, self.env.now())
        };
        self.channel_metrics.record_receive_success();
        self.perform(actions).await;
    }

    async fn heartbeat_loop(self: Arc<Self>) {
        let mut next_tick = self.env.now();
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let now = self.env.now();
            if now < next_tick {
                let wait = next_tick - now;
                tokio::select! {
                    () = self.env.sleep(wait) => {}
                    () = self.cancel.cancelled() => break,
                }
            }
            next_tick = self.env.now() + self.heartbeat_interval;

            self.on_heartbeat_tick().await;

            tokio::task::yield_now().await;
        }
    }

    async fn on_heartbeat_tick(&self) {
        let now = self.env.now();
        let (actions, cleaned_up) = {
            let mut driver = self.driver.lock().await;
            let actions = driver.heartbeat_tick(now);
            let cleaned_up = driver.cleanup_stale_dragdrop(self.dragdrop_max_age, now);
            (actions, cleaned_up)
        };
        if !cleaned_up.is_empty() {
            tracing::debug!(count = cleaned_up.len(), "swept stale drag-and-drop staging sessions");
        }
        self.perform(actions).await;
    }

    async fn telemetry_loop(self: Arc<Self>) {
        let Some(interval_duration) = self.telemetry_report_interval else { return };
        let started_at = self.env.now();
        let mut next_tick = self.env.now();

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let now = self.env.now();
            if now < next_tick {
                let wait = next_tick - now;
                tokio::select! {
                    () = self.env.sleep(wait) => {}
                    () = self.cancel.cancelled() => break,
                }
            }
            next_tick = self.env.now() + interval_duration;

            report_telemetry(Some(&self.outbound_tx), &self.channel_metrics, &self.env, started_at);

            tokio::task::yield_now().await;
        }
    }

    async fn perform(&self, actions: Vec<AgentAction>) {
        for action in actions {
            match action {
                AgentAction::Send(message) => {
                    send_with_retry(
                        &self.outbound_tx,
                        message,
                        self.retry_policy,
                        &self.env,
                        &self.cancel,
                        &self.channel_metrics,
                    )
                    .await;
                }
                AgentAction::Shutdown => self.cancel.cancel(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use winrun_clipboard::NullClipboardBackend;
    use winrun_core::ManualEnvironment;
    use winrun_proto::payloads::{LaunchProgram, Shutdown};
    use winrun_scheduler::{NullCapture, StaticWindowTracker};

    use super::*;
    use crate::collaborators::{NullIconExtractor, NullInputInjector, NullProgramLauncher, NullShortcutProvider};

    fn config(dir: &std::path::Path) -> AgentConfig {
        let mut config = AgentConfig::default();
        config.shared_memory.path = dir.join("frames.shm");
        config.drag_drop.staging_root = dir.join("staging");
        config.session_heartbeat_interval_ms = 5;
        config
    }

    fn service(
        dir: &std::path::Path,
    ) -> Arc<AgentService<ManualEnvironment, NullCapture, StaticWindowTracker, NullClipboardBackend>> {
        Arc::new(AgentService::new(
            &config(dir),
            ManualEnvironment::new(),
            Arc::new(NullCapture),
            Arc::new(StaticWindowTracker::default()),
            NullClipboardBackend::new(),
            Arc::new(NullProgramLauncher),
            Arc::new(NullIconExtractor),
            Arc::new(NullInputInjector::new()),
            Arc::new(NullShortcutProvider),
            Capabilities::CLIPBOARD_SYNC,
        ))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn run_announces_capabilities_before_anything_else() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = service(dir.path());
        let mut outbound = service.take_outbound_receiver().expect("outbound receiver");

        let handle = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.run().await }
        });

        let first = outbound.recv().await.expect("capability announce");
        assert!(matches!(first, Message::CapabilityAnnounce(_)));

        service.request_shutdown();
        handle.await.expect("run task").expect("run result");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn inbound_launch_program_produces_an_outbound_ack() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = service(dir.path());
        let mut outbound = service.take_outbound_receiver().expect("outbound receiver");
        let inbound = service.inbound_sender();

        let handle = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.run().await }
        });

        let _announce = outbound.recv().await.expect("capability announce");
        inbound
            .send(Message::LaunchProgram(LaunchProgram {
                message_id: 1,
                path: "C:\\App.exe".to_string(),
                arguments: Vec::new(),
                working_directory: String::new(),
            }))
            .await
            .expect("send launch program");

        let ack = outbound.recv().await.expect("ack");
        match ack {
            Message::Ack(ack) => {
                assert_eq!(ack.message_id, 1);
                assert!(!ack.success);
            }
            other => panic!("unexpected message: {other:?}"),
        }

        service.request_shutdown();
        handle.await.expect("run task").expect("run result");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn shutdown_message_stops_the_run_loop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = service(dir.path());
        let mut outbound = service.take_outbound_receiver().expect("outbound receiver");
        let inbound = service.inbound_sender();

        let handle = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.run().await }
        });

        let _announce = outbound.recv().await.expect("capability announce");
        inbound.send(Message::Shutdown(Shutdown { message_id: 9 })).await.expect("send shutdown");

        let ack = outbound.recv().await.expect("ack");
        assert!(matches!(ack, Message::Ack(_)));

        tokio::time::timeout(Duration::from_secs(5), handle).await.expect("run task did not exit").expect("run task").expect("run result");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn running_twice_reports_already_running() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = service(dir.path());

        let handle = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.run().await }
        });

        tokio::task::yield_now().await;
        let second = service.run().await;
        assert!(matches!(second, Err(AgentError::AlreadyRunning)));

        service.request_shutdown();
        handle.await.expect("run task").expect("run result");
    }
}
