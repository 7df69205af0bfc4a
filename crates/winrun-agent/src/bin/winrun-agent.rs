//! WinRun guest agent binary.
//!
//! # Usage
//!
//! ```bash
//! winrun-agent --config agent.toml
//! ```
//!
//! Every out-of-scope collaborator (window capture, window tracking, the
//! clipboard backend, program launch, icon extraction, input injection,
//! shortcut discovery) is wired to its `Null*` double here: the platform
//! glue that would replace them is outside this repository.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use winrun_agent::collaborators::{NullIconExtractor, NullInputInjector, NullProgramLauncher, NullShortcutProvider};
use winrun_agent::{AgentConfig, AgentService};
use winrun_clipboard::NullClipboardBackend;
use winrun_core::{Capabilities, SystemEnvironment};
use winrun_scheduler::{NullCapture, StaticWindowTracker};

/// WinRun guest agent: the streaming and control-plane process run inside
/// the virtualized guest.
#[derive(Parser, Debug)]
#[command(name = "winrun-agent")]
#[command(about = "Guest-side streaming and control plane agent")]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file. Fields left unset keep their
    /// documented default.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Derives the announced capability set from the configuration that will
/// actually be used, from the current build's feature set.
fn capabilities_for(config: &AgentConfig) -> Capabilities {
    let mut capabilities =
        Capabilities::FRAME_STREAMING | Capabilities::CLIPBOARD_SYNC | Capabilities::DRAG_AND_DROP | Capabilities::SHORTCUT_DISCOVERY;

    if config.scheduler.enable_per_window_capture {
        capabilities |= Capabilities::PER_WINDOW_CAPTURE;
    }
    if config.compression.enabled {
        capabilities |= Capabilities::FRAME_COMPRESSION;
    }

    capabilities
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = match &args.config {
        Some(path) => {
            let source = std::fs::read_to_string(path)?;
            AgentConfig::from_toml(&source)?
        }
        None => {
            tracing::warn!("no --config given; running with default configuration");
            AgentConfig::default()
        }
    };

    tracing::info!("winrun-agent starting");

    let capabilities = capabilities_for(&config);
    let service = Arc::new(AgentService::new(
        &config,
        SystemEnvironment,
        Arc::new(NullCapture),
        Arc::new(StaticWindowTracker::default()),
        NullClipboardBackend::new(),
        Arc::new(NullProgramLauncher),
        Arc::new(NullIconExtractor),
        Arc::new(NullInputInjector::new()),
        Arc::new(NullShortcutProvider),
        capabilities,
    ));

    let cancel = service.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received shutdown signal");
            cancel.cancel();
        }
    });

    service.run().await?;

    tracing::info!("winrun-agent stopped");
    Ok(())
}
