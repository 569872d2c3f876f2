//! Vision inspector: entry point.
//!
//! Streams camera frames to the remote detector and renders whatever the
//! detector sends back.  Without a capture device the synthetic test-pattern
//! camera is used, which makes the binary handy for checking a detector
//! deployment end to end.
//!
//! # Usage
//!
//! ```text
//! vision-inspector [OPTIONS]
//!
//! Options:
//!   --config <PATH>         TOML config file [default: platform config dir]
//!   --ws-host <HOST>        Detector host used against local origins
//!   --ws-endpoint <PATH>    Detector route, e.g. /vision/stream-safety
//!   --frame-rate <FPS>      Frames sent per second
//!   --origin <URL>          Origin the inspector is served from
//!   --device <ID>           Exact camera device id
//!   --duration <SECS>       Stop after this many seconds
//!   --dump-surface <PATH>   Write the last rendered frame as PNG on exit
//!   --list-devices          Print the available cameras and exit
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                | Flag             |
//! |-------------------------|------------------|
//! | `INSPECTOR_CONFIG`      | `--config`       |
//! | `INSPECTOR_WS_HOST`     | `--ws-host`      |
//! | `INSPECTOR_WS_ENDPOINT` | `--ws-endpoint`  |
//! | `INSPECTOR_FRAME_RATE`  | `--frame-rate`   |
//! | `INSPECTOR_ORIGIN`      | `--origin`       |
//! | `INSPECTOR_DEVICE`      | `--device`       |
//!
//! Precedence: CLI / environment, then the config file, then built-in
//! defaults.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vision_core::{ConfigPatch, PageOrigin, SessionConfig};
use vision_inspector::application::{InspectorSession, SessionCallbacks};
use vision_inspector::infrastructure::camera::SyntheticCameraProvider;
use vision_inspector::infrastructure::storage::config::load_config;
use vision_inspector::infrastructure::ws_transport::TungsteniteTransport;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Live camera inspector.
///
/// Sends camera frames to a remote detector over WebSocket and renders the
/// processed frames it returns.
#[derive(Debug, Parser)]
#[command(
    name = "vision-inspector",
    about = "Streams camera frames to a remote detector and renders the replies",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "INSPECTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Detector host (optionally host:port) used when the origin is local.
    #[arg(long, env = "INSPECTOR_WS_HOST")]
    ws_host: Option<String>,

    /// Detector route appended to the host.
    #[arg(long, env = "INSPECTOR_WS_ENDPOINT")]
    ws_endpoint: Option<String>,

    /// Frames sent per second.
    #[arg(long, env = "INSPECTOR_FRAME_RATE")]
    frame_rate: Option<f64>,

    /// Origin the inspector is served from, e.g. https://admin.example.com.
    #[arg(long, env = "INSPECTOR_ORIGIN")]
    origin: Option<String>,

    /// Exact camera device id.
    #[arg(long, env = "INSPECTOR_DEVICE")]
    device: Option<String>,

    /// Stop after this many seconds instead of waiting for Ctrl+C.
    #[arg(long)]
    duration: Option<u64>,

    /// Write the last rendered detector frame to this PNG file on exit.
    #[arg(long)]
    dump_surface: Option<PathBuf>,

    /// Print the available cameras and exit.
    #[arg(long)]
    list_devices: bool,
}

impl Cli {
    /// Converts the session-related flags into a patch over the file config.
    ///
    /// # Errors
    ///
    /// Returns an error if `--origin` is not an `http(s)://` URL.
    fn to_session_patch(&self, base: &SessionConfig) -> anyhow::Result<ConfigPatch> {
        let origin = match self.origin.as_deref() {
            Some(raw) => Some(
                raw.parse::<PageOrigin>()
                    .with_context(|| format!("invalid --origin '{raw}'"))?,
            ),
            None => None,
        };

        Ok(ConfigPatch {
            ws_host: self.ws_host.clone(),
            ws_endpoint: self.ws_endpoint.clone(),
            frame_rate: self.frame_rate,
            video_constraints: self
                .device
                .as_deref()
                .map(|id| base.video_constraints.with_device(id)),
            origin,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config = load_config(cli.config.as_deref()).context("failed to load config file")?;

    // RUST_LOG wins; otherwise the level from the config file.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&file_config.logging.level)),
        )
        .init();

    let config = file_config
        .session
        .apply(cli.to_session_patch(&file_config.session)?)
        .context("invalid session configuration")?;

    let camera = Arc::new(SyntheticCameraProvider::new());
    let transport = Arc::new(TungsteniteTransport::new());

    let (streaming_tx, mut streaming_rx) = watch::channel(false);
    let frames_received = Arc::new(AtomicUsize::new(0));
    let frames_counter = Arc::clone(&frames_received);
    let callbacks = SessionCallbacks::new()
        .with_streaming(move |on| {
            let _ = streaming_tx.send(on);
        })
        .with_frame(move |_| {
            frames_counter.fetch_add(1, Ordering::Relaxed);
        });

    let session = InspectorSession::new(config, callbacks, camera, transport)
        .context("failed to create inspector session")?;

    if cli.list_devices {
        for device in session.list_cameras().await? {
            println!("{}\t{}", device.device_id, device.label);
        }
        return Ok(());
    }

    info!(
        frame_rate = session.config().frame_rate,
        origin = %session.config().origin,
        "vision inspector starting"
    );
    session.start().await.context("failed to start streaming")?;

    // ── Run until Ctrl+C, --duration, or the detector hangs up ────────────────
    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => warn!("failed to listen for Ctrl+C signal: {e}"),
        },
        () = run_for(cli.duration.map(Duration::from_secs)) => {
            info!("duration elapsed, shutting down");
        }
        _ = streaming_rx.wait_for(|on| !*on) => {
            info!("streaming ended");
        }
    }

    session.stop();

    if let Some(path) = &cli.dump_surface {
        session
            .surface()
            .save_png(path)
            .with_context(|| format!("failed to write surface to {}", path.display()))?;
        info!("rendered surface written to {}", path.display());
    }

    session.destroy();
    info!(
        frames_received = frames_received.load(Ordering::Relaxed),
        "vision inspector stopped"
    );
    Ok(())
}

async fn run_for(duration: Option<Duration>) {
    match duration {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending().await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
