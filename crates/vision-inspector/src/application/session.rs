//! The capture/stream session.
//!
//! [`InspectorSession`] owns one camera stream, one detector socket and one
//! render surface.  While streaming it runs two Tokio tasks:
//!
//! 1. **Capture loop** – every `1 / frame_rate` seconds snapshots the camera,
//!    encodes the frame as a JPEG data URL, and sends it on the socket.  The
//!    timer is re-armed after each iteration, so the cadence drifts under load
//!    instead of bursting.
//! 2. **Event pump** – consumes socket events.  Each inbound payload goes to
//!    the frame-received callback and is then decoded on the blocking pool and
//!    painted onto the render surface.  Decodes race; the last one to finish
//!    wins.
//!
//! # Locking
//!
//! Session state sits behind a `std::sync::Mutex` that is never held across
//! an `.await`.  Callbacks are cloned out of their own lock before being
//! invoked, so an observer may call back into the session.
//!
//! # State machine
//!
//! ```text
//! Idle ──start()──> Starting ──socket open──> Streaming
//!  ^                   │                          │
//!  └──── failure ──────┘        stop() / close ───┘──> Stopping ──> Idle
//!
//! any state ──destroy()──> Destroyed (terminal)
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use image::RgbImage;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use vision_core::frame::JPEG_QUALITY;
use vision_core::{
    decode_data_url, encode_jpeg, encode_jpeg_data_url, resolve_socket_url, CameraDevice,
    ConfigPatch, InspectorError, SessionConfig, SessionState, StatusKind, StatusMessage,
};

use crate::application::callbacks::SessionCallbacks;
use crate::application::ports::{
    CameraProvider, CameraStream, FrameTransport, SocketConnection, SocketEvent,
};
use crate::application::surface::{
    RenderSurface, SurfaceHandle, DEFAULT_SURFACE_HEIGHT, DEFAULT_SURFACE_WIDTH,
};

const STATUS_STARTING: &str = "📡 Starting camera...";
const STATUS_CONNECTED: &str = "✅ Connected - Detection active";
const STATUS_SOCKET_ERROR: &str = "❌ WebSocket connection failed";
const STATUS_CLOSED: &str = "🔌 Connection closed";

// ── Public API ────────────────────────────────────────────────────────────────

/// A live capture/stream session.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use vision_core::SessionConfig;
/// use vision_inspector::application::{InspectorSession, SessionCallbacks};
/// use vision_inspector::infrastructure::camera::SyntheticCameraProvider;
/// use vision_inspector::infrastructure::ws_transport::TungsteniteTransport;
///
/// # async fn run() -> Result<(), vision_core::InspectorError> {
/// let session = InspectorSession::new(
///     SessionConfig::default(),
///     SessionCallbacks::new().with_status(|s| println!("{s:?}")),
///     Arc::new(SyntheticCameraProvider::new()),
///     Arc::new(TungsteniteTransport::new()),
/// )?;
/// session.start().await?;
/// // ... later
/// session.destroy();
/// # Ok(())
/// # }
/// ```
pub struct InspectorSession {
    shared: Arc<Shared>,
}

impl InspectorSession {
    /// Creates an idle session.
    ///
    /// # Errors
    ///
    /// - [`InspectorError::InvalidConfiguration`] if `config` does not validate.
    /// - [`InspectorError::SurfaceUnavailable`] if the render surface cannot be
    ///   allocated.
    pub fn new(
        config: SessionConfig,
        callbacks: SessionCallbacks,
        camera_provider: Arc<dyn CameraProvider>,
        transport: Arc<dyn FrameTransport>,
    ) -> Result<Self, InspectorError> {
        config.validate()?;
        let surface = RenderSurface::new(DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT)?;

        Ok(Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: SessionState::Idle,
                    config,
                    epoch: 0,
                    camera: None,
                    outbound: None,
                    capture_task: None,
                    event_task: None,
                    capture_failing: false,
                }),
                callbacks: Mutex::new(callbacks),
                surface,
                camera_provider,
                transport,
            }),
        })
    }

    /// Acquires the camera, connects to the detector and starts streaming.
    ///
    /// Resolves once the socket reports open, so on `Ok` the session is
    /// [`SessionState::Streaming`].
    ///
    /// # Errors
    ///
    /// - [`InspectorError::InvalidSessionState`] unless the session is idle, or
    ///   if `stop`/`destroy` interrupted the start.
    /// - [`InspectorError::CameraPermission`], [`InspectorError::CameraNotFound`]
    ///   or [`InspectorError::CameraInitialization`] if the camera cannot be
    ///   acquired.
    /// - [`InspectorError::WebSocketConnection`] if the socket cannot be opened
    ///   or closes before opening.
    ///
    /// Acquisition and connection failures are also reported to the status
    /// observer, and the session is stopped before the error is returned.
    pub async fn start(&self) -> Result<(), InspectorError> {
        let (config, epoch) = self.shared.begin_start()?;
        self.shared.emit_status(Some(StatusMessage::info(STATUS_STARTING)));

        match self.shared.run_start(config, epoch).await {
            Ok(()) => Ok(()),
            Err(StartFailure::Interrupted(err)) => {
                debug!("start interrupted: {err}");
                Err(err)
            }
            Err(StartFailure::Failed(err)) => {
                error!("failed to start inspector: {err}");
                self.shared
                    .emit_status(Some(StatusMessage::error(err.status_text())));
                self.shared.stop();
                Err(err)
            }
        }
    }

    /// Tears the session down to [`SessionState::Idle`].
    ///
    /// Synchronous and idempotent.  In order: flips to not-streaming and
    /// notifies, cancels the capture loop, closes the socket, stops every
    /// camera track, and finally clears the status observer.
    pub fn stop(&self) {
        self.shared.stop();
    }

    /// Stops the session and releases the render surface.  Terminal.
    pub fn destroy(&self) {
        self.shared.stop();
        self.shared.lock_inner().state = SessionState::Destroyed;
        self.shared.surface.release();
        info!("inspector session destroyed");
    }

    /// Shallow-merges `patch` into the configuration.
    ///
    /// The capture loop and socket use the configuration snapshotted at
    /// `start`, so changes take effect at the next `start`.
    ///
    /// # Errors
    ///
    /// [`InspectorError::InvalidConfiguration`] if the merged configuration is
    /// invalid (the current one is kept), or
    /// [`InspectorError::InvalidSessionState`] after `destroy`.
    pub fn update_config(&self, patch: ConfigPatch) -> Result<(), InspectorError> {
        let mut inner = self.shared.lock_inner();
        if inner.state == SessionState::Destroyed {
            return Err(InspectorError::invalid_state(
                "cannot update the configuration of a destroyed session",
                inner.state,
            ));
        }
        inner.config = inner.config.apply(patch)?;
        if inner.state != SessionState::Idle {
            info!(
                state = %inner.state,
                "configuration updated; restart the session to apply it"
            );
        }
        Ok(())
    }

    /// Replaces the callbacks present in `patch`; the others are kept.
    pub fn update_callbacks(&self, patch: SessionCallbacks) {
        self.shared.lock_callbacks().merge(patch);
    }

    /// Pins the camera to `device_id`, keeping facing mode and resolution.
    pub fn select_camera(&self, device_id: &str) -> Result<(), InspectorError> {
        let constraints = self
            .shared
            .lock_inner()
            .config
            .video_constraints
            .with_device(device_id);
        self.update_config(ConfigPatch {
            video_constraints: Some(constraints),
            ..ConfigPatch::default()
        })
    }

    /// Enumerates the available video inputs.
    pub async fn list_cameras(&self) -> Result<Vec<CameraDevice>, InspectorError> {
        Ok(self.shared.camera_provider.list_devices().await?)
    }

    /// Encodes the current camera frame as JPEG bytes.
    ///
    /// # Errors
    ///
    /// [`InspectorError::InvalidSessionState`] when no camera is bound,
    /// [`InspectorError::FrameCapture`] when the camera has no frame or the
    /// encode fails.
    pub fn capture_snapshot(&self) -> Result<Vec<u8>, InspectorError> {
        let frame = {
            let mut inner = self.shared.lock_inner();
            let state = inner.state;
            let camera = inner
                .camera
                .as_mut()
                .ok_or_else(|| InspectorError::invalid_state("no camera is bound", state))?;
            camera
                .grab_frame()
                .map_err(|e| InspectorError::FrameCapture(e.to_string()))?
        };
        encode_jpeg(&frame, JPEG_QUALITY).map_err(|e| InspectorError::FrameCapture(e.to_string()))
    }

    pub fn state(&self) -> SessionState {
        self.shared.lock_inner().state
    }

    pub fn is_streaming(&self) -> bool {
        self.state() == SessionState::Streaming
    }

    /// Current (not the running) configuration.
    pub fn config(&self) -> SessionConfig {
        self.shared.lock_inner().config.clone()
    }

    /// Read-only view of the render surface for the UI.
    pub fn surface(&self) -> SurfaceHandle {
        self.shared.surface.handle()
    }
}

impl Drop for InspectorSession {
    fn drop(&mut self) {
        // The background tasks hold their own Arc<Shared>; without this they
        // would outlive the session.
        if matches!(
            self.state(),
            SessionState::Starting | SessionState::Streaming
        ) {
            self.shared.stop();
        }
    }
}

// ── Internals ─────────────────────────────────────────────────────────────────

struct Shared {
    inner: Mutex<Inner>,
    callbacks: Mutex<SessionCallbacks>,
    surface: RenderSurface,
    camera_provider: Arc<dyn CameraProvider>,
    transport: Arc<dyn FrameTransport>,
}

struct Inner {
    state: SessionState,
    config: SessionConfig,
    /// Incremented by every `start`; lets an in-flight start notice that a
    /// `stop` (and possibly a newer `start`) happened while it was suspended.
    epoch: u64,
    camera: Option<Box<dyn CameraStream>>,
    outbound: Option<mpsc::Sender<String>>,
    capture_task: Option<JoinHandle<()>>,
    event_task: Option<JoinHandle<()>>,
    /// Set after a failed grab/encode; cleared by the next good frame.
    capture_failing: bool,
}

enum StartFailure {
    /// `stop` or `destroy` ran while `start` was suspended.
    Interrupted(InspectorError),
    Failed(InspectorError),
}

/// Outcome of one capture-loop tick.
enum Tick {
    Exit,
    Skip,
    Send(mpsc::Sender<String>, RgbImage),
}

impl Shared {
    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_callbacks(&self) -> MutexGuard<'_, SessionCallbacks> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit_status(&self, status: Option<StatusMessage>) {
        match &status {
            Some(s) if s.kind == StatusKind::Error => warn!(status = %s.message, "status"),
            Some(s) => info!(status = %s.message, "status"),
            None => debug!("status cleared"),
        }
        let callback = self.lock_callbacks().on_status_change.clone();
        if let Some(cb) = callback {
            cb(status.as_ref());
        }
    }

    fn emit_streaming(&self, streaming: bool) {
        let callback = self.lock_callbacks().on_streaming_change.clone();
        if let Some(cb) = callback {
            cb(streaming);
        }
    }

    fn emit_frame(&self, payload: &str) {
        let callback = self.lock_callbacks().on_frame_received.clone();
        if let Some(cb) = callback {
            cb(payload);
        }
    }

    /// Idle → Starting.  Returns the configuration snapshot and start epoch.
    fn begin_start(&self) -> Result<(SessionConfig, u64), InspectorError> {
        let mut inner = self.lock_inner();
        if inner.state != SessionState::Idle {
            return Err(InspectorError::invalid_state(
                "start() requires an idle session",
                inner.state,
            ));
        }
        inner.state = SessionState::Starting;
        inner.epoch = inner.epoch.wrapping_add(1);
        inner.capture_failing = false;
        Ok((inner.config.clone(), inner.epoch))
    }

    /// Guard for the resume points of `run_start`.
    fn still_starting(inner: &Inner, epoch: u64) -> Result<(), StartFailure> {
        if inner.epoch == epoch && inner.state == SessionState::Starting {
            Ok(())
        } else {
            Err(StartFailure::Interrupted(InspectorError::invalid_state(
                "start was interrupted by stop",
                inner.state,
            )))
        }
    }

    async fn run_start(
        self: &Arc<Self>,
        config: SessionConfig,
        epoch: u64,
    ) -> Result<(), StartFailure> {
        // 1. Camera.
        let mut camera = self
            .camera_provider
            .open(&config.video_constraints)
            .await
            .map_err(|e| StartFailure::Failed(e.into()))?;

        // 2. Bind it.  The surface follows the camera's native size.
        {
            let mut inner = self.lock_inner();
            if let Err(interrupted) = Self::still_starting(&inner, epoch) {
                drop(inner);
                camera.stop_tracks();
                return Err(interrupted);
            }
            if let Some((w, h)) = camera.dimensions() {
                if let Err(e) = self.surface.resize(w, h) {
                    drop(inner);
                    camera.stop_tracks();
                    return Err(StartFailure::Failed(e));
                }
            }
            inner.camera = Some(camera);
        }
        debug!("camera bound");

        // 3. Socket.
        let url = resolve_socket_url(&config);
        info!(%url, "connecting to detector");
        let SocketConnection {
            outbound,
            mut events,
        } = self.transport.connect(&url).await.map_err(|e| {
            warn!("socket connect failed: {e}");
            StartFailure::Failed(InspectorError::websocket_connection(&url))
        })?;

        loop {
            match events.recv().await {
                Some(SocketEvent::Open) => break,
                Some(SocketEvent::Error(reason)) => {
                    warn!(%url, %reason, "socket error before open");
                }
                Some(SocketEvent::Message(_)) => {
                    debug!("dropping payload received before open");
                }
                Some(SocketEvent::Closed) | None => {
                    return Err(StartFailure::Failed(InspectorError::websocket_connection(
                        &url,
                    )));
                }
            }
        }

        // 4. Open: Streaming.
        {
            let mut inner = self.lock_inner();
            Self::still_starting(&inner, epoch)?;
            inner.state = SessionState::Streaming;
            inner.outbound = Some(outbound);
        }
        info!(%url, "detector connected");
        self.emit_status(Some(StatusMessage::success(STATUS_CONNECTED)));
        self.emit_streaming(true);

        let mut inner = self.lock_inner();
        if inner.epoch != epoch || inner.state != SessionState::Streaming {
            // Stopped from an observer callback; nothing left to run.
            return Ok(());
        }
        let interval = config.frame_interval();
        inner.capture_task = Some(tokio::spawn(capture_loop(Arc::clone(self), interval)));
        inner.event_task = Some(tokio::spawn(pump_events(Arc::clone(self), events, epoch)));
        Ok(())
    }

    fn stop(&self) {
        // (a) not streaming any more.
        {
            let mut inner = self.lock_inner();
            if inner.state != SessionState::Destroyed {
                inner.state = SessionState::Stopping;
            }
        }
        self.emit_streaming(false);

        // (b) cancel the tasks, (c) close the socket, (d) take the camera.
        let camera = {
            let mut inner = self.lock_inner();
            if let Some(task) = inner.capture_task.take() {
                task.abort();
            }
            if let Some(task) = inner.event_task.take() {
                task.abort();
            }
            // Dropping the last sender closes the socket.
            inner.outbound = None;
            inner.camera.take()
        };

        // (d) + (e) stop every track and detach.
        if let Some(mut camera) = camera {
            camera.stop_tracks();
            debug!("camera tracks stopped");
        }

        {
            let mut inner = self.lock_inner();
            if inner.state != SessionState::Destroyed {
                inner.state = SessionState::Idle;
            }
        }
        self.surface.invalidate();

        // (f) clear the status.
        self.emit_status(None);
    }

    fn capture_tick(&self) -> Tick {
        let mut inner = self.lock_inner();
        if inner.state != SessionState::Streaming {
            return Tick::Exit;
        }
        let outbound = match &inner.outbound {
            Some(tx) if !tx.is_closed() => tx.clone(),
            _ => return Tick::Exit,
        };
        let Some(camera) = inner.camera.as_mut() else {
            return Tick::Exit;
        };
        let Some((width, height)) = camera.dimensions() else {
            return Tick::Skip;
        };
        match camera.grab_frame() {
            Ok(frame) => {
                inner.capture_failing = false;
                drop(inner);
                if let Err(e) = self.surface.resize(width, height) {
                    debug!("surface not resized: {e}");
                }
                Tick::Send(outbound, frame)
            }
            Err(e) => {
                drop(inner);
                self.note_capture_failure(InspectorError::FrameCapture(e.to_string()));
                Tick::Skip
            }
        }
    }

    /// Logs every failure; reports only the first of a streak to the observer.
    fn note_capture_failure(&self, err: InspectorError) {
        warn!("frame capture failed: {err}");
        let first = {
            let mut inner = self.lock_inner();
            !std::mem::replace(&mut inner.capture_failing, true)
        };
        if first {
            self.emit_status(Some(StatusMessage::error(err.status_text())));
        }
    }
}

// ── Tasks ─────────────────────────────────────────────────────────────────────

async fn capture_loop(shared: Arc<Shared>, interval: Duration) {
    debug!(?interval, "capture loop started");
    loop {
        match shared.capture_tick() {
            Tick::Exit => break,
            Tick::Skip => {}
            Tick::Send(outbound, frame) => {
                match tokio::task::spawn_blocking(move || encode_jpeg_data_url(&frame)).await {
                    Ok(Ok(payload)) => {
                        if outbound.send(payload).await.is_err() {
                            debug!("socket closed under the capture loop");
                            break;
                        }
                    }
                    Ok(Err(e)) => {
                        shared.note_capture_failure(InspectorError::FrameCapture(e.to_string()))
                    }
                    Err(e) => {
                        warn!("frame encode task failed: {e}");
                        break;
                    }
                }
            }
        }
        tokio::time::sleep(interval).await;
    }
    debug!("capture loop finished");
}

/// Consumes the events of the socket opened by the start with `epoch`.
async fn pump_events(shared: Arc<Shared>, mut events: mpsc::Receiver<SocketEvent>, epoch: u64) {
    while let Some(event) = events.recv().await {
        match event {
            SocketEvent::Message(payload) => {
                shared.emit_frame(&payload);
                let generation = shared.surface.generation();
                let surface = shared.surface.clone();
                tokio::task::spawn_blocking(move || render_reply(&surface, generation, &payload));
            }
            SocketEvent::Error(reason) => {
                warn!(%reason, "socket error");
                shared.emit_status(Some(StatusMessage::error(STATUS_SOCKET_ERROR)));
            }
            SocketEvent::Open => debug!("ignoring repeated open event"),
            SocketEvent::Closed => break,
        }
    }

    if shared.lock_inner().epoch != epoch {
        debug!("socket of a previous stream closed");
        return;
    }
    info!("detector socket closed");
    shared.emit_status(Some(StatusMessage::info(STATUS_CLOSED)));
    let streaming = {
        let inner = shared.lock_inner();
        inner.epoch == epoch && inner.state == SessionState::Streaming
    };
    if streaming {
        shared.stop();
    }
}

/// Decodes a detector reply and paints it, unless the surface moved on.
fn render_reply(surface: &RenderSurface, generation: u64, payload: &str) {
    match decode_data_url(payload) {
        Ok(image) => {
            if !surface.paint(generation, &image) {
                debug!("discarding stale detector frame");
            }
        }
        Err(e) => debug!("ignoring undecodable detector payload: {e}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
