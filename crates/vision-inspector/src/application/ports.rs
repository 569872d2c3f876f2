//! Ports: the traits the session uses to reach a camera and a detector.
//!
//! Implementations live in the infrastructure layer and are injected at
//! construction time, so the session can be driven entirely by in-memory
//! fakes in tests.

use async_trait::async_trait;
use image::RgbImage;
use thiserror::Error;
use tokio::sync::mpsc;

use vision_core::{CameraDevice, InspectorError, VideoConstraints};

// ── Camera ────────────────────────────────────────────────────────────────────

/// Errors reported by a camera provider or stream.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CameraError {
    /// The user or platform refused access.
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    /// No device satisfies the constraints.
    #[error("no camera matches the requested constraints")]
    NotFound,

    /// The stream has not produced a frame yet, or its tracks were stopped.
    #[error("camera has no frame available")]
    NoFrame,

    /// Any other device or driver failure.
    #[error("camera device error: {0}")]
    Device(String),
}

impl From<CameraError> for InspectorError {
    /// Classifies an acquisition failure: permission and not-found get their
    /// own kinds, everything else is a generic initialization failure.
    fn from(err: CameraError) -> Self {
        match err {
            CameraError::PermissionDenied(_) => InspectorError::camera_permission(),
            CameraError::NotFound => InspectorError::camera_not_found(),
            other => InspectorError::camera_initialization(other),
        }
    }
}

/// Acquires camera streams.
#[async_trait]
pub trait CameraProvider: Send + Sync {
    /// Opens a stream satisfying `constraints`.
    ///
    /// May suspend for as long as a permission prompt is shown.
    async fn open(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError>;

    /// Lists the available video inputs.
    async fn list_devices(&self) -> Result<Vec<CameraDevice>, CameraError>;
}

/// A live camera stream bound for playback.
pub trait CameraStream: Send {
    /// Native frame size, or `None` until the first frame is decoded.
    fn dimensions(&self) -> Option<(u32, u32)>;

    /// Snapshots the current frame at native resolution.
    fn grab_frame(&mut self) -> Result<RgbImage, CameraError>;

    /// Stops every track.  Further grabs fail with [`CameraError::NoFrame`].
    fn stop_tracks(&mut self);
}

// ── Transport ─────────────────────────────────────────────────────────────────

/// Something that happened on the detector socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// The socket is open and accepts frames.
    Open,
    /// A text payload from the detector.
    Message(String),
    /// A transport-level error.  Does not by itself mean the socket is gone.
    Error(String),
    /// The socket is closed; no more events follow.
    Closed,
}

/// An open (or opening) duplex socket.
///
/// Dropping `outbound` closes the socket.
#[derive(Debug)]
pub struct SocketConnection {
    /// Frames to send, in order.
    pub outbound: mpsc::Sender<String>,
    /// Socket events in arrival order.
    pub events: mpsc::Receiver<SocketEvent>,
}

/// Errors raised while creating a socket.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid socket URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },
}

/// Opens detector sockets.
#[async_trait]
pub trait FrameTransport: Send + Sync {
    async fn connect(&self, url: &str) -> Result<SocketConnection, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use vision_core::ErrorKind;

    #[test]
    fn test_permission_denied_classifies_as_permission() {
        let err: InspectorError = CameraError::PermissionDenied("NotAllowedError".into()).into();
        assert_eq!(err.kind(), ErrorKind::CameraPermission);
    }

    #[test]
    fn test_not_found_classifies_as_not_found() {
        let err: InspectorError = CameraError::NotFound.into();
        assert_eq!(err.kind(), ErrorKind::CameraNotFound);
    }

    #[test]
    fn test_device_error_wraps_cause() {
        let err: InspectorError = CameraError::Device("busy".into()).into();
        assert_eq!(err.kind(), ErrorKind::CameraInitialization);
        assert_eq!(
            err.to_string(),
            "Failed to initialize camera: camera device error: busy"
        );
    }
}
