//! Tagged error type for every inspector failure.
//!
//! All failures share one enum, [`InspectorError`].  Callers that need to
//! branch on the failure class match on [`InspectorError::kind`], which
//! returns a plain [`ErrorKind`] discriminant.
//!
//! # User-facing text
//!
//! [`InspectorError::status_text`] renders the short, glyph-prefixed message
//! shown to the user.  Permission and not-found failures are reported
//! verbatim; generic camera and connection failures get a category prefix so
//! the user can tell what failed.

use thiserror::Error;

use crate::domain::state::SessionState;

/// Boxed underlying cause carried by [`InspectorError::CameraInitialization`].
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Discriminant of an [`InspectorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CameraInitialization,
    CameraPermission,
    CameraNotFound,
    SurfaceUnavailable,
    WebSocketConnection,
    WebSocketDisconnected,
    FrameCapture,
    InvalidSessionState,
    InvalidConfiguration,
}

/// Every failure the inspector can report.
#[derive(Debug, Error)]
pub enum InspectorError {
    /// The camera could not be acquired for a reason other than permission
    /// or a missing device.
    #[error("{message}")]
    CameraInitialization {
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },

    /// The user or platform refused camera access.
    #[error("{0}")]
    CameraPermission(String),

    /// No capture device matched the requested constraints.
    #[error("{0}")]
    CameraNotFound(String),

    /// The render surface could not be allocated.
    #[error("{0}")]
    SurfaceUnavailable(String),

    /// The socket could not be opened.  Carries the URL that was attempted.
    #[error("{message}")]
    WebSocketConnection { message: String, url: String },

    /// An established socket went away.
    #[error("{0}")]
    WebSocketDisconnected(String),

    /// A camera frame could not be snapshotted or encoded.
    #[error("{0}")]
    FrameCapture(String),

    /// The operation is not allowed in the session's current state.
    #[error("{message} (state: {current})")]
    InvalidSessionState {
        message: String,
        current: SessionState,
    },

    /// A configuration value was rejected.
    #[error("{message}")]
    InvalidConfiguration {
        message: String,
        key: Option<String>,
    },
}

impl InspectorError {
    pub fn camera_permission() -> Self {
        InspectorError::CameraPermission(
            "Camera access was denied. Please allow camera permissions.".to_string(),
        )
    }

    pub fn camera_not_found() -> Self {
        InspectorError::CameraNotFound("No camera device was found on this device.".to_string())
    }

    /// Wraps an arbitrary acquisition failure.
    pub fn camera_initialization<E>(cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        InspectorError::CameraInitialization {
            message: format!("Failed to initialize camera: {cause}"),
            source: Some(Box::new(cause)),
        }
    }

    pub fn websocket_connection(url: impl Into<String>) -> Self {
        let url = url.into();
        InspectorError::WebSocketConnection {
            message: format!("Failed to create WebSocket connection to {url}"),
            url,
        }
    }

    pub fn invalid_state(message: impl Into<String>, current: SessionState) -> Self {
        InspectorError::InvalidSessionState {
            message: message.into(),
            current,
        }
    }

    pub fn invalid_config(message: impl Into<String>, key: &str) -> Self {
        InspectorError::InvalidConfiguration {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Returns the discriminant of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InspectorError::CameraInitialization { .. } => ErrorKind::CameraInitialization,
            InspectorError::CameraPermission(_) => ErrorKind::CameraPermission,
            InspectorError::CameraNotFound(_) => ErrorKind::CameraNotFound,
            InspectorError::SurfaceUnavailable(_) => ErrorKind::SurfaceUnavailable,
            InspectorError::WebSocketConnection { .. } => ErrorKind::WebSocketConnection,
            InspectorError::WebSocketDisconnected(_) => ErrorKind::WebSocketDisconnected,
            InspectorError::FrameCapture(_) => ErrorKind::FrameCapture,
            InspectorError::InvalidSessionState { .. } => ErrorKind::InvalidSessionState,
            InspectorError::InvalidConfiguration { .. } => ErrorKind::InvalidConfiguration,
        }
    }

    /// Human-readable status line for the observer.
    pub fn status_text(&self) -> String {
        match self.kind() {
            ErrorKind::CameraPermission | ErrorKind::CameraNotFound => format!("❌ {self}"),
            ErrorKind::CameraInitialization => format!("❌ Camera error: {self}"),
            ErrorKind::WebSocketConnection => format!("❌ Connection failed: {self}"),
            _ => format!("❌ Error: {self}"),
        }
    }
}
