//! Application layer for vision-inspector.
//!
//! # Responsibilities
//!
//! - The capture/stream session lifecycle (`start`, `stop`, `destroy`)
//! - The capture loop and inbound frame rendering
//! - The ports the session talks through (`CameraProvider`, `FrameTransport`)
//! - The chat history session and its storage port
//!
//! # What does NOT belong here?
//!
//! - Opening real sockets (that is `infrastructure::ws_transport`)
//! - Reading config files or parsing CLI arguments

pub mod callbacks;
pub mod chat_history;
pub mod ports;
pub mod session;
pub mod surface;

pub use callbacks::SessionCallbacks;
pub use chat_history::{ChatHistory, ChatMessage, ChatSender, KeyValueStore, StorageError};
pub use ports::{
    CameraError, CameraProvider, CameraStream, FrameTransport, SocketConnection, SocketEvent,
    TransportError,
};
pub use session::InspectorSession;
pub use surface::{RenderSurface, SurfaceHandle};
