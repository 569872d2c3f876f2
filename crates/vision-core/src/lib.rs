//! # vision-core
//!
//! Shared library for the live vision inspector containing the session
//! configuration, status and state types, the error taxonomy, and the JPEG
//! data-URL frame codec.
//!
//! This crate has zero dependencies on cameras, sockets, or async runtimes.
//!
//! # Architecture overview
//!
//! The inspector turns a local camera into a live, remotely processed video
//! feed: frames are sampled on a fixed cadence, encoded as JPEG data URLs,
//! pushed to a detector over a WebSocket, and whatever images the detector
//! sends back are painted onto a render surface.
//!
//! - **`domain`** – Pure value types: [`SessionConfig`], [`StatusMessage`],
//!   [`SessionState`], [`InspectorError`], socket URL resolution, and camera
//!   device selection.
//!
//! - **`frame`** – How pixels travel over the socket.  Outbound frames are
//!   JPEG-encoded and wrapped as `data:image/jpeg;base64,...` strings; inbound
//!   payloads of the same shape are decoded back into RGBA images.

pub mod domain;
pub mod frame;

// Re-export the most-used types at the crate root so callers can write
// `vision_core::SessionConfig` instead of the full module path.
pub use domain::config::{ConfigPatch, FacingMode, PageOrigin, SessionConfig, VideoConstraints};
pub use domain::devices::{CameraDevice, CameraSelector};
pub use domain::endpoint::resolve_socket_url;
pub use domain::error::{ErrorKind, InspectorError};
pub use domain::state::SessionState;
pub use domain::status::{StatusKind, StatusMessage};
pub use frame::codec::{decode_data_url, encode_jpeg, encode_jpeg_data_url, FrameCodecError};
